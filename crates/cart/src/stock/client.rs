//! REST client for the stock and product API.
//!
//! Uses `reqwest` for HTTP and caches product metadata using `moka`.

use std::sync::Arc;

use moka::future::Cache;
use rocketshoes_core::{ProductDetails, ProductId, StockEntry};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::{StockError, StockService};
use crate::config::StockApiConfig;

/// Client for the stock and product API.
///
/// Cheaply cloneable; clones share the HTTP connection pool and the product
/// cache.
#[derive(Clone)]
pub struct HttpStockClient {
    inner: Arc<HttpStockClientInner>,
}

struct HttpStockClientInner {
    client: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
    products: Cache<ProductId, ProductDetails>,
}

impl HttpStockClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns `StockError::Http` if the HTTP client cannot be constructed.
    pub fn new(config: &StockApiConfig) -> Result<Self, StockError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        let products = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.product_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(HttpStockClientInner {
                client,
                base_url: config.base_url.clone(),
                token: config.token.clone(),
                products,
            }),
        })
    }

    /// Drop any cached metadata for `id`.
    pub async fn invalidate_product(&self, id: ProductId) {
        self.inner.products.invalidate(&id).await;
    }

    /// GET `{base}/{collection}/{id}` and decode the JSON body.
    async fn fetch<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: ProductId,
    ) -> Result<T, StockError> {
        let url = self.inner.base_url.join(&format!("{collection}/{id}"))?;

        let mut request = self
            .inner
            .client
            .get(url)
            .header("Accept", "application/json");
        if let Some(token) = &self.inner.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StockError::NotFound(id));
        }

        // Check for rate limiting
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(StockError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Stock API returned non-success status"
            );
            return Err(StockError::Status {
                status: status.as_u16(),
                body: response_text.chars().take(200).collect(),
            });
        }

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse stock API response"
            );
            StockError::Parse(e)
        })
    }
}

impl StockService for HttpStockClient {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_stock(&self, id: ProductId) -> Result<StockEntry, StockError> {
        let entry: StockEntry = self.fetch("stock", id).await?;
        if entry.id != id {
            return Err(StockError::UnexpectedProduct {
                requested: id,
                returned: entry.id,
            });
        }
        debug!(available = entry.amount, "Fetched stock");
        Ok(entry)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_product(&self, id: ProductId) -> Result<ProductDetails, StockError> {
        // Check cache
        if let Some(product) = self.inner.products.get(&id).await {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let product: ProductDetails = self.fetch("products", id).await?;
        if product.id != id {
            return Err(StockError::UnexpectedProduct {
                requested: id,
                returned: product.id,
            });
        }

        // Cache the result
        self.inner.products.insert(id, product.clone()).await;

        Ok(product)
    }
}
