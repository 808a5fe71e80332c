//! Stock and product lookup.
//!
//! # Architecture
//!
//! - [`StockService`] is the seam the cart manager validates against
//! - [`HttpStockClient`] talks to the REST API (`/stock/{id}`, `/products/{id}`)
//! - Product metadata is cached via `moka`; stock levels never are
//!
//! # Example
//!
//! ```rust,ignore
//! use rocketshoes_cart::stock::{HttpStockClient, StockService};
//!
//! let client = HttpStockClient::new(&config.api)?;
//! let entry = client.get_stock(ProductId::new(1)).await?;
//! ```

mod client;

use std::future::Future;
use std::sync::Arc;

use rocketshoes_core::{ProductDetails, ProductId, StockEntry};
use thiserror::Error;

pub use client::HttpStockClient;

/// Errors that can occur when looking up stock or products.
#[derive(Debug, Error)]
pub enum StockError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The product is unknown to the service.
    #[error("Not found: product {0}")]
    NotFound(ProductId),

    /// Rate limited by the service.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Non-success status other than 404/429.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The service answered for a different product than requested.
    #[error("Requested product {requested} but service returned {returned}")]
    UnexpectedProduct {
        requested: ProductId,
        returned: ProductId,
    },

    /// The request URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Read-only lookup of stock levels and product metadata.
///
/// # Thread Safety
///
/// Implementations must be thread-safe (`Send + Sync`).
pub trait StockService: Send + Sync {
    /// Current available quantity of `id`.
    ///
    /// # Errors
    ///
    /// Returns `StockError` if the product is unknown or the lookup fails.
    fn get_stock(&self, id: ProductId) -> impl Future<Output = Result<StockEntry, StockError>> + Send;

    /// Catalogue metadata of `id`.
    ///
    /// # Errors
    ///
    /// Returns `StockError` if the product is unknown or the lookup fails.
    fn get_product(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<ProductDetails, StockError>> + Send;
}

impl<T: StockService> StockService for Arc<T> {
    fn get_stock(&self, id: ProductId) -> impl Future<Output = Result<StockEntry, StockError>> + Send {
        (**self).get_stock(id)
    }

    fn get_product(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<ProductDetails, StockError>> + Send {
        (**self).get_product(id)
    }
}
