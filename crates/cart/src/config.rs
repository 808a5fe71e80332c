//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CART_API_URL` - Base URL of the stock and product API
//!
//! ## Optional
//! - `CART_API_TOKEN` - Bearer token sent to the API
//! - `CART_STORE_DIR` - Directory holding the persisted cart (default: .rocketshoes)
//! - `CART_STORAGE_KEY` - Key the cart is stored under (default: @RocketShoes:cart)
//! - `CART_HTTP_TIMEOUT_SECS` - API request timeout (default: 10)
//! - `CART_PRODUCT_CACHE_TTL_SECS` - Product metadata cache TTL (default: 300)

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::store::DEFAULT_CART_KEY;

const DEFAULT_STORE_DIR: &str = ".rocketshoes";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PRODUCT_CACHE_TTL_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart application configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Stock and product API configuration
    pub api: StockApiConfig,
    /// Where the cart is persisted
    pub store: StoreConfig,
}

/// Cart persistence configuration.
///
/// Loadable on its own so the stored cart can be read without the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory holding the persisted cart
    pub store_dir: PathBuf,
    /// Key the cart is stored under
    pub storage_key: String,
}

/// Stock and product API configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct StockApiConfig {
    /// Base URL, e.g. `http://localhost:3333/`
    pub base_url: Url,
    /// Bearer token, if the API requires one
    pub token: Option<SecretString>,
    /// Per-request timeout
    pub timeout: Duration,
    /// How long product metadata stays cached
    pub product_cache_ttl: Duration,
}

impl std::fmt::Debug for StockApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StockApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .field("product_cache_ttl", &self.product_cache_ttl)
            .finish()
    }
}

impl StockApiConfig {
    /// Configuration for `base_url` with default timeout and cache TTL.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            token: None,
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            product_cache_ttl: Duration::from_secs(DEFAULT_PRODUCT_CACHE_TTL_SECS),
        }
    }

    fn from_source(get: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_url = get_required(get, "CART_API_URL")?;
        let base_url = parse_base_url(&raw_url)
            .map_err(|e| ConfigError::InvalidEnvVar("CART_API_URL".to_string(), e))?;

        Ok(Self {
            base_url,
            token: get("CART_API_TOKEN")
                .filter(|token| !token.is_empty())
                .map(SecretString::from),
            timeout: Duration::from_secs(get_secs(
                get,
                "CART_HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?),
            product_cache_ttl: Duration::from_secs(get_secs(
                get,
                "CART_PRODUCT_CACHE_TTL_SECS",
                DEFAULT_PRODUCT_CACHE_TTL_SECS,
            )?),
        })
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_source(&|key| std::env::var(key).ok())
    }

    fn from_source(get: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            api: StockApiConfig::from_source(get)?,
            store: StoreConfig::from_source(get)?,
        })
    }
}

impl StoreConfig {
    /// Load only the persistence settings from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `CART_STORAGE_KEY` is set but blank.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        Self::from_source(&|key| std::env::var(key).ok())
    }

    fn from_source(get: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let storage_key =
            get("CART_STORAGE_KEY").unwrap_or_else(|| DEFAULT_CART_KEY.to_string());
        if storage_key.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "CART_STORAGE_KEY".to_string(),
                "must not be empty".to_string(),
            ));
        }

        Ok(Self {
            store_dir: get("CART_STORE_DIR")
                .map_or_else(|| PathBuf::from(DEFAULT_STORE_DIR), PathBuf::from),
            storage_key,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn get_required(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String, ConfigError> {
    get(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

fn get_secs(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    get(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Parse the API base URL, forcing a trailing slash so relative joins keep
/// any path prefix (`http://host/api` + `stock/1` -> `http://host/api/stock/1`).
fn parse_base_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if url.cannot_be_a_base() {
        return Err("must be an absolute http(s) URL".to_string());
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
