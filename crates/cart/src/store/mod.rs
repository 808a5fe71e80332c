//! Durable key-value storage for the serialized cart.
//!
//! # Stores
//!
//! - [`FileStore`] - One file per key under a directory (atomic replace)
//! - [`MemoryStore`] - In-process map for tests and throwaway sessions
//!
//! # Format
//!
//! The cart is stored as a JSON array of product records in display order,
//! see [`encode_cart`] and [`decode_cart`].

mod file;
mod memory;

use std::future::Future;
use std::sync::Arc;

use rocketshoes_core::{Cart, CartInvariantError};
use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Key the cart blob is stored under unless configured otherwise.
pub const DEFAULT_CART_KEY: &str = "@RocketShoes:cart";

/// Errors that can occur when reading or writing the cart.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying storage I/O failed.
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored bytes are not a valid cart encoding.
    #[error("Cart encoding error: {0}")]
    Codec(#[from] serde_json::Error),

    /// The stored cart breaks the cart invariants.
    #[error("Stored cart is corrupt: {0}")]
    Corrupt(#[from] CartInvariantError),

    /// The key cannot be mapped onto the storage medium.
    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),
}

/// Durable key-value byte store.
///
/// # Thread Safety
///
/// Implementations must be thread-safe (`Send + Sync`).
pub trait PersistentStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// Returns `None` if nothing has been written under this key.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn read(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>, StoreError>> + Send;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails. The previous value
    /// must be left intact in that case.
    fn write(&self, key: &str, value: &[u8]) -> impl Future<Output = Result<(), StoreError>> + Send;
}

impl<T: PersistentStore> PersistentStore for Arc<T> {
    fn read(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>, StoreError>> + Send {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &[u8]) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).write(key, value)
    }
}

/// Serialize a cart for storage.
///
/// # Errors
///
/// Returns `StoreError::Codec` if serialization fails.
pub fn encode_cart(cart: &Cart) -> Result<Vec<u8>, StoreError> {
    Ok(serde_json::to_vec(cart)?)
}

/// Deserialize a stored cart.
///
/// # Errors
///
/// Returns `StoreError::Codec` for malformed JSON and `StoreError::Corrupt`
/// for a well-formed list that breaks the cart invariants.
pub fn decode_cart(bytes: &[u8]) -> Result<Cart, StoreError> {
    let items: Vec<rocketshoes_core::Product> = serde_json::from_slice(bytes)?;
    Ok(Cart::from_items(items)?)
}

/// Load the cart stored under `key`, or an empty cart if there is none.
///
/// # Errors
///
/// Returns `StoreError` if the read fails or the stored value is not a
/// valid cart.
pub async fn load_cart<S: PersistentStore>(store: &S, key: &str) -> Result<Cart, StoreError> {
    match store.read(key).await? {
        Some(bytes) => decode_cart(&bytes),
        None => Ok(Cart::new()),
    }
}
