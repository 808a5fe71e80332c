//! RocketShoes cart library.
//!
//! # Architecture
//!
//! - [`manager::CartManager`] owns the cart and applies add/remove/update
//! - [`stock::StockService`] validates quantities against live stock
//! - [`store::PersistentStore`] keeps the serialized cart across sessions
//! - [`notify::Notifier`] surfaces failures to the user
//!
//! The three collaborators are traits so the manager can run against the
//! HTTP API and the file store in production, and against in-memory fakes
//! in tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use rocketshoes_cart::{CartConfig, CartManager, FileStore, HttpStockClient, RecordingNotifier};
//!
//! let config = CartConfig::from_env()?;
//! let stock = HttpStockClient::new(&config.api)?;
//! let store = FileStore::new(&config.store.store_dir);
//! let notices = RecordingNotifier::new();
//! let cart = CartManager::load_with_key(stock, store, notices, config.store.storage_key).await?;
//!
//! cart.add_product(ProductId::new(1)).await;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod locks;
pub mod manager;
pub mod notify;
pub mod stock;
pub mod store;

pub use config::{CartConfig, ConfigError, StockApiConfig, StoreConfig};
pub use error::{CartError, CartOperation};
pub use manager::{CartManager, Outcome};
pub use notify::{Notifier, RecordingNotifier};
pub use stock::{HttpStockClient, StockError, StockService};
pub use store::{FileStore, MemoryStore, PersistentStore, StoreError};
