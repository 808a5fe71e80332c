//! Integration tests for RocketShoes.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rocketshoes-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_scenarios` - Cart manager behaviour against in-memory collaborators
//! - `concurrency` - Interleaved mutations on the same and different products
//! - `http_stock` - `HttpStockClient` against a mock API server
//! - `file_store` - Cart persistence across sessions on disk
//! - `properties` - Invariants over random operation sequences
//!
//! This library holds the fakes those tests share.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rocketshoes_cart::store::{self, DEFAULT_CART_KEY};
use rocketshoes_cart::{
    CartManager, MemoryStore, PersistentStore, RecordingNotifier, StockError, StockService,
    StoreError,
};
use rocketshoes_core::{Cart, Price, Product, ProductDetails, ProductId, StockEntry};
use rust_decimal::Decimal;

/// Catalogue metadata for product `id`.
#[must_use]
pub fn sneaker(id: u64) -> ProductDetails {
    ProductDetails {
        id: ProductId::new(id),
        title: format!("Tênis modelo {id}"),
        price: Price::new(Decimal::new(13990 + i64::try_from(id).unwrap_or(0) * 1000, 2)),
        image: format!("https://rocketseat-cdn.s3-sa-east-1.amazonaws.com/modulo-redux/tenis{id}.jpg"),
        extra: serde_json::Map::new(),
    }
}

/// Cart with the given `(id, amount)` lines in order.
#[must_use]
pub fn cart_of(lines: &[(u64, u32)]) -> Cart {
    let items = lines
        .iter()
        .map(|(id, amount)| Product::new(sneaker(*id), NonZeroU32::new(*amount).unwrap()))
        .collect();
    Cart::from_items(items).unwrap()
}

// =============================================================================
// FakeStock
// =============================================================================

/// In-memory stock service.
///
/// Every lookup yields to the scheduler once before answering, so futures
/// joined in one task interleave at the lookup like real network calls do.
#[derive(Debug, Default)]
pub struct FakeStock {
    levels: Mutex<HashMap<ProductId, u32>>,
    failing: AtomicBool,
    stock_calls: AtomicUsize,
    product_calls: AtomicUsize,
}

impl FakeStock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style `set_stock`.
    #[must_use]
    pub fn with_stock(self, id: u64, amount: u32) -> Self {
        self.set_stock(id, amount);
        self
    }

    /// Register `id` in the catalogue with `amount` available.
    pub fn set_stock(&self, id: u64, amount: u32) {
        self.levels
            .lock()
            .unwrap()
            .insert(ProductId::new(id), amount);
    }

    /// Make every subsequent lookup fail with an HTTP 503.
    pub fn fail_lookups(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    #[must_use]
    pub fn stock_calls(&self) -> usize {
        self.stock_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn product_calls(&self) -> usize {
        self.product_calls.load(Ordering::SeqCst)
    }

    fn level(&self, id: ProductId) -> Result<u32, StockError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StockError::Status {
                status: 503,
                body: "Service Unavailable".to_string(),
            });
        }
        self.levels
            .lock()
            .unwrap()
            .get(&id)
            .copied()
            .ok_or(StockError::NotFound(id))
    }
}

impl StockService for FakeStock {
    async fn get_stock(&self, id: ProductId) -> Result<StockEntry, StockError> {
        self.stock_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        let amount = self.level(id)?;
        Ok(StockEntry { id, amount })
    }

    async fn get_product(&self, id: ProductId) -> Result<ProductDetails, StockError> {
        self.product_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.level(id)?;
        Ok(sneaker(id.as_u64()))
    }
}

// =============================================================================
// FlakyStore
// =============================================================================

/// Memory store whose writes can be made to fail.
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    failing: AtomicBool,
    writes: AtomicUsize,
}

impl FlakyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `cart` under the default key.
    #[must_use]
    pub fn seeded(cart: &Cart) -> Self {
        let store = Self::new();
        store.seed(DEFAULT_CART_KEY, cart);
        store
    }

    /// Write `cart` under `key` without counting it as a manager write.
    pub fn seed(&self, key: &str, cart: &Cart) {
        let bytes = store::encode_cart(cart).unwrap();
        self.inner.insert(key, bytes);
    }

    /// Make subsequent writes fail with an I/O error.
    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of successful writes.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Raw bytes stored under the default key.
    #[must_use]
    pub fn raw(&self) -> Option<Vec<u8>> {
        self.inner.get(DEFAULT_CART_KEY)
    }

    /// Cart stored under the default key.
    #[must_use]
    pub fn stored_cart(&self) -> Option<Cart> {
        self.raw().map(|bytes| store::decode_cart(&bytes).unwrap())
    }
}

impl PersistentStore for FlakyStore {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.read(key).await
    }

    async fn write(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other("disk full")));
        }
        self.inner.write(key, value).await?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// =============================================================================
// Harness
// =============================================================================

/// Manager wired to shared fakes, with handles to inspect them.
pub struct Harness {
    pub manager: CartManager<Arc<FakeStock>, Arc<FlakyStore>, Arc<RecordingNotifier>>,
    pub stock: Arc<FakeStock>,
    pub store: Arc<FlakyStore>,
    pub notices: Arc<RecordingNotifier>,
}

impl Harness {
    /// Load a manager over `stock` and `store`.
    pub async fn load(stock: FakeStock, store: FlakyStore) -> Self {
        let stock = Arc::new(stock);
        let store = Arc::new(store);
        let notices = Arc::new(RecordingNotifier::new());
        let manager = CartManager::load(
            Arc::clone(&stock),
            Arc::clone(&store),
            Arc::clone(&notices),
        )
        .await
        .unwrap();
        Self {
            manager,
            stock,
            store,
            notices,
        }
    }

    /// Amount of `id` in the manager's current cart.
    #[must_use]
    pub fn amount(&self, id: u64) -> Option<u32> {
        self.manager
            .cart()
            .get(ProductId::new(id))
            .map(Product::amount)
    }
}
