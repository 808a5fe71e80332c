//! The cart manager.
//!
//! Owns the current cart snapshot and applies the three mutations:
//!
//! 1. Take the product's lock, so mutations of one product run one at a time
//! 2. Validate against live stock
//! 3. Commit: derive the new snapshot from the latest committed one, persist
//!    it, and only then swap it in
//!
//! A failure at any step is reported through the [`Notifier`] and leaves both
//! the in-memory and the persisted cart at their previous value. Nothing is
//! returned to the caller as an error; the returned [`Outcome`] only says
//! what happened.

use std::num::NonZeroU32;
use std::sync::{Arc, PoisonError, RwLock};

use rocketshoes_core::{Cart, Product, ProductId};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{CartError, CartOperation};
use crate::locks::KeyedLocks;
use crate::notify::Notifier;
use crate::stock::StockService;
use crate::store::{self, DEFAULT_CART_KEY, PersistentStore, StoreError};

/// Result of a cart mutation.
#[derive(Debug)]
pub enum Outcome {
    /// The new cart was persisted and is now current.
    Committed,
    /// The request was invalid input and silently dropped.
    Ignored,
    /// The mutation was not applied; the user has been notified.
    Failed(CartError),
}

impl Outcome {
    /// Whether the change was persisted and is now current.
    #[must_use]
    pub const fn is_committed(&self) -> bool {
        matches!(self, Self::Committed)
    }

    /// The error behind a failed mutation, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&CartError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Single owner of the cart.
///
/// Create one per session with [`CartManager::load`] and hand out references
/// to whatever drives the UI. Reads go through [`CartManager::cart`]; writes
/// only through `add_product`, `remove_product` and `update_product_amount`.
pub struct CartManager<S, P, N> {
    stock: S,
    store: P,
    notifier: N,
    storage_key: String,
    current: RwLock<Arc<Cart>>,
    commit_lock: AsyncMutex<()>,
    product_locks: KeyedLocks<ProductId>,
}

impl<S, P, N> std::fmt::Debug for CartManager<S, P, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartManager")
            .field("storage_key", &self.storage_key)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl<S, P, N> CartManager<S, P, N>
where
    S: StockService,
    P: PersistentStore,
    N: Notifier,
{
    /// Load the cart stored under the default key, or start empty.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store cannot be read or holds a value that
    /// is not a valid cart.
    pub async fn load(stock: S, store: P, notifier: N) -> Result<Self, StoreError> {
        Self::load_with_key(stock, store, notifier, DEFAULT_CART_KEY).await
    }

    /// Load the cart stored under `storage_key`, or start empty.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store cannot be read or holds a value that
    /// is not a valid cart.
    #[instrument(skip(stock, store, notifier, storage_key), fields(key = tracing::field::Empty))]
    pub async fn load_with_key(
        stock: S,
        store: P,
        notifier: N,
        storage_key: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let storage_key = storage_key.into();
        tracing::Span::current().record("key", storage_key.as_str());

        let cart = store::load_cart(&store, &storage_key).await?;
        info!(products = cart.len(), "Cart loaded");

        Ok(Self {
            stock,
            store,
            notifier,
            storage_key,
            current: RwLock::new(Arc::new(cart)),
            commit_lock: AsyncMutex::new(()),
            product_locks: KeyedLocks::new(),
        })
    }

    /// The current cart snapshot.
    #[must_use]
    pub fn cart(&self) -> Arc<Cart> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// The notifier failures are reported through.
    #[must_use]
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Key the cart is persisted under.
    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Add one unit of `id`.
    ///
    /// A product already in the cart is incremented if stock allows. A new
    /// product is appended with amount 1 after fetching its metadata; the
    /// first unit is not checked against stock.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn add_product(&self, id: ProductId) -> Outcome {
        let result = self.try_add(id).await;
        self.settle(CartOperation::Add, id, result)
    }

    /// Remove `id` entirely, whatever its amount.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn remove_product(&self, id: ProductId) -> Outcome {
        let result = self.try_remove(id).await;
        self.settle(CartOperation::Remove, id, result)
    }

    /// Set the amount of `id` to exactly `amount`.
    ///
    /// Non-positive amounts are ignored without notice.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn update_product_amount(&self, id: ProductId, amount: i64) -> Outcome {
        let Ok(requested) = u64::try_from(amount) else {
            debug!("Ignoring negative amount");
            return Outcome::Ignored;
        };
        if requested == 0 {
            debug!("Ignoring zero amount");
            return Outcome::Ignored;
        }
        let result = self.try_update(id, requested).await;
        self.settle(CartOperation::UpdateAmount, id, result)
    }

    async fn try_add(&self, id: ProductId) -> Result<Outcome, CartError> {
        let _product = self.product_locks.lock(id).await;

        let existing = self.cart().get(id).map(Product::amount);
        let stock = self.stock.get_stock(id).await?;

        if let Some(current) = existing {
            let requested = u64::from(current) + 1;
            if !stock.covers(requested) {
                return Err(CartError::OutOfStock {
                    product_id: id,
                    requested,
                    available: stock.amount,
                });
            }
            let amount = nonzero(requested, id, stock.amount)?;
            self.commit(Change::SetAmount(id, amount)).await?;
            info!(amount = amount.get(), available = stock.amount, "Product amount incremented");
        } else {
            let details = self.stock.get_product(id).await?;
            let product = Product::new(details, NonZeroU32::MIN);
            self.commit(Change::Append(product)).await?;
            info!(available = stock.amount, "Product added");
        }

        Ok(Outcome::Committed)
    }

    async fn try_remove(&self, id: ProductId) -> Result<Outcome, CartError> {
        let _product = self.product_locks.lock(id).await;

        self.commit(Change::Remove(id)).await?;
        info!("Product removed");

        Ok(Outcome::Committed)
    }

    async fn try_update(&self, id: ProductId, requested: u64) -> Result<Outcome, CartError> {
        let _product = self.product_locks.lock(id).await;

        let stock = self.stock.get_stock(id).await?;
        if !stock.covers(requested) {
            return Err(CartError::OutOfStock {
                product_id: id,
                requested,
                available: stock.amount,
            });
        }

        let amount = nonzero(requested, id, stock.amount)?;
        self.commit(Change::SetAmount(id, amount)).await?;
        info!(amount = amount.get(), available = stock.amount, "Product amount updated");

        Ok(Outcome::Committed)
    }

    /// Derive the next snapshot from the latest committed cart, persist it,
    /// then make it current. Commits are serialized; the store is written
    /// before the in-memory swap, so a failed write changes nothing.
    async fn commit(&self, change: Change) -> Result<(), CartError> {
        let _commit = self.commit_lock.lock().await;

        let next = change.apply(&self.cart())?;
        let bytes = store::encode_cart(&next)?;
        self.store.write(&self.storage_key, &bytes).await?;

        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(next);
        Ok(())
    }

    /// Absorb a failure: log it, notify the user, and report it in the outcome.
    fn settle(
        &self,
        operation: CartOperation,
        id: ProductId,
        result: Result<Outcome, CartError>,
    ) -> Outcome {
        match result {
            Ok(outcome) => outcome,
            Err(err) => {
                if err.is_rejection() {
                    warn!(product_id = %id, ?operation, error = %err, "Cart change rejected");
                } else {
                    error!(product_id = %id, ?operation, error = %err, "Cart change failed");
                }
                self.notifier.error(err.notice(operation));
                Outcome::Failed(err)
            }
        }
    }
}

/// A validated edit, applied to whichever snapshot is current at commit time.
#[derive(Debug)]
enum Change {
    Append(Product),
    SetAmount(ProductId, NonZeroU32),
    Remove(ProductId),
}

impl Change {
    fn apply(self, cart: &Cart) -> Result<Cart, CartError> {
        match self {
            Self::Append(product) => Ok(cart.with_product(product)?),
            Self::SetAmount(id, amount) => {
                cart.with_amount(id, amount).ok_or(CartError::NotInCart(id))
            }
            Self::Remove(id) => cart.without(id).ok_or(CartError::NotInCart(id)),
        }
    }
}

/// `requested` as a cart amount. Callers have already checked it against a
/// `u32` stock level and rejected zero.
fn nonzero(requested: u64, id: ProductId, available: u32) -> Result<NonZeroU32, CartError> {
    u32::try_from(requested)
        .ok()
        .and_then(NonZeroU32::new)
        .ok_or(CartError::OutOfStock {
            product_id: id,
            requested,
            available,
        })
}
