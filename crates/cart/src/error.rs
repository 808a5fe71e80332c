//! Cart operation errors.
//!
//! Every failure of a cart mutation collapses into a [`CartError`], which
//! maps onto the notice shown to the user via [`CartError::notice`].

use rocketshoes_core::{CartInvariantError, ProductId};
use thiserror::Error;

use crate::notify;
use crate::stock::StockError;
use crate::store::StoreError;

/// The three cart mutations, used to pick the failure notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartOperation {
    Add,
    Remove,
    UpdateAmount,
}

impl CartOperation {
    /// Generic notice for a failed operation of this kind.
    #[must_use]
    pub const fn failure_notice(self) -> &'static str {
        match self {
            Self::Add => notify::ADD_FAILED,
            Self::Remove => notify::REMOVE_FAILED,
            Self::UpdateAmount => notify::UPDATE_FAILED,
        }
    }
}

/// Why a cart mutation was not applied.
#[derive(Debug, Error)]
pub enum CartError {
    /// Requested quantity exceeds the available stock.
    #[error("Product {product_id}: requested {requested}, only {available} in stock")]
    OutOfStock {
        product_id: ProductId,
        requested: u64,
        available: u32,
    },

    /// The operation needs the product to be in the cart and it is not.
    #[error("Product {0} is not in the cart")]
    NotInCart(ProductId),

    /// Stock or product lookup failed.
    #[error("Stock service error: {0}")]
    Stock(#[from] StockError),

    /// Persisting the cart failed.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// The new snapshot would break the cart invariants.
    #[error("Cart invariant violated: {0}")]
    Invariant(#[from] CartInvariantError),
}

impl CartError {
    /// Notice shown to the user when `operation` fails with this error.
    #[must_use]
    pub const fn notice(&self, operation: CartOperation) -> &'static str {
        match self {
            Self::OutOfStock { .. } => notify::OUT_OF_STOCK,
            _ => operation.failure_notice(),
        }
    }

    /// Whether this is an expected rejection rather than a service failure.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::OutOfStock { .. } | Self::NotInCart(_))
    }
}
