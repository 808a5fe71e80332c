//! Stock levels reported by the stock service.

use serde::{Deserialize, Serialize};

use super::ProductId;

/// Available quantity of a product.
///
/// Always fetched fresh for each cart mutation; never cached or persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEntry {
    pub id: ProductId,
    pub amount: u32,
}

impl StockEntry {
    /// Whether `requested` units can be taken from this entry.
    #[must_use]
    pub fn covers(&self, requested: u64) -> bool {
        requested <= u64::from(self.amount)
    }
}
