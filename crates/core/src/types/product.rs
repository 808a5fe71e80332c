//! Product records as held in the cart.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use super::{Price, ProductId};

/// Product metadata as served by the product catalogue.
///
/// Only the identifier carries meaning for the cart. Fields the catalogue
/// adds beyond the known ones are kept in `extra` and written back verbatim,
/// so a stored cart reproduces exactly what the catalogue returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDetails {
    /// Catalogue identifier.
    pub id: ProductId,
    /// Display name.
    pub title: String,
    /// Unit price.
    pub price: Price,
    /// Image URL.
    pub image: String,
    /// Any further catalogue fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A product line in the cart.
///
/// Serializes flat: the catalogue fields followed by `amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(flatten)]
    pub details: ProductDetails,
    amount: u32,
}

impl Product {
    /// Create a cart line for `details` with the given quantity.
    #[must_use]
    pub fn new(mut details: ProductDetails, amount: NonZeroU32) -> Self {
        // The line's own quantity owns this key in the serialized record.
        details.extra.remove("amount");
        Self {
            details,
            amount: amount.get(),
        }
    }

    /// Catalogue identifier of this line.
    #[must_use]
    pub const fn id(&self) -> ProductId {
        self.details.id
    }

    /// Quantity of this product in the cart.
    #[must_use]
    pub const fn amount(&self) -> u32 {
        self.amount
    }

    /// Copy of this line with a different quantity.
    #[must_use]
    pub fn with_amount(&self, amount: NonZeroU32) -> Self {
        Self {
            details: self.details.clone(),
            amount: amount.get(),
        }
    }
}
