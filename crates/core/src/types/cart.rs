//! Immutable cart snapshots.
//!
//! A [`Cart`] is never edited in place. Every change produces a new snapshot
//! via `with_product`, `with_amount` or `without`, so a caller holding the
//! previous snapshot keeps seeing it unchanged until it swaps in the new one.

use std::collections::HashSet;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Product, ProductId};

/// A product list that breaks the cart's structural rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CartInvariantError {
    #[error("product {0} appears more than once")]
    DuplicateProduct(ProductId),
    #[error("product {0} has a zero amount")]
    ZeroAmount(ProductId),
}

/// Ordered, identifier-unique list of products and their quantities.
///
/// Insertion order is display order. Serializes as a bare JSON array of
/// product records; deserialization rejects duplicate identifiers and zero
/// amounts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Product>", into = "Vec<Product>")]
pub struct Cart {
    items: Vec<Product>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from an ordered product list.
    ///
    /// # Errors
    ///
    /// Returns `CartInvariantError` if an identifier repeats or an amount is zero.
    pub fn from_items(items: Vec<Product>) -> Result<Self, CartInvariantError> {
        let mut seen = HashSet::with_capacity(items.len());
        for product in &items {
            if product.amount() == 0 {
                return Err(CartInvariantError::ZeroAmount(product.id()));
            }
            if !seen.insert(product.id()) {
                return Err(CartInvariantError::DuplicateProduct(product.id()));
            }
        }
        Ok(Self { items })
    }

    /// Look up a product line by identifier.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.items.iter().find(|product| product.id() == id)
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.get(id).is_some()
    }

    /// Iterate the product lines in display order.
    pub fn iter(&self) -> std::slice::Iter<'_, Product> {
        self.items.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Product] {
        &self.items
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all line amounts (the header badge count).
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|p| u64::from(p.amount())).sum()
    }

    /// New snapshot with `product` appended at the end.
    ///
    /// # Errors
    ///
    /// Returns `CartInvariantError::DuplicateProduct` if the product is already
    /// in the cart.
    pub fn with_product(&self, product: Product) -> Result<Self, CartInvariantError> {
        if self.contains(product.id()) {
            return Err(CartInvariantError::DuplicateProduct(product.id()));
        }
        if product.amount() == 0 {
            return Err(CartInvariantError::ZeroAmount(product.id()));
        }
        let mut items = Vec::with_capacity(self.items.len() + 1);
        items.extend(self.items.iter().cloned());
        items.push(product);
        Ok(Self { items })
    }

    /// New snapshot with the amount of `id` set to `amount`, keeping its
    /// position. Returns `None` if `id` is not in the cart.
    #[must_use]
    pub fn with_amount(&self, id: ProductId, amount: NonZeroU32) -> Option<Self> {
        if !self.contains(id) {
            return None;
        }
        let items = self
            .items
            .iter()
            .map(|product| {
                if product.id() == id {
                    product.with_amount(amount)
                } else {
                    product.clone()
                }
            })
            .collect();
        Some(Self { items })
    }

    /// New snapshot without `id`. Returns `None` if `id` is not in the cart.
    #[must_use]
    pub fn without(&self, id: ProductId) -> Option<Self> {
        if !self.contains(id) {
            return None;
        }
        let items = self
            .items
            .iter()
            .filter(|product| product.id() != id)
            .cloned()
            .collect();
        Some(Self { items })
    }
}

impl TryFrom<Vec<Product>> for Cart {
    type Error = CartInvariantError;

    fn try_from(items: Vec<Product>) -> Result<Self, Self::Error> {
        Self::from_items(items)
    }
}

impl From<Cart> for Vec<Product> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a Product;
    type IntoIter = std::slice::Iter<'a, Product>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
