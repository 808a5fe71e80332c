//! Core types for RocketShoes.
//!
//! This module provides type-safe wrappers for the cart domain.

pub mod cart;
pub mod id;
pub mod price;
pub mod product;
pub mod stock;

pub use cart::{Cart, CartInvariantError};
pub use id::*;
pub use price::Price;
pub use product::{Product, ProductDetails};
pub use stock::StockEntry;
