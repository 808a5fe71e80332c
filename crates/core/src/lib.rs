//! RocketShoes Core - Shared types library.
//!
//! This crate provides the types shared by all RocketShoes components:
//! - `cart` - Cart manager, stock client and persistence adapters
//! - `cli` - Command-line driver for the cart
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product identifiers, prices, cart snapshots and stock entries

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
