//! Emporium Core - Shared types library.
//!
//! This crate provides the types used across all Emporium components:
//! - `storefront` - REST client, cart store, server sync and checkout
//! - `cli` - Command-line driver for a cart session
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. The cart reducer lives here so it can be replayed and tested
//! deterministically without a runtime.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, money and statuses
//! - [`cart`] - Line items, cart state and the cart reducer

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{
    CartAction, CartSignal, CartState, LineItem, LineKey, ProductSnapshot, SelectionError,
    SizeStock, StockLevel, Transition, reduce,
};
pub use types::*;
