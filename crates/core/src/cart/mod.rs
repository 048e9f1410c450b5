//! Client-side cart model.
//!
//! - [`line_item`] - stock-aware line items and product snapshots
//! - [`state`] - the ordered, duplicate-free cart
//! - [`reducer`] - the pure state machine over [`CartAction`]s
//!
//! Invariants held by every state the reducer produces:
//! - `0 < qty <= max_stock` for lines created or changed by `Add`/`UpdateQty`
//! - no two lines share a [`LineKey`]
//!
//! `SetCart` only enforces well-formedness, so a server cart may carry lines
//! whose quantity exceeds a stale `max_stock`.

pub mod line_item;
pub mod reducer;
pub mod state;

pub use line_item::{
    LOW_STOCK_THRESHOLD, LineItem, LineKey, ProductSnapshot, SelectionError, SizeStock, StockLevel,
};
pub use reducer::{CartAction, CartSignal, Transition, reduce};
pub use state::CartState;
