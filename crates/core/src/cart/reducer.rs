//! The cart state machine.
//!
//! [`reduce`] is a pure transition function: the same `(state, action)`
//! always yields the same next state and the same signal. Rejected
//! transitions never panic or error; they return the unchanged state plus a
//! [`CartSignal`].

use serde::{Deserialize, Serialize};

use super::line_item::{LineItem, LineKey};
use super::state::CartState;

/// Everything that can happen to a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CartAction {
    /// Replace the whole cart. Used only by server sync.
    SetCart(Vec<LineItem>),
    /// Add one unit of a line, creating it with quantity 1 if absent.
    Add(LineItem),
    /// Delete a line. Absent lines are not an error.
    Remove(LineKey),
    /// Set a line's quantity exactly; zero or less removes it.
    UpdateQty { key: LineKey, qty: i64 },
    /// Empty the cart.
    Clear,
}

impl CartAction {
    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SetCart(_) => "set_cart",
            Self::Add(_) => "add",
            Self::Remove(_) => "remove",
            Self::UpdateQty { .. } => "update_qty",
            Self::Clear => "clear",
        }
    }
}

/// Out-of-band result of a rejected transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CartSignal {
    /// The requested quantity would exceed the line's stock ceiling.
    StockExceeded { max_stock: u32 },
}

impl std::fmt::Display for CartSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StockExceeded { max_stock } => write!(f, "only {max_stock} available"),
        }
    }
}

/// Output of one reducer step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Next state. Equal to the input state when nothing changed.
    pub state: CartState,
    /// Set when the action was rejected.
    pub signal: Option<CartSignal>,
    /// Whether `state` differs from the input state.
    pub changed: bool,
}

impl Transition {
    fn unchanged(state: &CartState) -> Self {
        Self {
            state: state.clone(),
            signal: None,
            changed: false,
        }
    }

    fn rejected(state: &CartState, max_stock: u32) -> Self {
        Self {
            state: state.clone(),
            signal: Some(CartSignal::StockExceeded { max_stock }),
            changed: false,
        }
    }

    fn to(next: CartState, prev: &CartState) -> Self {
        let changed = next != *prev;
        Self {
            state: next,
            signal: None,
            changed,
        }
    }
}

/// Apply `action` to `state`.
#[must_use]
pub fn reduce(state: &CartState, action: CartAction) -> Transition {
    match action {
        CartAction::SetCart(items) => Transition::to(CartState::from_items(items), state),
        CartAction::Add(item) => add(state, item),
        CartAction::Remove(key) => match state.position(&key) {
            Some(index) => {
                let mut next = state.clone();
                next.items_mut().remove(index);
                Transition::to(next, state)
            }
            None => Transition::unchanged(state),
        },
        CartAction::UpdateQty { key, qty } => update_qty(state, &key, qty),
        CartAction::Clear => Transition::to(CartState::new(), state),
    }
}

/// An add attempt re-validates against the caller's fresh stock snapshot:
/// the incoming line's `max_stock` becomes the ceiling for the increment.
fn add(state: &CartState, item: LineItem) -> Transition {
    let ceiling = item.max_stock;

    match state.position(&item.key()) {
        Some(index) => {
            let mut next = state.clone();
            let Some(existing) = next.items_mut().get_mut(index) else {
                return Transition::unchanged(state);
            };
            match existing.qty.checked_add(1) {
                Some(qty) if qty <= ceiling => {
                    existing.qty = qty;
                    existing.max_stock = ceiling;
                    Transition::to(next, state)
                }
                _ => Transition::rejected(state, ceiling),
            }
        }
        None if ceiling == 0 => Transition::rejected(state, 0),
        None => {
            let mut next = state.clone();
            next.items_mut().push(LineItem { qty: 1, ..item });
            Transition::to(next, state)
        }
    }
}

fn update_qty(state: &CartState, key: &LineKey, qty: i64) -> Transition {
    let Some(index) = state.position(key) else {
        return Transition::unchanged(state);
    };

    let mut next = state.clone();
    if qty <= 0 {
        next.items_mut().remove(index);
        return Transition::to(next, state);
    }

    let Some(existing) = next.items_mut().get_mut(index) else {
        return Transition::unchanged(state);
    };
    match u32::try_from(qty) {
        Ok(qty) if qty <= existing.max_stock => {
            existing.qty = qty;
            Transition::to(next, state)
        }
        _ => Transition::rejected(state, existing.max_stock),
    }
}
