//! The cart store: one current [`CartState`] behind a dispatch entry point.
//!
//! Every mutation goes through [`CartStore::dispatch`], which runs the pure
//! reducer and publishes the next state to subscribers when it changed.
//! Totals are recomputed from the current state on every read.
//!
//! The store is owned by a single session and mutated through `&mut self`;
//! subscribers only ever see complete states.

use tokio::sync::watch;
use tracing::instrument;

use emporium_core::{CartAction, CartSignal, CartState, LineItem, LineKey, Money, reduce};

/// Result of one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatched {
    /// Set when the reducer refused the action.
    pub signal: Option<CartSignal>,
    /// Whether the state changed (and subscribers were notified).
    pub changed: bool,
}

impl Dispatched {
    /// Whether the reducer refused the action.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        self.signal.is_some()
    }
}

/// Holds the session's cart and notifies subscribers of changes.
#[derive(Debug)]
pub struct CartStore {
    state: CartState,
    drifted: bool,
    tx: watch::Sender<CartState>,
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CartStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: CartState::new(),
            drifted: false,
            tx: watch::Sender::new(CartState::new()),
        }
    }

    /// Apply `action` and publish the result if anything changed.
    ///
    /// A full replacement (`SetCart`) also clears the drift marker, even
    /// when the replacement equals the current state.
    #[instrument(skip(self, action), fields(action = action.name()))]
    pub fn dispatch(&mut self, action: CartAction) -> Dispatched {
        let replaces = matches!(action, CartAction::SetCart(_));
        let transition = reduce(&self.state, action);

        if replaces {
            self.drifted = false;
        }

        if let Some(signal) = transition.signal {
            tracing::debug!(%signal, "Cart action rejected");
        }

        if transition.changed {
            self.state = transition.state;
            self.tx.send_replace(self.state.clone());
            tracing::debug!(
                lines = self.state.len(),
                total_items = self.state.total_items(),
                "Cart updated"
            );
        }

        Dispatched {
            signal: transition.signal,
            changed: transition.changed,
        }
    }

    /// Watch the cart. The receiver starts at the current state.
    #[must_use]
    pub fn subscribe(&self) -> CartSubscription {
        CartSubscription {
            rx: self.tx.subscribe(),
        }
    }

    #[must_use]
    pub const fn state(&self) -> &CartState {
        &self.state
    }

    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        self.state.items()
    }

    #[must_use]
    pub fn find(&self, key: &LineKey) -> Option<&LineItem> {
        self.state.find(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    /// Sum of quantities.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.state.total_items()
    }

    /// Sum of `qty * price`.
    #[must_use]
    pub fn total_price(&self) -> Money {
        self.state.total_price()
    }

    /// Whether an optimistic change may not have reached the server.
    ///
    /// Cleared by the next full replacement from the server.
    #[must_use]
    pub const fn is_drifted(&self) -> bool {
        self.drifted
    }

    pub(crate) fn mark_drifted(&mut self) {
        self.drifted = true;
    }
}

/// Subscription handle returned by [`CartStore::subscribe`].
#[derive(Debug, Clone)]
pub struct CartSubscription {
    rx: watch::Receiver<CartState>,
}

impl CartSubscription {
    /// The latest published state, marking it as seen.
    #[must_use]
    pub fn latest(&mut self) -> CartState {
        self.rx.borrow_and_update().clone()
    }

    /// The latest published state without marking it as seen.
    #[must_use]
    pub fn current(&self) -> CartState {
        self.rx.borrow().clone()
    }

    /// Whether a state was published since the last [`latest`](Self::latest).
    #[must_use]
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Wait for the next published state.
    ///
    /// Returns `None` once the store has been dropped.
    pub async fn changed(&mut self) -> Option<CartState> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use emporium_core::ProductId;

    use super::*;

    fn item(id: &str, size: Option<&str>, max_stock: u32, price: u32) -> LineItem {
        LineItem {
            product_id: ProductId::new(id),
            size: size.map(str::to_owned),
            name: format!("Product {id}"),
            price: Money::from_whole(price),
            image: String::new(),
            qty: 1,
            max_stock,
        }
    }

    #[test]
    fn test_totals_recomputed_on_read() {
        let mut store = CartStore::new();
        store.dispatch(CartAction::Add(item("A", Some("9"), 5, 250)));
        store.dispatch(CartAction::Add(item("A", Some("9"), 5, 250)));
        store.dispatch(CartAction::Add(item("B", None, 3, 99)));

        assert_eq!(store.total_items(), 3);
        assert_eq!(store.total_price(), Money::from_whole(599));
    }

    #[test]
    fn test_subscribers_notified_only_on_change() {
        let mut store = CartStore::new();
        let mut sub = store.subscribe();
        assert!(!sub.has_changed());

        let out = store.dispatch(CartAction::Remove(LineKey::new("A", None)));
        assert!(!out.changed);
        assert!(!sub.has_changed());

        let out = store.dispatch(CartAction::Add(item("A", None, 1, 100)));
        assert!(out.changed);
        assert!(sub.has_changed());
        assert_eq!(sub.latest().len(), 1);
        assert!(!sub.has_changed());

        let out = store.dispatch(CartAction::Add(item("A", None, 1, 100)));
        assert_eq!(out.signal, Some(CartSignal::StockExceeded { max_stock: 1 }));
        assert!(out.is_rejected());
        assert!(!sub.has_changed());
    }

    #[test]
    fn test_set_cart_clears_drift() {
        let mut store = CartStore::new();
        store.mark_drifted();
        assert!(store.is_drifted());

        store.dispatch(CartAction::Clear);
        assert!(store.is_drifted());

        store.dispatch(CartAction::SetCart(Vec::new()));
        assert!(!store.is_drifted());
    }

    #[tokio::test]
    async fn test_changed_wakes_on_dispatch() {
        let mut store = CartStore::new();
        let mut sub = store.subscribe();

        let waiter = tokio::spawn(async move { sub.changed().await });
        store.dispatch(CartAction::Add(item("A", Some("9"), 2, 250)));

        let seen = waiter.await.unwrap().unwrap();
        assert_eq!(seen.items()[0].key(), LineKey::new("A", Some("9")));
    }

    #[tokio::test]
    async fn test_changed_ends_when_store_dropped() {
        let store = CartStore::new();
        let mut sub = store.subscribe();
        drop(store);
        assert!(sub.changed().await.is_none());
        assert!(sub.current().is_empty());
    }
}
