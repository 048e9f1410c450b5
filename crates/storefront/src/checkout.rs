//! Order placement.
//!
//! The client sends only the intent to order; the server builds the order
//! from its own cart and re-validates stock and prices. The local cart is
//! cleared only once the server has accepted the order, so a rejected
//! checkout can be retried as is.

use thiserror::Error;
use tracing::instrument;

use emporium_core::{CartAction, LineItem, Money, OrderId};

use crate::api::{ApiError, OrderApi};
use crate::error::add_breadcrumb;
use crate::store::CartStore;

/// Where the coordinator is in placing an order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CheckoutPhase {
    #[default]
    Idle,
    Placing,
    Succeeded(OrderId),
    /// The server's message, verbatim.
    Failed(String),
}

/// Errors returned by [`CheckoutCoordinator::place_order`].
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing to order; send the shopper back to the cart.
    #[error("Your cart is empty")]
    EmptyCart,

    /// The server refused the order.
    #[error("{0}")]
    Rejected(String),

    /// The server could not be reached.
    #[error("Checkout unavailable: {0}")]
    Unavailable(#[source] ApiError),

    /// The server accepted the order but its reply could not be read. The
    /// order most likely exists; check the order history.
    #[error("Order placed but its confirmation could not be read")]
    Unconfirmed(#[source] ApiError),
}

impl From<ApiError> for CheckoutError {
    fn from(err: ApiError) -> Self {
        if err.is_unreachable() {
            return Self::Unavailable(err);
        }
        match err.server_message() {
            Some(message) => Self::Rejected(message.to_string()),
            None => Self::Rejected(err.to_string()),
        }
    }
}

/// Snapshot of the cart shown on the confirmation view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSummary {
    pub lines: Vec<LineItem>,
    pub total_items: u64,
    pub total_price: Money,
}

/// Drives `Idle -> Placing -> Succeeded | Failed`.
#[derive(Debug, Default)]
pub struct CheckoutCoordinator {
    phase: CheckoutPhase,
}

impl CheckoutCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn phase(&self) -> &CheckoutPhase {
        &self.phase
    }

    /// Lines and totals as they stand now. Prices are the cached snapshots;
    /// the server decides the final amount.
    #[must_use]
    pub fn summary(&self, store: &CartStore) -> CheckoutSummary {
        CheckoutSummary {
            lines: store.items().to_vec(),
            total_items: store.total_items(),
            total_price: store.total_price(),
        }
    }

    /// Place an order for the server's current cart.
    ///
    /// On success the local cart is cleared and the new order id returned.
    /// On failure the cart is left untouched.
    ///
    /// # Errors
    ///
    /// - `CheckoutError::EmptyCart` if the local cart is empty; nothing is
    ///   sent and the phase does not change
    /// - `CheckoutError::Rejected` with the server's message if the order was
    ///   refused
    /// - `CheckoutError::Unavailable` if the server could not be reached
    /// - `CheckoutError::Unconfirmed` if the server accepted the order but
    ///   its reply was unreadable; the local cart is cleared and marked
    ///   drifted so the next reconcile shows what the server kept
    #[instrument(skip_all, fields(lines = store.items().len()))]
    pub async fn place_order<A: OrderApi>(
        &mut self,
        api: &A,
        store: &mut CartStore,
    ) -> Result<OrderId, CheckoutError> {
        if store.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        self.phase = CheckoutPhase::Placing;
        add_breadcrumb("checkout", "Placing order", None);

        match api.place_order().await {
            Ok(order_id) => {
                store.dispatch(CartAction::Clear);
                tracing::info!(order_id = %order_id, "Order placed");
                add_breadcrumb(
                    "checkout",
                    "Order placed",
                    Some(&[("order_id", order_id.as_str())]),
                );
                self.phase = CheckoutPhase::Succeeded(order_id.clone());
                Ok(order_id)
            }
            // A 2xx whose body we could not decode: the server has committed
            Err(e @ ApiError::Parse(_)) => {
                store.dispatch(CartAction::Clear);
                store.mark_drifted();
                tracing::error!(error = %e, "Order accepted but confirmation unreadable");
                let err = CheckoutError::Unconfirmed(e);
                self.phase = CheckoutPhase::Failed(err.to_string());
                Err(err)
            }
            Err(e) => {
                let err = CheckoutError::from(e);
                tracing::warn!(error = %err, "Order rejected");
                self.phase = CheckoutPhase::Failed(err.to_string());
                Err(err)
            }
        }
    }

    /// Back to `Idle`, e.g. after the confirmation has been shown.
    pub fn reset(&mut self) {
        self.phase = CheckoutPhase::Idle;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use emporium_core::ProductId;

    use super::*;
    use crate::api::{ApiResult, Order};

    struct FakeOrders {
        result: Mutex<Option<ApiResult<OrderId>>>,
        calls: Mutex<u32>,
    }

    impl FakeOrders {
        fn answering(result: ApiResult<OrderId>) -> Self {
            Self {
                result: Mutex::new(Some(result)),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    impl OrderApi for FakeOrders {
        async fn place_order(&self) -> ApiResult<OrderId> {
            *self.calls.lock().unwrap() += 1;
            self.result
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(OrderId::new("again")))
        }

        async fn list_orders(&self) -> ApiResult<Vec<Order>> {
            Ok(Vec::new())
        }

        async fn get_order(&self, id: &OrderId) -> ApiResult<Order> {
            Err(ApiError::NotFound(format!("order {id}")))
        }

        async fn cancel_order(&self, _id: &OrderId) -> ApiResult<()> {
            Ok(())
        }
    }

    fn store_with_500() -> CartStore {
        let mut store = CartStore::new();
        store.dispatch(CartAction::Add(LineItem {
            product_id: ProductId::new("A"),
            size: Some("9".to_string()),
            name: "Runner".to_string(),
            price: Money::from_whole(500),
            image: "runner.jpg".to_string(),
            qty: 1,
            max_stock: 3,
        }));
        store
    }

    #[tokio::test]
    async fn test_success_clears_cart_and_returns_id() {
        let api = FakeOrders::answering(Ok(OrderId::new("o-1")));
        let mut store = store_with_500();
        let mut checkout = CheckoutCoordinator::new();

        let id = checkout.place_order(&api, &mut store).await.unwrap();

        assert_eq!(id.as_str(), "o-1");
        assert!(store.is_empty());
        assert_eq!(checkout.phase(), &CheckoutPhase::Succeeded(OrderId::new("o-1")));
    }

    #[tokio::test]
    async fn test_rejection_leaves_cart_untouched() {
        let api = FakeOrders::answering(Err(ApiError::Rejected {
            status: 400,
            message: "Insufficient stock for Runner (9)".to_string(),
        }));
        let mut store = store_with_500();
        let mut checkout = CheckoutCoordinator::new();

        let err = checkout.place_order(&api, &mut store).await.unwrap_err();

        assert_eq!(err.to_string(), "Insufficient stock for Runner (9)");
        assert_eq!(store.items().len(), 1);
        assert_eq!(store.total_price(), Money::from_whole(500));
        assert_eq!(
            checkout.phase(),
            &CheckoutPhase::Failed("Insufficient stock for Runner (9)".to_string())
        );

        // Retry after the failure goes through.
        let id = checkout.place_order(&api, &mut store).await.unwrap();
        assert_eq!(id.as_str(), "again");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_empty_cart_is_refused_without_calling_server() {
        let api = FakeOrders::answering(Ok(OrderId::new("o-1")));
        let mut store = CartStore::new();
        let mut checkout = CheckoutCoordinator::new();

        let err = checkout.place_order(&api, &mut store).await.unwrap_err();

        assert!(matches!(err, CheckoutError::EmptyCart));
        assert_eq!(checkout.phase(), &CheckoutPhase::Idle);
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn test_unreadable_confirmation_still_clears_cart() {
        let api = FakeOrders::answering(Err(ApiError::Parse("missing field `_id`".to_string())));
        let mut store = store_with_500();
        let mut checkout = CheckoutCoordinator::new();

        let err = checkout.place_order(&api, &mut store).await.unwrap_err();

        assert!(matches!(err, CheckoutError::Unconfirmed(ApiError::Parse(_))));
        assert_eq!(
            err.to_string(),
            "Order placed but its confirmation could not be read"
        );
        assert!(store.is_empty());
        assert!(store.is_drifted());
        assert!(matches!(checkout.phase(), CheckoutPhase::Failed(_)));

        // Nothing left to resubmit
        let again = checkout.place_order(&api, &mut store).await.unwrap_err();
        assert!(matches!(again, CheckoutError::EmptyCart));
        assert_eq!(api.calls(), 1);
    }

    #[test]
    fn test_summary_snapshots_totals() {
        let store = store_with_500();
        let summary = CheckoutCoordinator::new().summary(&store);
        assert_eq!(summary.lines.len(), 1);
        assert_eq!(summary.total_items, 1);
        assert_eq!(summary.total_price.to_string(), "₹500");
    }

    #[test]
    fn test_error_mapping() {
        let err = CheckoutError::from(ApiError::Unauthorized("Not authorized".to_string()));
        assert_eq!(err.to_string(), "Not authorized");

        let err = CheckoutError::from(ApiError::Rejected {
            status: 429,
            message: "Too many orders, slow down".to_string(),
        });
        assert!(matches!(err, CheckoutError::Rejected(ref m) if m == "Too many orders, slow down"));
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let mut checkout = CheckoutCoordinator {
            phase: CheckoutPhase::Failed("x".to_string()),
        };
        checkout.reset();
        assert_eq!(checkout.phase(), &CheckoutPhase::Idle);
    }
}
