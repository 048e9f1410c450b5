//! Order endpoints.

use std::future::Future;

use tracing::instrument;

use emporium_core::OrderId;

use super::types::{Order, OrderCreated};
use super::{ApiClient, ApiResult, id_path};

const ORDERS: &str = "api/orders";
const ORDERS_CANCEL: &str = "api/orders/cancel";

/// Orders placed by the current session.
pub trait OrderApi: Send + Sync {
    /// Turn the server cart into an order. The server clears its cart on
    /// success.
    fn place_order(&self) -> impl Future<Output = ApiResult<OrderId>> + Send;

    /// Orders of the current user, newest first as the backend sorts them.
    fn list_orders(&self) -> impl Future<Output = ApiResult<Vec<Order>>> + Send;

    /// One order by id.
    fn get_order(&self, id: &OrderId) -> impl Future<Output = ApiResult<Order>> + Send;

    /// Cancel an order that has not shipped yet.
    fn cancel_order(&self, id: &OrderId) -> impl Future<Output = ApiResult<()>> + Send;
}

fn order_path(id: &OrderId) -> ApiResult<String> {
    id_path(ORDERS, id.as_str())
}

fn cancel_path(id: &OrderId) -> ApiResult<String> {
    id_path(ORDERS_CANCEL, id.as_str())
}

impl OrderApi for ApiClient {
    #[instrument(skip(self))]
    async fn place_order(&self) -> ApiResult<OrderId> {
        let created: OrderCreated = self.post_empty(ORDERS).await?;
        Ok(created.order.id)
    }

    #[instrument(skip(self))]
    async fn list_orders(&self) -> ApiResult<Vec<Order>> {
        self.get(ORDERS).await
    }

    #[instrument(skip(self), fields(order_id = %id))]
    async fn get_order(&self, id: &OrderId) -> ApiResult<Order> {
        self.get(&order_path(id)?).await
    }

    #[instrument(skip(self), fields(order_id = %id))]
    async fn cancel_order(&self, id: &OrderId) -> ApiResult<()> {
        self.put_ack(&cancel_path(id)?, None::<&()>).await
    }
}
