//! Server cart endpoints.

use std::future::Future;

use tracing::instrument;

use emporium_core::LineKey;

use super::types::{CartKeyRequest, CartLineRequest, ServerCart};
use super::{ApiClient, ApiError, ApiResult};

const CART: &str = "api/cart";
const CART_ADD: &str = "api/cart/add";
const CART_UPDATE: &str = "api/cart/update";
const CART_REMOVE: &str = "api/cart/remove";
const CART_CLEAR: &str = "api/cart/clear";

/// Remote mutations of the server-held cart.
pub trait CartApi: Send + Sync {
    /// Fetch the cart of record. `Ok(None)` when the session has no cart.
    fn fetch_cart(&self) -> impl Future<Output = ApiResult<Option<ServerCart>>> + Send;

    /// Add `quantity` units of a line (the server increments existing lines).
    fn add_line(&self, key: &LineKey, quantity: u32)
    -> impl Future<Output = ApiResult<()>> + Send;

    /// Set a line's quantity exactly.
    fn update_line(
        &self,
        key: &LineKey,
        quantity: u32,
    ) -> impl Future<Output = ApiResult<()>> + Send;

    /// Delete a line.
    fn remove_line(&self, key: &LineKey) -> impl Future<Output = ApiResult<()>> + Send;

    /// Empty the cart.
    fn clear_cart(&self) -> impl Future<Output = ApiResult<()>> + Send;
}

impl CartApi for ApiClient {
    #[instrument(skip(self))]
    async fn fetch_cart(&self) -> ApiResult<Option<ServerCart>> {
        match self.get::<Option<ServerCart>>(CART).await {
            Ok(cart) => Ok(cart),
            Err(ApiError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self), fields(product_id = %key.product_id, size = ?key.size))]
    async fn add_line(&self, key: &LineKey, quantity: u32) -> ApiResult<()> {
        self.post_ack(CART_ADD, &CartLineRequest::new(key, quantity))
            .await
    }

    #[instrument(skip(self), fields(product_id = %key.product_id, size = ?key.size))]
    async fn update_line(&self, key: &LineKey, quantity: u32) -> ApiResult<()> {
        self.put_ack(CART_UPDATE, Some(&CartLineRequest::new(key, quantity)))
            .await
    }

    #[instrument(skip(self), fields(product_id = %key.product_id, size = ?key.size))]
    async fn remove_line(&self, key: &LineKey) -> ApiResult<()> {
        self.post_ack(CART_REMOVE, &CartKeyRequest::from(key)).await
    }

    #[instrument(skip(self))]
    async fn clear_cart(&self) -> ApiResult<()> {
        self.delete(CART_CLEAR).await
    }
}
