//! `emporium orders ...`

use emporium_core::OrderId;
use emporium_storefront::OrderApi;

use super::CommandError;
use crate::output;
use crate::session::Session;

pub async fn list(session: &Session) -> Result<(), CommandError> {
    session.require_user()?;
    let orders = session.client.list_orders().await?;
    output::print(&output::render_orders(&orders));
    Ok(())
}

pub async fn show(session: &Session, order_id: &str) -> Result<(), CommandError> {
    session.require_user()?;
    let order = session.client.get_order(&OrderId::new(order_id)).await?;
    output::print(&output::render_order(&order));
    Ok(())
}

/// Cancel an order. Delivered and cancelled orders are refused
/// without asking the server.
pub async fn cancel(session: &Session, order_id: &str) -> Result<(), CommandError> {
    session.require_user()?;
    let id = OrderId::new(order_id);
    let order = session.client.get_order(&id).await?;

    if !order.status.is_cancellable() {
        return Err(CommandError::NotCancellable {
            id,
            status: order.status,
        });
    }

    session.client.cancel_order(&id).await?;
    output::notice(&format!("Order {id} cancelled."));
    Ok(())
}
