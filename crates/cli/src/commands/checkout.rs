//! `emporium checkout`

use emporium_storefront::{CheckoutCoordinator, CheckoutError};

use super::CommandError;
use crate::output;
use crate::session::Session;

pub async fn place(session: &mut Session) -> Result<(), CommandError> {
    session.require_user()?;

    let mut checkout = CheckoutCoordinator::new();
    let summary = checkout.summary(&session.store);
    if !summary.lines.is_empty() {
        output::print(&output::render_cart(session.store.state()));
    }

    match checkout.place_order(&session.client, &mut session.store).await {
        Ok(order_id) => {
            output::notice(&format!("Order placed: {order_id}"));
            Ok(())
        }
        Err(CheckoutError::EmptyCart) => {
            output::notice("Your cart is empty. Add something with `emporium cart add`.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
