//! `emporium cart ...`

use emporium_core::{LineKey, ProductId};
use emporium_storefront::{CatalogApi, MutationOutcome};

use super::CommandError;
use crate::output;
use crate::session::Session;

pub fn show(session: &Session) {
    if session.store.is_drifted() {
        output::warning("the cart may differ from the server");
    }
    output::print(&output::render_cart(session.store.state()));
}

/// Add one unit, re-reading the product first so the stock ceiling is fresh.
pub async fn add(
    session: &mut Session,
    product_id: &str,
    size: Option<&str>,
) -> Result<(), CommandError> {
    session.require_user()?;
    let product = session
        .client
        .get_product(&ProductId::new(product_id))
        .await?;

    let outcome = session
        .sync
        .add_product(&mut session.store, &product, size)
        .await?;
    finish(session, outcome, &format!("Added {} to the cart.", product.name)).await
}

pub async fn set_qty(
    session: &mut Session,
    product_id: &str,
    size: Option<&str>,
    qty: i64,
) -> Result<(), CommandError> {
    session.require_user()?;
    let key = LineKey::new(product_id, size);
    if session.store.find(&key).is_none() {
        return Err(CommandError::NotInCart(key));
    }

    let outcome = session
        .sync
        .update_qty(&mut session.store, &key, qty)
        .await?;
    finish(session, outcome, "Cart updated.").await
}

pub async fn remove(
    session: &mut Session,
    product_id: &str,
    size: Option<&str>,
) -> Result<(), CommandError> {
    session.require_user()?;
    let key = LineKey::new(product_id, size);
    if session.store.find(&key).is_none() {
        return Err(CommandError::NotInCart(key));
    }

    let outcome = session.sync.remove(&mut session.store, &key).await;
    finish(session, outcome, "Removed from the cart.").await
}

pub async fn clear(session: &mut Session) -> Result<(), CommandError> {
    session.require_user()?;
    let outcome = session.sync.clear(&mut session.store).await;
    finish(session, outcome, "Cart cleared.").await
}

/// Report the outcome and print the cart.
///
/// When the server did not take the change, the cart is re-read so what is
/// printed is the server's view.
async fn finish(
    session: &mut Session,
    outcome: MutationOutcome,
    done: &str,
) -> Result<(), CommandError> {
    match outcome {
        MutationOutcome::Persisted => output::notice(done),
        MutationOutcome::Unchanged => output::notice("Nothing to change."),
        MutationOutcome::NotPersisted(err) => {
            let message = err.server_message().unwrap_or("the server could not be reached");
            output::warning(&format!("the server did not save this change: {message}"));
            session.sync.reconcile(&mut session.store).await?;
        }
    }
    show(session);
    Ok(())
}
