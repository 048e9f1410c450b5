//! `emporium products`

use emporium_storefront::CatalogApi;
use emporium_storefront::api::ProductFilter;

use super::CommandError;
use crate::output;
use crate::session::Session;

/// List the catalog, optionally narrowed by category and name.
pub async fn list(
    session: &Session,
    category: Option<String>,
    search: Option<String>,
) -> Result<(), CommandError> {
    let filter = ProductFilter { category, search };
    let products = filter.apply(session.client.list_products().await?);
    tracing::debug!(count = products.len(), ?filter, "Listing products");
    output::print(&output::render_products(&products));
    Ok(())
}
