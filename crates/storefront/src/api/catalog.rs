//! Product catalog endpoints and client-side listing filters.

use std::future::Future;

use tracing::instrument;

use emporium_core::{ProductId, ProductSnapshot};

use super::{ApiClient, ApiResult, id_path};

const PRODUCTS: &str = "api/products";

/// Read-only product catalog.
pub trait CatalogApi: Send + Sync {
    /// Every product with its current stock.
    fn list_products(&self) -> impl Future<Output = ApiResult<Vec<ProductSnapshot>>> + Send;

    /// A fresh snapshot of one product.
    fn get_product(&self, id: &ProductId)
    -> impl Future<Output = ApiResult<ProductSnapshot>> + Send;
}

impl CatalogApi for ApiClient {
    #[instrument(skip(self))]
    async fn list_products(&self) -> ApiResult<Vec<ProductSnapshot>> {
        self.get(PRODUCTS).await
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_product(&self, id: &ProductId) -> ApiResult<ProductSnapshot> {
        self.get(&id_path(PRODUCTS, id.as_str())?).await
    }
}

/// Listing filter applied after the catalog is fetched.
///
/// Category matches exactly, ignoring case. Search matches any part of the
/// product name, ignoring case. An unset field matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub search: Option<String>,
}

impl ProductFilter {
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Whether a product passes the filter.
    #[must_use]
    pub fn matches(&self, product: &ProductSnapshot) -> bool {
        let category_ok = self.category.as_deref().is_none_or(|wanted| {
            product
                .category
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(wanted))
        });

        let search_ok = self.search.as_deref().map(str::trim).is_none_or(|needle| {
            needle.is_empty() || product.name.to_lowercase().contains(&needle.to_lowercase())
        });

        category_ok && search_ok
    }

    /// Keep only the products that pass the filter, preserving order.
    #[must_use]
    pub fn apply(&self, products: Vec<ProductSnapshot>) -> Vec<ProductSnapshot> {
        products.into_iter().filter(|p| self.matches(p)).collect()
    }
}
