//! Stock-aware line items and the product snapshots they are built from.

use serde::{Deserialize, Serialize};

use crate::types::{Money, ProductId};

/// Threshold at or below which a product is shown as running low.
pub const LOW_STOCK_THRESHOLD: u32 = 5;

/// Stock held for one size variant of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeStock {
    /// Size label, e.g. `"9"` or `"XL"`.
    pub size: String,
    /// Units in stock. The backend may report negative values after
    /// oversells; those are treated as zero.
    #[serde(default)]
    pub stock: i64,
}

/// Product as the backend describes it at fetch time.
///
/// This is the full snapshot embedded in server cart entries and returned by
/// the product endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    /// Image reference (file name under the backend's uploads directory).
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Size variants. Empty when the product is sold without sizes.
    #[serde(default)]
    pub sizes: Vec<SizeStock>,
    /// Flat stock, only meaningful when `sizes` is empty.
    #[serde(default)]
    pub stock: i64,
}

/// Coarse availability used for stock badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockLevel {
    OutOfStock,
    /// Between one and [`LOW_STOCK_THRESHOLD`] units left.
    Low(u32),
    InStock,
}

/// Errors raised when building a line item from a product selection.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// The product has size variants but none was selected.
    #[error("please select a size for {product}")]
    SizeRequired {
        /// Product name.
        product: String,
    },
    /// The selected size is not offered for this product.
    #[error("size {size} is not available for {product}")]
    UnknownSize {
        /// Product name.
        product: String,
        /// Requested size.
        size: String,
    },
}

fn clamp_stock(stock: i64) -> u32 {
    u32::try_from(stock.max(0)).unwrap_or(u32::MAX)
}

impl ProductSnapshot {
    /// Whether the product is sold in size variants.
    #[must_use]
    pub fn has_sizes(&self) -> bool {
        !self.sizes.is_empty()
    }

    /// Stock for one size, or `None` if the product does not list it.
    #[must_use]
    pub fn stock_for(&self, size: &str) -> Option<u32> {
        self.sizes
            .iter()
            .find(|s| s.size == size)
            .map(|s| clamp_stock(s.stock))
    }

    /// Total units across all sizes, or the flat stock for sizeless products.
    #[must_use]
    pub fn total_stock(&self) -> u32 {
        if self.has_sizes() {
            self.sizes
                .iter()
                .map(|s| clamp_stock(s.stock))
                .fold(0u32, u32::saturating_add)
        } else {
            clamp_stock(self.stock)
        }
    }

    /// Availability badge for listings.
    #[must_use]
    pub fn availability(&self) -> StockLevel {
        match self.total_stock() {
            0 => StockLevel::OutOfStock,
            n if n <= LOW_STOCK_THRESHOLD => StockLevel::Low(n),
            _ => StockLevel::InStock,
        }
    }
}

/// Identity of a cart line: product plus size variant.
///
/// Sizes compare by value, and `None == None` (sizeless products).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineKey {
    pub product_id: ProductId,
    pub size: Option<String>,
}

impl LineKey {
    #[must_use]
    pub fn new(product_id: impl Into<ProductId>, size: Option<&str>) -> Self {
        Self {
            product_id: product_id.into(),
            size: size.map(str::to_owned),
        }
    }
}

impl std::fmt::Display for LineKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.size {
            Some(size) => write!(f, "{} (size {size})", self.product_id),
            None => write!(f, "{}", self.product_id),
        }
    }
}

/// One cart entry with a hard upper bound on its quantity.
///
/// `price` and `max_stock` are snapshots taken when the line was added or
/// last synced; the backend stays the final authority on both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub size: Option<String>,
    pub name: String,
    pub price: Money,
    pub image: String,
    pub qty: u32,
    pub max_stock: u32,
}

impl LineItem {
    /// Build a fresh line (quantity 1) from a product and the selected size.
    ///
    /// For sized products `max_stock` is the selected size's stock; for
    /// sizeless products it is the flat stock and any selected size is
    /// ignored. Zero stock is not an error here: callers refuse
    /// out-of-stock adds before dispatching.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError`] if a sized product has no size selected or
    /// the selected size is not listed.
    pub fn from_selection(
        product: &ProductSnapshot,
        size: Option<&str>,
    ) -> Result<Self, SelectionError> {
        let (size, max_stock) = if product.has_sizes() {
            let size = size
                .filter(|s| !s.is_empty())
                .ok_or_else(|| SelectionError::SizeRequired {
                    product: product.name.clone(),
                })?;
            let stock = product
                .stock_for(size)
                .ok_or_else(|| SelectionError::UnknownSize {
                    product: product.name.clone(),
                    size: size.to_owned(),
                })?;
            (Some(size.to_owned()), stock)
        } else {
            (None, clamp_stock(product.stock))
        };

        Ok(Self {
            product_id: product.id.clone(),
            size,
            name: product.name.clone(),
            price: product.price,
            image: product.image.clone(),
            qty: 1,
            max_stock,
        })
    }

    /// Build a line from a server cart entry and its embedded product.
    ///
    /// `max_stock` comes from the embedded product's size list; when no size
    /// record matches it is 0, which freezes the line at its current
    /// quantity (it can still be removed).
    #[must_use]
    pub fn from_server(product: &ProductSnapshot, size: Option<String>, qty: u32) -> Self {
        let max_stock = size
            .as_deref()
            .and_then(|s| product.stock_for(s))
            .unwrap_or(0);

        Self {
            product_id: product.id.clone(),
            size,
            name: product.name.clone(),
            price: product.price,
            image: product.image.clone(),
            qty,
            max_stock,
        }
    }

    /// Identity key of this line.
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey {
            product_id: self.product_id.clone(),
            size: self.size.clone(),
        }
    }

    /// Whether this line has the given identity.
    #[must_use]
    pub fn matches(&self, key: &LineKey) -> bool {
        self.product_id == key.product_id && self.size == key.size
    }

    /// Price of the whole line.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.price.times(self.qty)
    }
}
