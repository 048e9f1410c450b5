//! Cart state: an ordered, duplicate-free sequence of line items.

use serde::{Deserialize, Serialize};

use super::line_item::{LineItem, LineKey};
use crate::types::Money;

/// The whole cart.
///
/// Insertion order is preserved and no two lines share a [`LineKey`].
/// Only the reducer produces new states; everything else reads.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CartState {
    items: Vec<LineItem>,
}

impl CartState {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a state from externally supplied lines.
    ///
    /// Only well-formedness is enforced: lines with a zero quantity are
    /// dropped and the first occurrence of a duplicated key wins. Quantities
    /// above `max_stock` are kept as-is.
    #[must_use]
    pub fn from_items(items: Vec<LineItem>) -> Self {
        let mut kept: Vec<LineItem> = Vec::with_capacity(items.len());
        for item in items {
            if item.qty == 0 || kept.iter().any(|k| k.matches(&item.key())) {
                continue;
            }
            kept.push(item);
        }
        Self { items: kept }
    }

    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Find the line with the given identity.
    #[must_use]
    pub fn find(&self, key: &LineKey) -> Option<&LineItem> {
        self.items.iter().find(|item| item.matches(key))
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.qty)).sum()
    }

    /// Sum of `qty × price` over all lines.
    #[must_use]
    pub fn total_price(&self) -> Money {
        self.items.iter().map(LineItem::line_total).sum()
    }

    pub(super) fn position(&self, key: &LineKey) -> Option<usize> {
        self.items.iter().position(|item| item.matches(key))
    }

    pub(super) fn items_mut(&mut self) -> &mut Vec<LineItem> {
        &mut self.items
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::ProductId;

    fn line(id: &str, size: Option<&str>, qty: u32, price: u32) -> LineItem {
        LineItem {
            product_id: ProductId::new(id),
            size: size.map(str::to_owned),
            name: id.to_uppercase(),
            price: Money::from_whole(price),
            image: String::new(),
            qty,
            max_stock: 10,
        }
    }

    #[test]
    fn test_from_items_drops_zero_quantity() {
        let state = CartState::from_items(vec![line("a", None, 0, 10), line("b", None, 1, 10)]);
        assert_eq!(state.len(), 1);
        assert_eq!(state.items()[0].product_id.as_str(), "b");
    }

    #[test]
    fn test_from_items_keeps_first_duplicate() {
        let state = CartState::from_items(vec![
            line("a", Some("9"), 2, 10),
            line("a", Some("9"), 5, 10),
            line("a", Some("10"), 1, 10),
        ]);
        assert_eq!(state.len(), 2);
        assert_eq!(state.find(&LineKey::new("a", Some("9"))).unwrap().qty, 2);
    }

    #[test]
    fn test_from_items_tolerates_quantity_over_stock() {
        let mut over = line("a", None, 4, 10);
        over.max_stock = 0;
        let state = CartState::from_items(vec![over]);
        assert_eq!(state.items()[0].qty, 4);
    }

    #[test]
    fn test_totals() {
        let state = CartState::from_items(vec![line("a", None, 2, 150), line("b", None, 1, 200)]);
        assert_eq!(state.total_items(), 3);
        assert_eq!(state.total_price(), Money::from_whole(500));
        assert_eq!(CartState::new().total_price(), Money::ZERO);
    }
}
