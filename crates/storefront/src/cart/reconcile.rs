//! Joining backend cart entries with the catalog.
//!
//! Cart entries and the catalog are fetched independently and in no
//! guaranteed order, so the catalog may be stale or still empty when a cart
//! arrives. Entries whose product cannot be resolved are skipped.

use std::collections::HashMap;
use std::sync::Arc;

use qkart_core::{CartLineItem, Price, Product, RawCartEntry};
use tracing::debug;

/// Resolve cart entries against a catalog.
///
/// Output order follows `entries`. Entries with no matching product are
/// dropped; if the catalog lists an ID twice the first product wins.
#[must_use]
pub fn reconcile(entries: &[RawCartEntry], catalog: &[Arc<Product>]) -> Vec<CartLineItem> {
    if entries.is_empty() || catalog.is_empty() {
        return Vec::new();
    }

    let mut index: HashMap<&str, &Arc<Product>> = HashMap::with_capacity(catalog.len());
    for product in catalog {
        index.entry(product.id.as_str()).or_insert(product);
    }

    entries
        .iter()
        .filter_map(|entry| match index.get(entry.product_id.as_str()) {
            Some(product) => Some(CartLineItem {
                product: Arc::clone(product),
                qty: entry.qty,
            }),
            None => {
                debug!(product_id = %entry.product_id, "Cart entry has no catalog product");
                None
            }
        })
        .collect()
}

/// Total cost of the given lines.
#[must_use]
pub fn total_cost(items: &[CartLineItem]) -> Price {
    items.iter().map(CartLineItem::line_cost).sum()
}

/// Total number of units across the given lines.
#[must_use]
pub fn item_count(items: &[CartLineItem]) -> u32 {
    items.iter().map(|item| item.qty).fold(0, u32::saturating_add)
}

/// Whether a line for `product_id` is present.
#[must_use]
pub fn contains(items: &[CartLineItem], product_id: &str) -> bool {
    items.iter().any(|item| item.product.id == product_id)
}

#[cfg(test)]
mod tests {
    use qkart_core::{ProductId, product_list};

    use super::*;

    fn product(id: &str, cost: u32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            category: "Sports".to_string(),
            cost: Price::from(cost),
            rating: 4,
            image_url: format!("https://img.example.com/{id}.jpg"),
        }
    }

    fn ids(items: &[CartLineItem]) -> Vec<&str> {
        items.iter().map(|i| i.product.id.as_str()).collect()
    }

    #[test]
    fn test_single_entry_resolves() {
        let catalog = product_list(vec![Product {
            name: "Ball".to_string(),
            ..product("p1", 100)
        }]);
        let items = reconcile(&[RawCartEntry::new("p1", 2)], &catalog);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product.name, "Ball");
        assert_eq!(items[0].qty, 2);
        assert!(Arc::ptr_eq(&items[0].product, &catalog[0]));
    }

    #[test]
    fn test_empty_catalog_yields_nothing() {
        let items = reconcile(&[RawCartEntry::new("p9", 1)], &[]);
        assert!(items.is_empty());
    }

    #[test]
    fn test_empty_entries_yield_nothing() {
        let catalog = product_list(vec![product("p1", 1)]);
        assert!(reconcile(&[], &catalog).is_empty());
    }

    #[test]
    fn test_unknown_products_dropped_order_kept() {
        let catalog = product_list(vec![product("a", 1), product("b", 2), product("c", 3)]);
        let entries = [
            RawCartEntry::new("c", 1),
            RawCartEntry::new("gone", 5),
            RawCartEntry::new("a", 2),
            RawCartEntry::new("b", 0),
        ];

        let items = reconcile(&entries, &catalog);
        assert_eq!(ids(&items), vec!["c", "a", "b"]);
        assert!(items.len() < entries.len());
    }

    #[test]
    fn test_length_equal_when_all_resolve() {
        let catalog = product_list(vec![product("a", 1), product("b", 2)]);
        let entries = [RawCartEntry::new("b", 1), RawCartEntry::new("a", 1)];

        let items = reconcile(&entries, &catalog);
        assert_eq!(items.len(), entries.len());
        assert_eq!(ids(&items), vec!["b", "a"]);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let catalog = product_list(vec![product("a", 1), product("b", 2)]);
        let entries = [RawCartEntry::new("b", 3), RawCartEntry::new("x", 1)];

        assert_eq!(reconcile(&entries, &catalog), reconcile(&entries, &catalog));
    }

    #[test]
    fn test_duplicate_catalog_ids_first_wins() {
        let first = Product {
            name: "First".to_string(),
            ..product("dup", 1)
        };
        let second = Product {
            name: "Second".to_string(),
            ..product("dup", 2)
        };
        let catalog = product_list(vec![first, second]);

        let items = reconcile(&[RawCartEntry::new("dup", 1)], &catalog);
        assert_eq!(items[0].product.name, "First");
    }

    #[test]
    fn test_totals() {
        let catalog = product_list(vec![product("a", 100), product("b", 25)]);
        let items = reconcile(
            &[RawCartEntry::new("a", 2), RawCartEntry::new("b", 4)],
            &catalog,
        );

        assert_eq!(total_cost(&items), Price::from(300));
        assert_eq!(item_count(&items), 6);
        assert!(contains(&items, "a"));
        assert!(!contains(&items, "z"));
    }

    #[test]
    fn test_totals_of_empty_cart() {
        assert_eq!(total_cost(&[]), Price::ZERO);
        assert_eq!(item_count(&[]), 0);
    }
}
