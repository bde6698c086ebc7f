//! Cart entry types.
//!
//! The backend stores a cart as a list of `(productId, qty)` pairs. The
//! client joins those pairs with its catalog to get [`CartLineItem`]s.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{Price, Product, ProductId};

/// A cart line as reported by the cart endpoint.
///
/// ```json
/// { "productId": "KCRwjF7lN97HnEaY", "qty": 3 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCartEntry {
    /// Product this line refers to.
    pub product_id: ProductId,
    /// Quantity in the cart.
    pub qty: u32,
}

impl RawCartEntry {
    /// Create a new raw cart entry.
    #[must_use]
    pub fn new(product_id: impl Into<ProductId>, qty: u32) -> Self {
        Self {
            product_id: product_id.into(),
            qty,
        }
    }
}

/// A cart line enriched with its catalog product.
///
/// The product is shared with the catalog snapshot it was resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLineItem {
    /// Catalog product.
    pub product: Arc<Product>,
    /// Quantity in the cart.
    pub qty: u32,
}

impl CartLineItem {
    /// Product ID of this line.
    #[must_use]
    pub fn product_id(&self) -> &ProductId {
        &self.product.id
    }

    /// Cost of this line (`cost * qty`).
    #[must_use]
    pub fn line_cost(&self) -> Price {
        self.product.cost.times(self.qty)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_entry_wire_format() {
        let entries: Vec<RawCartEntry> = serde_json::from_str(
            r#"[{"productId":"KCRwjF7lN97HnEaY","qty":3},{"productId":"BW0jAAeDJmlZCF8i","qty":1}]"#,
        )
        .unwrap();

        assert_eq!(
            entries,
            vec![
                RawCartEntry::new("KCRwjF7lN97HnEaY", 3),
                RawCartEntry::new("BW0jAAeDJmlZCF8i", 1),
            ]
        );

        let json = serde_json::to_value(RawCartEntry::new("p1", 0)).unwrap();
        assert_eq!(json, serde_json::json!({"productId": "p1", "qty": 0}));
    }

    #[test]
    fn test_line_cost() {
        let item = CartLineItem {
            product: Arc::new(Product {
                id: ProductId::new("p1"),
                name: "Ball".to_string(),
                category: "Sports".to_string(),
                cost: Price::from(100),
                rating: 4,
                image_url: String::new(),
            }),
            qty: 3,
        };

        assert_eq!(item.line_cost(), Price::from(300));
        assert_eq!(item.product_id(), &ProductId::new("p1"));
    }
}
