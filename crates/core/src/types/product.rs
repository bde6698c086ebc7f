//! Catalog product type.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{Price, ProductId};

/// Aggregate product rating, an integer out of five.
pub type Rating = u8;

/// An immutable, cheaply cloneable list of products.
///
/// Cart lines resolved against a list share its `Arc<Product>` entries.
pub type ProductList = Arc<[Arc<Product>]>;

/// Build a [`ProductList`] from owned products, keeping their order.
#[must_use]
pub fn product_list(products: Vec<Product>) -> ProductList {
    products.into_iter().map(Arc::new).collect()
}

/// A product available to buy.
///
/// Field names follow the storefront API wire format:
///
/// ```json
/// {
///     "name": "iPhone XR",
///     "category": "Phones",
///     "cost": 100,
///     "rating": 4,
///     "image": "https://i.imgur.com/lulqWzW.jpg",
///     "_id": "v4sLtEcMpzabRyfx"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique product ID.
    #[serde(rename = "_id")]
    pub id: ProductId,
    /// Name or title of the product.
    pub name: String,
    /// Category the product belongs to.
    pub category: String,
    /// Unit price.
    pub cost: Price,
    /// Aggregate rating (0-5).
    pub rating: Rating,
    /// URL of the product image.
    #[serde(rename = "image")]
    pub image_url: String,
}

impl Product {
    /// Highest rating the storefront reports.
    pub const MAX_RATING: Rating = 5;

    /// Rating clamped to the 0-5 range.
    #[must_use]
    pub fn rating(&self) -> Rating {
        self.rating.min(Self::MAX_RATING)
    }
}
