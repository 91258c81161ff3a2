//! Product records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// Category label stored when a product is saved without one and no
/// categories exist yet.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// A product as read back from the record store.
///
/// `category` holds a category *name*, not an ID. Deleting the category it
/// names leaves the text in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Store-assigned identifier, immutable once assigned.
    pub id: ProductId,
    pub name: String,
    /// Price in whole currency units (rupees).
    pub price: f64,
    pub category: String,
    pub description: String,
    /// Image link as entered, usually a shared-drive URL.
    pub image: String,
    pub stock: u32,
    /// Set once by the store on creation. Older documents may lack it.
    pub created_at: Option<DateTime<Utc>>,
    /// Refreshed by the store on every write.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// The writable part of this product.
    #[must_use]
    pub fn fields(&self) -> ProductFields {
        ProductFields {
            name: self.name.clone(),
            price: self.price,
            category: self.category.clone(),
            description: self.description.clone(),
            image: self.image.clone(),
            stock: self.stock,
        }
    }
}

/// Validated product write payload.
///
/// Timestamps are deliberately absent: the store assigns them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductFields {
    pub name: String,
    pub price: f64,
    pub category: String,
    pub description: String,
    pub image: String,
    pub stock: u32,
}
