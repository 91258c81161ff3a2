//! Inventory view: search filter and display models for the product table.

use trident_core::{PLACEHOLDER_IMAGE_URL, Product, normalize_drive_link};

use crate::forms::{ProductDraft, parse_price};

/// Products whose name or category contains `query`, ignoring case, in
/// their original order. An empty query matches everything.
#[must_use]
pub fn filter<'a>(products: &'a [Product], query: &str) -> Vec<&'a Product> {
    let needle = query.to_lowercase();
    products
        .iter()
        .filter(|p| {
            needle.is_empty()
                || p.name.to_lowercase().contains(&needle)
                || p.category.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Format an amount in rupees with thousands separators and up to three
/// decimal places, e.g. `₹1,299.5`.
#[must_use]
pub fn format_price(amount: f64) -> String {
    if !amount.is_finite() {
        return "₹0".to_string();
    }

    let fixed = format!("{:.3}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && (grouped != "0" || !frac_part.is_empty()) {
        "-"
    } else {
        ""
    };
    if frac_part.is_empty() {
        format!("{sign}₹{grouped}")
    } else {
        format!("{sign}₹{grouped}.{frac_part}")
    }
}

/// Product row as rendered in the table. Templates run `price` through
/// `rupees` and `image` through `drive_image`.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub image: String,
    pub stock: u32,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            category: product.category.clone(),
            price: product.price,
            image: product.image.clone(),
            stock: product.stock,
        }
    }
}

/// The filtered table plus the counts shown above it.
#[derive(Debug, Clone)]
pub struct InventoryView {
    pub rows: Vec<ProductView>,
    /// Every product in the store, ignoring the filter.
    pub total: usize,
    pub query: String,
}

impl InventoryView {
    #[must_use]
    pub fn new(products: &[Product], query: &str) -> Self {
        Self {
            rows: filter(products, query)
                .into_iter()
                .map(ProductView::from)
                .collect(),
            total: products.len(),
            query: query.to_string(),
        }
    }

    /// Whether to show the "no products found" row.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Live preview of the product form.
#[derive(Debug, Clone)]
pub struct DraftPreview {
    /// `None` until an image link has been entered.
    pub image_url: Option<String>,
    pub name: String,
    pub category: String,
    pub price: f64,
}

impl From<&ProductDraft> for DraftPreview {
    fn from(draft: &ProductDraft) -> Self {
        let image = draft.image.trim();
        Self {
            image_url: (!image.is_empty()).then(|| normalize_drive_link(image)),
            name: if draft.name.trim().is_empty() {
                "Product Title".to_string()
            } else {
                draft.name.clone()
            },
            category: if draft.category.trim().is_empty() {
                "Category".to_string()
            } else {
                draft.category.clone()
            },
            price: parse_price(&draft.price),
        }
    }
}

/// Fallback image URL for `onerror` handlers.
#[must_use]
pub const fn placeholder_image() -> &'static str {
    PLACEHOLDER_IMAGE_URL
}

#[cfg(test)]
mod tests {
    use trident_core::ProductId;

    use super::*;

    fn product(id: &str, name: &str, category: &str) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            price: 100.0,
            category: category.to_string(),
            description: String::new(),
            image: String::new(),
            stock: 1,
            created_at: None,
            updated_at: None,
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            product("1", "LED Panel", "Lighting"),
            product("2", "Ceiling Fan", "Fans"),
            product("3", "Table Lamp", "lighting"),
            product("4", "Extension Board", "Electrical"),
        ]
    }

    fn ids(products: &[&Product]) -> Vec<String> {
        products.iter().map(|p| p.id.to_string()).collect()
    }

    #[test]
    fn test_empty_query_returns_everything() {
        let products = catalog();
        assert_eq!(ids(&filter(&products, "")), ["1", "2", "3", "4"]);
    }

    #[test]
    fn test_matches_name_or_category_ignoring_case() {
        let products = catalog();
        assert_eq!(ids(&filter(&products, "LIGHT")), ["1", "3"]);
        assert_eq!(ids(&filter(&products, "fan")), ["2"]);
        assert_eq!(ids(&filter(&products, "e")), ["1", "2", "3", "4"]);
        assert!(filter(&products, "zzz").is_empty());
    }

    #[test]
    fn test_filter_is_exact_subset_in_order() {
        let products = catalog();
        for query in ["", "a", "LE", "board", "ing", "x"] {
            let q = query.to_lowercase();
            let expected: Vec<String> = products
                .iter()
                .filter(|p| {
                    p.name.to_lowercase().contains(&q) || p.category.to_lowercase().contains(&q)
                })
                .map(|p| p.id.to_string())
                .collect();
            assert_eq!(ids(&filter(&products, query)), expected, "query {query:?}");
        }
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(0.0), "₹0");
        assert_eq!(format_price(19.99), "₹19.99");
        assert_eq!(format_price(1299.5), "₹1,299.5");
        assert_eq!(format_price(1_234_567.0), "₹1,234,567");
        assert_eq!(format_price(999.0), "₹999");
        assert_eq!(format_price(0.123_456), "₹0.123");
        assert_eq!(format_price(f64::NAN), "₹0");
    }

    #[test]
    fn test_inventory_view_counts_all_products() {
        let products = catalog();
        let view = InventoryView::new(&products, "fan");
        assert_eq!(view.total, 4);
        assert_eq!(view.rows.len(), 1);
        assert!(!view.is_empty());
        assert!(InventoryView::new(&products, "nothing").is_empty());
    }

    #[test]
    fn test_preview_defaults() {
        let preview = DraftPreview::from(&ProductDraft::default());
        assert_eq!(preview.image_url, None);
        assert_eq!(preview.name, "Product Title");
        assert_eq!(preview.category, "Category");
        assert!(preview.price.abs() < f64::EPSILON);

        let draft = ProductDraft {
            name: "Lamp".to_string(),
            price: "2500".to_string(),
            image: "https://drive.google.com/open?id=XYZ".to_string(),
            ..ProductDraft::default()
        };
        let preview = DraftPreview::from(&draft);
        assert_eq!(
            preview.image_url.as_deref(),
            Some("https://lh3.googleusercontent.com/d/XYZ")
        );
        assert_eq!(format_price(preview.price), "₹2,500");
    }
}
