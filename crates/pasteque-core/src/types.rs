//! # Domain Types
//!
//! Record types pulled from the Pasteque server during a sync cycle.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Category     │   │    Product      │   │      User       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │◄──│  category_id    │   │  id             │       │
//! │  │  parent_id?     │   │  label, price   │   │  name           │       │
//! │  │  subcategories  │   │  tax            │   │  permissions    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Customer     │   │      Cash       │   │  Floor / Place  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  Stock          │   │  Composition    │   │  TariffArea     │       │
//! │  │  (by product)   │   │  (by product)   │   │  prices         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! Every type deserializes directly from the JSON the server API scripts
//! return, so field names follow the server (`parent_id`, `hasImage`,
//! `dispName`, ...). Optional fields default when absent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Category
// =============================================================================

/// A product category, possibly nested under a parent category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier.
    pub id: String,

    /// Display label.
    pub label: String,

    /// Parent category id. `None` for root categories.
    #[serde(default)]
    pub parent_id: Option<String>,

    /// Whether the server holds an image for this category.
    #[serde(default, rename = "hasImage")]
    pub has_image: bool,

    /// Ordering hint for display.
    #[serde(default, rename = "dispOrder")]
    pub display_order: i32,

    /// Child categories, filled in by the tree builder.
    #[serde(default)]
    pub subcategories: Vec<Category>,
}

impl Category {
    /// Creates a category without children.
    pub fn new(id: impl Into<String>, label: impl Into<String>, parent_id: Option<String>) -> Self {
        Category {
            id: id.into(),
            label: label.into(),
            parent_id,
            has_image: false,
            display_order: 0,
            subcategories: Vec::new(),
        }
    }

    /// Appends a child category.
    pub fn add_subcategory(&mut self, category: Category) {
        self.subcategories.push(category);
    }

    /// Number of nodes in this subtree, the category itself included.
    pub fn node_count(&self) -> usize {
        1 + self
            .subcategories
            .iter()
            .map(Category::node_count)
            .sum::<usize>()
    }
}

// =============================================================================
// Product
// =============================================================================

/// Tax applied to a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tax {
    pub id: String,
    /// Rate as a fraction (0.2 = 20%).
    pub rate: f64,
}

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier.
    pub id: String,

    /// Display name shown to cashier and on receipt.
    pub label: String,

    /// Barcode (EAN-13, UPC-A, etc.).
    #[serde(default)]
    pub barcode: Option<String>,

    /// Sell price, tax excluded.
    #[serde(rename = "price_sell")]
    pub price_sell: f64,

    #[serde(default)]
    pub tax: Option<Tax>,

    /// Sold by weight.
    #[serde(default)]
    pub scaled: bool,

    #[serde(default, rename = "hasImage")]
    pub has_image: bool,

    /// Id of the category the product belongs to.
    ///
    /// The server nests it as `"category": { "id": ... }`.
    #[serde(rename = "category", with = "category_ref")]
    pub category_id: String,
}

impl Product {
    /// Returns the sell price in cents, rounded half away from zero.
    pub fn price_cents(&self) -> i64 {
        (self.price_sell * 100.0).round() as i64
    }
}

mod category_ref {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    struct CategoryRef {
        id: String,
    }

    #[derive(Serialize)]
    struct CategoryRefOut<'a> {
        id: &'a str,
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        CategoryRef::deserialize(deserializer).map(|r| r.id)
    }

    pub fn serialize<S>(id: &str, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        CategoryRefOut { id }.serialize(serializer)
    }
}

// =============================================================================
// User & Customer
// =============================================================================

/// A cashier account allowed on this register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    /// Hashed password, absent for password-less accounts.
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub permissions: Option<String>,
}

/// A registered customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    #[serde(rename = "dispName")]
    pub display_name: String,
    #[serde(default)]
    pub card: Option<String>,
    /// Prepaid balance.
    #[serde(default)]
    pub prepaid: f64,
    #[serde(default, rename = "maxDebt")]
    pub max_debt: f64,
    #[serde(default, rename = "currDebt")]
    pub current_debt: f64,
}

// =============================================================================
// Cash Session
// =============================================================================

/// The cash register session of this machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cash {
    /// Session id, `None` when the server has not assigned one yet.
    #[serde(default)]
    pub id: Option<String>,

    /// Machine name the session belongs to.
    pub host: String,

    #[serde(default, rename = "openDate", with = "chrono::serde::ts_seconds_option")]
    pub open_date: Option<DateTime<Utc>>,

    #[serde(default, rename = "closeDate", with = "chrono::serde::ts_seconds_option")]
    pub close_date: Option<DateTime<Utc>>,
}

impl Cash {
    /// Returns true once the session has been opened.
    pub fn is_opened(&self) -> bool {
        self.open_date.is_some()
    }

    /// Returns true once the session has been closed.
    pub fn is_closed(&self) -> bool {
        self.close_date.is_some()
    }
}

// =============================================================================
// Floors (restaurant mode)
// =============================================================================

/// A table on a floor plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
}

/// A floor plan with its tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Floor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub places: Vec<Place>,
}

// =============================================================================
// Stock & Composition (keyed by product)
// =============================================================================

/// Stock level of one product at the configured location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    #[serde(rename = "productId")]
    pub product_id: String,
    pub quantity: f64,
    /// Alert threshold.
    #[serde(default)]
    pub security: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

/// A choice group inside a composed product (menu).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionGroup {
    pub id: String,
    pub label: String,
    #[serde(default, rename = "dispOrder")]
    pub display_order: i32,
    /// Product ids the customer can pick from.
    #[serde(default)]
    pub choices: Vec<String>,
}

/// Composition of a composed product. The server keys it by product id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    #[serde(rename = "id")]
    pub product_id: String,
    #[serde(default)]
    pub groups: Vec<CompositionGroup>,
}

// =============================================================================
// Tariff Areas
// =============================================================================

/// Price override for one product inside a tariff area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TariffPrice {
    #[serde(rename = "productId")]
    pub product_id: String,
    pub price: f64,
}

/// A named price list (e.g. "Terrace", "Take away").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TariffArea {
    pub id: String,
    pub label: String,
    #[serde(default, rename = "dispOrder")]
    pub display_order: i32,
    #[serde(default)]
    pub prices: Vec<TariffPrice>,
}

impl TariffArea {
    /// Returns the overridden price of a product, if this area has one.
    pub fn price_for(&self, product_id: &str) -> Option<f64> {
        self.prices
            .iter()
            .find(|p| p.product_id == product_id)
            .map(|p| p.price)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_category_from_json() {
        let root: Category =
            serde_json::from_value(json!({"id": "1", "label": "Drinks", "parent_id": null}))
                .unwrap();
        assert!(root.parent_id.is_none());
        assert!(root.subcategories.is_empty());

        let child: Category = serde_json::from_value(
            json!({"id": "2", "label": "Sodas", "parent_id": "1", "hasImage": true}),
        )
        .unwrap();
        assert_eq!(child.parent_id.as_deref(), Some("1"));
        assert!(child.has_image);
    }

    #[test]
    fn test_node_count() {
        let mut root = Category::new("1", "Drinks", None);
        let mut sodas = Category::new("2", "Sodas", Some("1".into()));
        sodas.add_subcategory(Category::new("3", "Colas", Some("2".into())));
        root.add_subcategory(sodas);
        root.add_subcategory(Category::new("4", "Juices", Some("1".into())));
        assert_eq!(root.node_count(), 4);
    }

    #[test]
    fn test_product_reads_nested_category_id() {
        let product: Product = serde_json::from_value(json!({
            "id": "p1",
            "label": "Cola",
            "price_sell": 2.5,
            "tax": {"id": "t1", "rate": 0.055},
            "category": {"id": "c1", "label": "Drinks"}
        }))
        .unwrap();
        assert_eq!(product.category_id, "c1");
        assert_eq!(product.price_cents(), 250);
        assert_eq!(product.tax.as_ref().map(|t| t.rate), Some(0.055));
        assert!(!product.scaled);
    }

    #[test]
    fn test_product_round_trips_category_shape() {
        let product: Product = serde_json::from_value(json!({
            "id": "p1", "label": "Cola", "price_sell": 1.0, "category": {"id": "c1"}
        }))
        .unwrap();
        let value = serde_json::to_value(&product).unwrap();
        assert_eq!(value["category"]["id"], "c1");
    }

    #[test]
    fn test_cash_dates() {
        let cash: Cash = serde_json::from_value(json!({
            "id": "42", "host": "Register 1", "openDate": 1_700_000_000, "closeDate": null
        }))
        .unwrap();
        assert!(cash.is_opened());
        assert!(!cash.is_closed());
        assert_eq!(cash.open_date.unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_tariff_price_lookup() {
        let area = TariffArea {
            id: "a1".into(),
            label: "Terrace".into(),
            display_order: 0,
            prices: vec![TariffPrice {
                product_id: "p1".into(),
                price: 3.0,
            }],
        };
        assert_eq!(area.price_for("p1"), Some(3.0));
        assert_eq!(area.price_for("p2"), None);
    }
}
