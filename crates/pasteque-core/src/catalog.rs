//! # Catalog
//!
//! The category forest plus the products attached to its categories.
//!
//! ## Product Attachment
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Root-Only Product Attachment                         │
//! │                                                                         │
//! │  roots: [Drinks(1), Food(5)]                                           │
//! │            └── Sodas(2)                                                 │
//! │                                                                         │
//! │  product { category: "1" }  ──► attached to Drinks                     │
//! │  product { category: "5" }  ──► attached to Food                       │
//! │  product { category: "2" }  ──► DROPPED (Sodas is not a root)          │
//! │  product { category: "9" }  ──► DROPPED (unknown)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Matching scans the root list only. Products filed under a subcategory are
//! not found and are left out of the catalog; registers rely on this
//! behaviour, so it is kept as is.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::tree::forest_size;
use crate::types::{Category, Product};

/// Catalog under construction during one sync cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Root categories in server order, each carrying its subtree.
    root_categories: Vec<Category>,

    /// Products by the id of the category they are attached to.
    products: HashMap<String, Vec<Product>>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a finished root category branch.
    pub fn add_root_category(&mut self, category: Category) {
        self.root_categories.push(category);
    }

    /// Root categories in insertion order.
    pub fn root_categories(&self) -> &[Category] {
        &self.root_categories
    }

    /// Finds a root category by id. Subcategories are not searched.
    pub fn find_root(&self, id: &str) -> Option<&Category> {
        self.root_categories.iter().find(|c| c.id == id)
    }

    /// Attaches a product to the root category named by its `category_id`.
    ///
    /// Returns false, and drops the product, when no root carries that id.
    pub fn attach_product(&mut self, product: Product) -> bool {
        let Some(root) = self
            .root_categories
            .iter()
            .find(|c| c.id == product.category_id)
        else {
            return false;
        };

        self.products
            .entry(root.id.clone())
            .or_default()
            .push(product);
        true
    }

    /// Products attached to a category, in attachment order.
    pub fn products_in(&self, category_id: &str) -> &[Product] {
        self.products
            .get(category_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total number of attached products.
    pub fn product_count(&self) -> usize {
        self.products.values().map(Vec::len).sum()
    }

    /// Total number of categories, subcategories included.
    pub fn category_count(&self) -> usize {
        forest_size(&self.root_categories)
    }

    pub fn is_empty(&self) -> bool {
        self.root_categories.is_empty() && self.products.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, category_id: &str) -> Product {
        Product {
            id: id.into(),
            label: format!("Product {id}"),
            barcode: None,
            price_sell: 1.0,
            tax: None,
            scaled: false,
            has_image: false,
            category_id: category_id.into(),
        }
    }

    fn catalog() -> Catalog {
        let mut drinks = Category::new("1", "Drinks", None);
        drinks.add_subcategory(Category::new("2", "Sodas", Some("1".into())));
        let mut catalog = Catalog::new();
        catalog.add_root_category(drinks);
        catalog.add_root_category(Category::new("5", "Food", None));
        catalog
    }

    #[test]
    fn test_product_attaches_to_root() {
        let mut catalog = catalog();
        assert!(catalog.attach_product(product("p1", "1")));
        assert!(catalog.attach_product(product("p2", "5")));
        assert_eq!(catalog.products_in("1").len(), 1);
        assert_eq!(catalog.products_in("5")[0].id, "p2");
        assert_eq!(catalog.product_count(), 2);
    }

    #[test]
    fn test_product_under_subcategory_is_dropped() {
        let mut catalog = catalog();
        assert!(!catalog.attach_product(product("p1", "2")));
        assert!(catalog.products_in("2").is_empty());
        assert_eq!(catalog.product_count(), 0);
    }

    #[test]
    fn test_product_with_unknown_category_is_dropped() {
        let mut catalog = catalog();
        assert!(!catalog.attach_product(product("p1", "42")));
        assert_eq!(catalog.product_count(), 0);
    }

    #[test]
    fn test_counts_and_lookup() {
        let catalog = catalog();
        assert_eq!(catalog.root_categories().len(), 2);
        assert_eq!(catalog.category_count(), 3);
        assert!(catalog.find_root("1").is_some());
        assert!(catalog.find_root("2").is_none());
        assert!(!catalog.is_empty());
        assert!(Catalog::new().is_empty());
    }

    #[test]
    fn test_serde_round_trip_keeps_subtrees() {
        let mut catalog = catalog();
        catalog.attach_product(product("p1", "1"));

        let json = serde_json::to_string(&catalog).unwrap();
        let restored: Catalog = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, catalog);
        assert_eq!(restored.category_count(), 3);
        assert_eq!(restored.find_root("1").unwrap().subcategories[0].id, "2");
    }
}
