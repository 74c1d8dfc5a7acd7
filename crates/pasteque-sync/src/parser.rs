//! # Resource Parsers
//!
//! One parser per kind. A parser never fails: a malformed payload is logged
//! and contributes an empty value, so the cycle can still succeed.
//!
//! ## Error Marker
//! ```text
//! {"error": "Not logged in"}   ──► SyncError("Not logged in")
//! {"error": {"code": 12}}      ──► SyncError("{\"code\":12}")
//! [ ... ] / {"id": ...}        ──► no marker, hand to the kind parser
//! ```

use std::collections::HashMap;

use pasteque_core::{
    build_forest, forest_size, Cash, Catalog, Category, Composition, Customer, Floor, Product,
    Stock, TariffArea, User,
};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::endpoint::ResourceKind;
use crate::events::{KindPayload, SyncData};

// =============================================================================
// Error Marker
// =============================================================================

/// Returns the server-reported error message, if the body carries one.
pub fn server_error(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let marker = value.as_object()?.get("error")?;
    Some(match marker {
        serde_json::Value::String(message) => message.clone(),
        other => other.to_string(),
    })
}

/// Decodes a whole payload, or logs and returns `None`.
fn decode<T: DeserializeOwned>(kind: ResourceKind, body: &str) -> Option<T> {
    match serde_json::from_str(body) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(kind = %kind, error = %e, "Unable to parse response");
            debug!(kind = %kind, body = %body, "Rejected payload");
            None
        }
    }
}

fn decode_list<T: DeserializeOwned>(kind: ResourceKind, body: &str) -> Vec<T> {
    decode(kind, body).unwrap_or_default()
}

// =============================================================================
// Kind Parsers
// =============================================================================

/// Decodes categories and rebuilds their tree. Returns the root categories.
pub fn parse_categories(body: &str) -> Vec<Category> {
    let records: Vec<Category> = decode_list(ResourceKind::Categories, body);
    let total = records.len();

    match build_forest(records) {
        Ok(roots) => {
            let placed = forest_size(&roots);
            if placed < total {
                warn!(
                    dropped = total - placed,
                    "Categories with an unknown parent were left out of the tree"
                );
            }
            roots
        }
        Err(e) => {
            warn!(kind = %ResourceKind::Categories, error = %e, "Unable to build category tree");
            Vec::new()
        }
    }
}

/// Decodes products and attaches each one to its root category.
///
/// Returns the number of products attached.
pub fn parse_products(body: &str, catalog: &mut Catalog) -> usize {
    let products: Vec<Product> = decode_list(ResourceKind::Products, body);
    let total = products.len();

    let mut attached = 0;
    for product in products {
        let id = product.id.clone();
        let category_id = product.category_id.clone();
        if catalog.attach_product(product) {
            attached += 1;
        } else {
            debug!(product = %id, category = %category_id, "No root category for product");
        }
    }

    if attached < total {
        warn!(
            dropped = total - attached,
            "Products outside root categories were left out of the catalog"
        );
    }
    attached
}

pub fn parse_users(body: &str) -> Vec<User> {
    decode_list(ResourceKind::Users, body)
}

pub fn parse_customers(body: &str) -> Vec<Customer> {
    decode_list(ResourceKind::Customers, body)
}

/// The server answers `null` when the machine has no cash session yet.
pub fn parse_cash(body: &str) -> Option<Cash> {
    decode::<Option<Cash>>(ResourceKind::Cash, body).flatten()
}

pub fn parse_floors(body: &str) -> Vec<Floor> {
    decode_list(ResourceKind::Floors, body)
}

/// Stock levels keyed by product id. A later record wins over an earlier one.
pub fn parse_stocks(body: &str) -> HashMap<String, Stock> {
    decode_list::<Stock>(ResourceKind::Stocks, body)
        .into_iter()
        .map(|stock| (stock.product_id.clone(), stock))
        .collect()
}

/// Compositions keyed by product id. A later record wins over an earlier one.
pub fn parse_compositions(body: &str) -> HashMap<String, Composition> {
    decode_list::<Composition>(ResourceKind::Compositions, body)
        .into_iter()
        .map(|composition| (composition.product_id.clone(), composition))
        .collect()
}

pub fn parse_tariff_areas(body: &str) -> Vec<TariffArea> {
    decode_list(ResourceKind::TariffAreas, body)
}

// =============================================================================
// Dispatch
// =============================================================================

/// Parses `body` as `kind`, merges it into `data`, and returns the payload
/// to announce.
pub fn merge(kind: ResourceKind, body: &str, data: &mut SyncData) -> KindPayload {
    match kind {
        ResourceKind::Categories => {
            let roots = parse_categories(body);
            for root in &roots {
                data.catalog.add_root_category(root.clone());
            }
            KindPayload::Categories(roots)
        }
        ResourceKind::Products => {
            parse_products(body, &mut data.catalog);
            KindPayload::Catalog(data.catalog.clone())
        }
        ResourceKind::Users => {
            data.users = parse_users(body);
            KindPayload::Users(data.users.clone())
        }
        ResourceKind::Customers => {
            data.customers = parse_customers(body);
            KindPayload::Customers(data.customers.clone())
        }
        ResourceKind::Cash => {
            data.cash = parse_cash(body);
            KindPayload::Cash(data.cash.clone())
        }
        ResourceKind::Floors => {
            data.floors = parse_floors(body);
            KindPayload::Floors(data.floors.clone())
        }
        ResourceKind::Stocks => {
            data.stocks = parse_stocks(body);
            KindPayload::Stocks(data.stocks.clone())
        }
        ResourceKind::Compositions => {
            data.compositions = parse_compositions(body);
            KindPayload::Compositions(data.compositions.clone())
        }
        ResourceKind::TariffAreas => {
            data.tariff_areas = parse_tariff_areas(body);
            KindPayload::TariffAreas(data.tariff_areas.clone())
        }
    }
}
