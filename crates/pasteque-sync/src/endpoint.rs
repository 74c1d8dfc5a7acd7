//! # Resource Kinds and Endpoints
//!
//! The nine resource kinds a cycle pulls, their dependencies, and the URL
//! each one is fetched from.
//!
//! ## Endpoint Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Kind           Script                  Action      Extra parameter    │
//! │  ─────────────  ──────────────────────  ──────────  ─────────────────  │
//! │  categories     CategoriesAPI.php       getAll                         │
//! │  products       ProductsAPI.php         getAllFull  (after categories) │
//! │  users          UsersAPI.php            getAll                         │
//! │  customers      CustomersAPI.php        getAll                         │
//! │  cash           CashesAPI.php           get         host=<machine>     │
//! │  floors         PlacesAPI.php           getAll      (restaurant only)  │
//! │  stocks         StocksAPI.php           getAll      location=<loc>     │
//! │  compositions   CompositionsAPI.php     getAll      (after products)   │
//! │  tariff areas   TariffAreasAPI.php      getAll                         │
//! │                                                                         │
//! │  Every URL also carries login=<user>&password=<password>.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::SyncConfig;
use crate::error::SyncResult;

// =============================================================================
// Resource Kind
// =============================================================================

/// One category of remote resource fetched and parsed independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Categories,
    Products,
    Users,
    Customers,
    Cash,
    Floors,
    Stocks,
    Compositions,
    TariffAreas,
}

impl ResourceKind {
    /// Every kind, in launch order.
    pub const ALL: [ResourceKind; 9] = [
        ResourceKind::Categories,
        ResourceKind::Users,
        ResourceKind::Customers,
        ResourceKind::Cash,
        ResourceKind::TariffAreas,
        ResourceKind::Floors,
        ResourceKind::Stocks,
        ResourceKind::Products,
        ResourceKind::Compositions,
    ];

    /// Number of progress steps in every cycle.
    pub const TOTAL_STEPS: usize = Self::ALL.len();

    /// The kind that must finish parsing before this one may be fetched.
    pub fn prerequisite(&self) -> Option<ResourceKind> {
        match self {
            ResourceKind::Products => Some(ResourceKind::Categories),
            ResourceKind::Compositions => Some(ResourceKind::Products),
            _ => None,
        }
    }

    /// The kind unlocked once this one has been parsed.
    pub fn dependent(&self) -> Option<ResourceKind> {
        match self {
            ResourceKind::Categories => Some(ResourceKind::Products),
            ResourceKind::Products => Some(ResourceKind::Compositions),
            _ => None,
        }
    }

    /// Server script serving this kind.
    pub fn script(&self) -> &'static str {
        match self {
            ResourceKind::Categories => "CategoriesAPI.php",
            ResourceKind::Products => "ProductsAPI.php",
            ResourceKind::Users => "UsersAPI.php",
            ResourceKind::Customers => "CustomersAPI.php",
            ResourceKind::Cash => "CashesAPI.php",
            ResourceKind::Floors => "PlacesAPI.php",
            ResourceKind::Stocks => "StocksAPI.php",
            ResourceKind::Compositions => "CompositionsAPI.php",
            ResourceKind::TariffAreas => "TariffAreasAPI.php",
        }
    }

    /// Value of the `action` query parameter.
    pub fn action(&self) -> &'static str {
        match self {
            ResourceKind::Products => "getAllFull",
            ResourceKind::Cash => "get",
            _ => "getAll",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Categories => "categories",
            ResourceKind::Products => "products",
            ResourceKind::Users => "users",
            ResourceKind::Customers => "customers",
            ResourceKind::Cash => "cash",
            ResourceKind::Floors => "floors",
            ResourceKind::Stocks => "stocks",
            ResourceKind::Compositions => "compositions",
            ResourceKind::TariffAreas => "tariff_areas",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Endpoint Builder
// =============================================================================

/// Builds authenticated resource URLs against one server.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: Url,
    user: String,
    password: String,
    machine_name: String,
    stock_location: Option<String>,
}

impl Endpoints {
    /// Captures everything URL-building needs from a validated config.
    pub fn from_config(config: &SyncConfig) -> SyncResult<Self> {
        Ok(Endpoints {
            base: config.base_url()?,
            user: config.server.user.clone(),
            password: config.server.password.clone(),
            machine_name: config.machine_name().to_string(),
            stock_location: config.stock_location().map(str::to_string),
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// URL fetched for `kind`.
    pub fn url(&self, kind: ResourceKind) -> SyncResult<Url> {
        let mut url = self.base.join(kind.script())?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("action", kind.action());
            query.append_pair("login", &self.user);
            query.append_pair("password", &self.password);
            match kind {
                ResourceKind::Cash => {
                    query.append_pair("host", &self.machine_name);
                }
                ResourceKind::Stocks => {
                    if let Some(location) = &self.stock_location {
                        query.append_pair("location", location);
                    }
                }
                _ => {}
            }
        }
        Ok(url)
    }
}

/// Renders a URL for logs with the password parameter masked.
pub fn redacted(url: &Url) -> String {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if key == "password" {
                "***".to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();

    if pairs.is_empty() {
        return url.to_string();
    }

    let mut masked = url.clone();
    masked.query_pairs_mut().clear().extend_pairs(pairs);
    masked.to_string()
}
