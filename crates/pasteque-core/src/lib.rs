//! # pasteque-core: Pure Domain Model for the Pasteque POS Client
//!
//! This crate holds the data a register pulls from its Pasteque server and
//! the pure algorithms that assemble it. It has zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Pasteque POS Client Architecture                      │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/sync-cli (or a register UI)                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            pasteque-sync (HTTP fan-out, parsers)                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ decoded records                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ pasteque-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   tree    │  │  catalog  │  │   error   │  │   │
//! │  │   │  records  │  │  forest   │  │  products │  │ CoreError │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • PURE FUNCTIONS                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Record types (Category, Product, User, Cash, ...)
//! - [`tree`] - Category tree builder
//! - [`catalog`] - Catalog aggregate with root-only product attachment
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use pasteque_core::{build_forest, Catalog, Category};
//!
//! let forest = build_forest(vec![
//!     Category::new("1", "Drinks", None),
//!     Category::new("2", "Sodas", Some("1".to_string())),
//! ])
//! .unwrap();
//!
//! let mut catalog = Catalog::new();
//! for root in forest {
//!     catalog.add_root_category(root);
//! }
//! assert_eq!(catalog.category_count(), 2);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod error;
pub mod tree;
pub mod types;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use catalog::Catalog;
pub use error::{CoreError, CoreResult};
pub use tree::{build_forest, forest_size, ParentIndex};
pub use types::*;
