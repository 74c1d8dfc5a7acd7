//! # Error Types
//!
//! Domain-specific error types for pasteque-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  pasteque-core errors (this file)                                      │
//! │  └── CoreError        - Malformed domain data                          │
//! │                                                                         │
//! │  pasteque-sync errors (separate crate)                                 │
//! │  └── SyncError        - Config, URL and client setup failures          │
//! │                                                                         │
//! │  Flow: CoreError is caught by the parser that fed the data, logged,    │
//! │        and turned into an empty contribution for that resource kind.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Errors raised while assembling domain data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A category appears among its own descendants.
    ///
    /// ## When This Occurs
    /// - Two records share an id and one sits under the other
    /// - A record lists itself as parent while a root carries the same id
    ///
    /// ```text
    /// root "1"
    ///   └── "2" (parent "1")
    ///         └── "1" (parent "2")   ◄── already on the path
    /// ```
    #[error("Category {id} is its own ancestor")]
    CategoryCycle { id: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
