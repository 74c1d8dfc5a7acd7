//! # pasteque-sync: Sync Engine for the Pasteque POS Client
//!
//! Pulls the full working dataset of a register from its Pasteque server
//! and reports a single outcome once every fetch has resolved.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sync Engine Architecture                         │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                   SyncUpdate (Orchestrator)                      │  │
//! │  │                                                                  │  │
//! │  │  One instance per cycle, run inline or spawned as a Tokio task  │  │
//! │  │  Fans out fetches, serializes completions, decides the outcome  │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │   Endpoints    │  │   Transport    │  │      Parsers           │    │
//! │  │                │  │                │  │                        │    │
//! │  │ Resource kinds │  │ reqwest GET,   │  │ Error marker check,    │    │
//! │  │ URL building   │  │ one outcome    │  │ category tree, root-   │    │
//! │  │ dependencies   │  │ per request    │  │ only product attach    │    │
//! │  └────────────────┘  └────────────────┘  └────────────────────────┘    │
//! │                                                                         │
//! │  OUTBOUND:                                                             │
//! │  • SyncListener     - KindDone(..), then SyncDone | ConnectionFailed   │
//! │                       | SyncError                                      │
//! │  • ProgressReporter - start(9), increment_by(1) x 9, dismiss()         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`orchestrator`] - `SyncUpdate`, the cycle state machine
//! - [`config`] - Server, device and mode settings
//! - [`endpoint`] - Resource kinds and URL building
//! - [`transport`] - Fetch capability and its HTTP implementation
//! - [`parser`] - Per-kind payload parsers
//! - [`events`] - Listener and progress contracts, cycle outcome
//! - [`error`] - Sync error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pasteque_sync::{NoOpProgress, SyncConfig, SyncUpdate, ChannelListener};
//!
//! let config = SyncConfig::load_or_default(None);
//! let (listener, mut events) = ChannelListener::new();
//!
//! let handle = SyncUpdate::with_http(&config, Arc::new(listener), Arc::new(NoOpProgress))?
//!     .spawn();
//!
//! while let Some(event) = events.recv().await {
//!     println!("{:?}", event);
//! }
//! let outcome = handle.await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod endpoint;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod parser;
pub mod transport;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{SyncConfig, TicketsMode};
pub use endpoint::{Endpoints, ResourceKind};
pub use error::{SyncError, SyncResult};
pub use events::{
    ChannelListener, CycleOutcome, KindPayload, NoOpListener, NoOpProgress, ProgressReporter,
    SyncData, SyncEvent, SyncListener,
};
pub use orchestrator::SyncUpdate;
pub use transport::{FetchFailure, FetchOutcome, HttpTransport, Transport};
