//! # Cycle Events and Sinks
//!
//! What a cycle reports, and the two passive observers it reports to.
//!
//! ## Event Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Cycle Notifications                             │
//! │                                                                         │
//! │  SyncUpdate ──► SyncListener                                            │
//! │                 ├── KindDone(payload)   0..9 times, while Running       │
//! │                 └── exactly ONE of:                                     │
//! │                     SyncDone | ConnectionFailed(..) | SyncError(..)     │
//! │                                                                         │
//! │  SyncUpdate ──► ProgressReporter                                        │
//! │                 ├── start(9)                                            │
//! │                 ├── increment_by(1)     exactly 9 times                 │
//! │                 └── dismiss()           once, when the outcome is known │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use pasteque_core::{Cash, Catalog, Category, Composition, Customer, Floor, Stock, TariffArea, User};
use tokio::sync::mpsc;
use tracing::warn;

use crate::endpoint::ResourceKind;
use crate::transport::FetchFailure;

// =============================================================================
// Sync Data
// =============================================================================

/// Everything merged during one cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncData {
    pub catalog: Catalog,
    pub users: Vec<User>,
    pub customers: Vec<Customer>,
    /// Cash session of this machine, if the server has one.
    pub cash: Option<Cash>,
    pub floors: Vec<Floor>,
    /// Stock levels by product id.
    pub stocks: HashMap<String, Stock>,
    /// Compositions by product id.
    pub compositions: HashMap<String, Composition>,
    pub tariff_areas: Vec<TariffArea>,
}

// =============================================================================
// Events
// =============================================================================

/// Parsed contribution of one kind.
#[derive(Debug, Clone, PartialEq)]
pub enum KindPayload {
    /// Root categories with their subtrees.
    Categories(Vec<Category>),
    /// The catalog once products are attached.
    Catalog(Catalog),
    Users(Vec<User>),
    Customers(Vec<Customer>),
    Cash(Option<Cash>),
    Floors(Vec<Floor>),
    Stocks(HashMap<String, Stock>),
    Compositions(HashMap<String, Composition>),
    TariffAreas(Vec<TariffArea>),
}

impl KindPayload {
    /// The kind this payload was parsed from.
    pub fn kind(&self) -> ResourceKind {
        match self {
            KindPayload::Categories(_) => ResourceKind::Categories,
            KindPayload::Catalog(_) => ResourceKind::Products,
            KindPayload::Users(_) => ResourceKind::Users,
            KindPayload::Customers(_) => ResourceKind::Customers,
            KindPayload::Cash(_) => ResourceKind::Cash,
            KindPayload::Floors(_) => ResourceKind::Floors,
            KindPayload::Stocks(_) => ResourceKind::Stocks,
            KindPayload::Compositions(_) => ResourceKind::Compositions,
            KindPayload::TariffAreas(_) => ResourceKind::TariffAreas,
        }
    }
}

/// Notification sent to the [`SyncListener`].
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// Every kind is done. Terminal.
    SyncDone,

    /// A fetch failed at the HTTP level. Terminal.
    ConnectionFailed(FetchFailure),

    /// The server reported an error in its payload. Terminal.
    SyncError(String),

    /// One kind was parsed and merged.
    KindDone(KindPayload),
}

impl SyncEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SyncEvent::KindDone(_))
    }
}

/// Final result of a cycle, returned once every launched fetch has resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Completed(SyncData),
    ConnectionFailed(FetchFailure),
    ServerError(String),
}

impl CycleOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CycleOutcome::Completed(_))
    }
}

// =============================================================================
// Sink Traits
// =============================================================================

/// Receives cycle notifications (implemented by the UI layer).
pub trait SyncListener: Send + Sync {
    fn on_event(&self, event: SyncEvent);
}

/// Receives step counts (implemented by a progress widget).
pub trait ProgressReporter: Send + Sync {
    /// Called once before any step completes.
    fn start(&self, total: usize);

    fn increment_by(&self, steps: usize);

    /// Called once when the cycle outcome is known.
    fn dismiss(&self);
}

/// No-op listener for headless runs.
pub struct NoOpListener;

impl SyncListener for NoOpListener {
    fn on_event(&self, _event: SyncEvent) {}
}

/// No-op progress reporter.
pub struct NoOpProgress;

impl ProgressReporter for NoOpProgress {
    fn start(&self, _total: usize) {}
    fn increment_by(&self, _steps: usize) {}
    fn dismiss(&self) {}
}

/// Forwards events into an unbounded channel.
pub struct ChannelListener {
    tx: mpsc::UnboundedSender<SyncEvent>,
}

impl ChannelListener {
    /// Creates the listener and the receiving end.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SyncEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelListener { tx }, rx)
    }
}

impl SyncListener for ChannelListener {
    fn on_event(&self, event: SyncEvent) {
        if self.tx.send(event).is_err() {
            warn!("Sync event receiver dropped");
        }
    }
}
