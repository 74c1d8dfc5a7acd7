//! # Transport
//!
//! The "fetch text from a URL" capability the orchestrator consumes.
//!
//! ## Outcome Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     One Outcome Per Fetch                               │
//! │                                                                         │
//! │  fetch(url) ──┬──► Success(body)          2xx, body read as text       │
//! │               ├──► StatusNotOk{status,..} any other status             │
//! │               └──► TransportError(detail) connect/read/timeout error   │
//! │                                                                         │
//! │  No retries. The caller decides what a failure means for the cycle.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SyncConfig;
use crate::error::SyncResult;

// =============================================================================
// Outcomes
// =============================================================================

/// Result of a single fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The server answered with a success status.
    Success(String),

    /// The server answered with a non-success status.
    StatusNotOk { status: u16, body: String },

    /// No usable response was received.
    TransportError(String),
}

impl FetchOutcome {
    /// Splits the outcome into the body or the failure detail.
    pub fn into_result(self) -> Result<String, FetchFailure> {
        match self {
            FetchOutcome::Success(body) => Ok(body),
            FetchOutcome::StatusNotOk { status, body } => Err(FetchFailure::Status { status, body }),
            FetchOutcome::TransportError(detail) => Err(FetchFailure::Transport(detail)),
        }
    }
}

/// Failure detail carried by a "connection failed" notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchFailure {
    Status { status: u16, body: String },
    Transport(String),
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchFailure::Status { status, .. } => write!(f, "server answered HTTP {}", status),
            FetchFailure::Transport(detail) => write!(f, "transport error: {}", detail),
        }
    }
}

// =============================================================================
// Transport Trait
// =============================================================================

/// Retrieves response text for a URL.
///
/// Implementations resolve every call exactly once and never panic on
/// network failure.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchOutcome;
}

// =============================================================================
// HTTP Transport
// =============================================================================

/// [`Transport`] over a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Builds a client with the given per-request timeout.
    pub fn new(timeout: Duration) -> SyncResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pasteque-sync/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(HttpTransport { client })
    }

    pub fn from_config(config: &SyncConfig) -> SyncResult<Self> {
        Self::new(config.request_timeout())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return FetchOutcome::TransportError(e.to_string()),
        };

        let status = response.status();
        debug!(status = status.as_u16(), "HTTP response received");

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return FetchOutcome::TransportError(e.to_string()),
        };

        if status.is_success() {
            FetchOutcome::Success(body)
        } else {
            FetchOutcome::StatusNotOk {
                status: status.as_u16(),
                body,
            }
        }
    }
}
