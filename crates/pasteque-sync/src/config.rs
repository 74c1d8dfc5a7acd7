//! # Sync Configuration
//!
//! Connection and mode settings for a sync cycle.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     PASTEQUE_HOST=demo.pasteque.org/api                                │
//! │     PASTEQUE_TICKETS_MODE=restaurant                                   │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/pasteque/sync.toml (Linux)                               │
//! │     ~/Library/Application Support/org.pasteque.client/sync.toml        │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     localhost, standard mode, no stock location                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # sync.toml
//! [server]
//! host = "demo.pasteque.org/api"
//! user = "cashier"
//! password = "secret"
//!
//! [device]
//! machine_name = "Register 1"
//!
//! [sync]
//! mode = "restaurant"   # simple | standard | restaurant
//! stock_location = "0"
//! request_timeout_secs = 30
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Tickets Mode
// =============================================================================

/// How the register rings up tickets.
///
/// Only [`TicketsMode::Restaurant`] works with floor plans, so it is the only
/// mode that syncs floors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketsMode {
    /// One ticket at a time, no customer tracking.
    Simple,

    /// Several open tickets at once.
    #[default]
    Standard,

    /// Tickets attached to tables on floor plans.
    Restaurant,
}

impl TicketsMode {
    /// Returns true if this mode needs floor plans.
    pub fn uses_floors(&self) -> bool {
        matches!(self, TicketsMode::Restaurant)
    }
}

impl std::fmt::Display for TicketsMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketsMode::Simple => write!(f, "simple"),
            TicketsMode::Standard => write!(f, "standard"),
            TicketsMode::Restaurant => write!(f, "restaurant"),
        }
    }
}

impl std::str::FromStr for TicketsMode {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simple" => Ok(TicketsMode::Simple),
            "standard" => Ok(TicketsMode::Standard),
            "restaurant" => Ok(TicketsMode::Restaurant),
            other => Err(SyncError::InvalidConfig(format!(
                "Unknown tickets mode: '{}'. Valid options: simple, standard, restaurant",
                other
            ))),
        }
    }
}

// =============================================================================
// Server Configuration
// =============================================================================

/// Where the Pasteque server lives and how to log in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base address of the API scripts. The scheme may be omitted.
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub password: String,
}

fn default_host() -> String {
    "http://localhost/pasteque/".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: default_host(),
            user: String::new(),
            password: String::new(),
        }
    }
}

// =============================================================================
// Device Configuration
// =============================================================================

/// Configuration for this register.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Name the server knows this machine by. Scopes the cash session fetch.
    #[serde(default = "default_machine_name")]
    pub machine_name: String,
}

fn default_machine_name() -> String {
    "Pasteque Register".to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            machine_name: default_machine_name(),
        }
    }
}

// =============================================================================
// Sync Settings
// =============================================================================

/// Sync behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Tickets mode of this register.
    #[serde(default)]
    pub mode: TicketsMode,

    /// Stock location to pull levels for. Stocks are skipped when unset.
    #[serde(default)]
    pub stock_location: Option<String>,

    /// Per-request timeout (seconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            mode: TicketsMode::default(),
            stock_location: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

// =============================================================================
// Main Sync Configuration
// =============================================================================

/// Complete sync configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub sync: SyncSettings,
}

impl SyncConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (sync.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading sync config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load sync config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Sync config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        let base = self.base_url()?;
        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(SyncError::InvalidUrl(format!(
                "Server host must be an http:// or https:// address, got: {}",
                self.server.host
            )));
        }

        if self.device.machine_name.trim().is_empty() {
            return Err(SyncError::InvalidConfig(
                "machine_name must not be empty".into(),
            ));
        }

        if self.sync.request_timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies overrides read through `lookup`, keyed by environment
    /// variable name.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("PASTEQUE_HOST") {
            debug!(host = %host, "Overriding server host from environment");
            self.server.host = host;
        }

        if let Some(user) = lookup("PASTEQUE_USER") {
            self.server.user = user;
        }

        if let Some(password) = lookup("PASTEQUE_PASSWORD") {
            self.server.password = password;
        }

        if let Some(name) = lookup("PASTEQUE_MACHINE_NAME") {
            self.device.machine_name = name;
        }

        if let Some(mode) = lookup("PASTEQUE_TICKETS_MODE") {
            match mode.parse() {
                Ok(parsed) => {
                    debug!(mode = %mode, "Overriding tickets mode from environment");
                    self.sync.mode = parsed;
                }
                Err(_) => warn!(mode = %mode, "Unknown tickets mode in environment"),
            }
        }

        if let Some(location) = lookup("PASTEQUE_STOCK_LOCATION") {
            debug!(location = %location, "Overriding stock location from environment");
            self.sync.stock_location = Some(location);
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("org", "pasteque", "client")
            .map(|dirs| dirs.config_dir().join("sync.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Returns the server base URL, scheme and trailing slash included.
    pub fn base_url(&self) -> SyncResult<Url> {
        Ok(Url::parse(&normalize_host(&self.server.host))?)
    }

    /// Returns true if floors are synced in this mode.
    pub fn floors_enabled(&self) -> bool {
        self.sync.mode.uses_floors()
    }

    /// Returns the stock location, `None` when unset or blank.
    pub fn stock_location(&self) -> Option<&str> {
        self.sync
            .stock_location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }

    pub fn machine_name(&self) -> &str {
        &self.device.machine_name
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.sync.request_timeout_secs)
    }
}

/// Adds `http://` when the host has no scheme and enforces a trailing slash,
/// so script names join under the host path instead of replacing its last
/// segment.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let mut normalized = if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    };
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    normalized
}
