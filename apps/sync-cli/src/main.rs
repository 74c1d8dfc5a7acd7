//! # pasteque-sync CLI
//!
//! Runs one sync cycle against the configured Pasteque server and prints
//! what came back.
//!
//! ```text
//! pasteque-sync [--config PATH] [--verbose]
//!
//! exit 0  cycle completed
//! exit 1  configuration error, connection failure or server error
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use clap::Parser;
use pasteque_core::Catalog;
use pasteque_sync::{
    CycleOutcome, KindPayload, ProgressReporter, SyncConfig, SyncData, SyncEvent, SyncListener,
    SyncUpdate,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pasteque-sync")]
#[command(about = "Pull the register dataset from a Pasteque server")]
struct Args {
    /// Path to sync.toml (defaults to the platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug output for every crate
    #[arg(short, long)]
    verbose: bool,
}

// =============================================================================
// Logging Sinks
// =============================================================================

/// Logs every cycle event.
struct LogListener;

impl SyncListener for LogListener {
    fn on_event(&self, event: SyncEvent) {
        match event {
            SyncEvent::KindDone(payload) => {
                info!(kind = %payload.kind(), records = payload_len(&payload), "Kind synced")
            }
            SyncEvent::SyncDone => info!("Sync done"),
            SyncEvent::ConnectionFailed(failure) => warn!(%failure, "Connection failed"),
            SyncEvent::SyncError(message) => warn!(%message, "Server reported an error"),
        }
    }
}

/// Logs progress steps.
#[derive(Default)]
struct LogProgress {
    total: AtomicUsize,
    done: AtomicUsize,
}

impl ProgressReporter for LogProgress {
    fn start(&self, total: usize) {
        self.total.store(total, Ordering::SeqCst);
    }

    fn increment_by(&self, steps: usize) {
        let done = self.done.fetch_add(steps, Ordering::SeqCst) + steps;
        info!(done, total = self.total.load(Ordering::SeqCst), "Progress");
    }

    fn dismiss(&self) {
        info!("Progress dismissed");
    }
}

fn payload_len(payload: &KindPayload) -> usize {
    match payload {
        KindPayload::Categories(roots) => roots.len(),
        KindPayload::Catalog(catalog) => catalog.product_count(),
        KindPayload::Users(users) => users.len(),
        KindPayload::Customers(customers) => customers.len(),
        KindPayload::Cash(cash) => usize::from(cash.is_some()),
        KindPayload::Floors(floors) => floors.len(),
        KindPayload::Stocks(stocks) => stocks.len(),
        KindPayload::Compositions(compositions) => compositions.len(),
        KindPayload::TariffAreas(areas) => areas.len(),
    }
}

// =============================================================================
// Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = match SyncConfig::load(args.config) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Unable to load configuration");
            return ExitCode::FAILURE;
        }
    };

    info!(
        host = %config.server.host,
        machine = %config.machine_name(),
        mode = %config.sync.mode,
        "Configuration loaded"
    );

    let update = match SyncUpdate::with_http(
        &config,
        Arc::new(LogListener),
        Arc::new(LogProgress::default()),
    ) {
        Ok(update) => update,
        Err(e) => {
            error!(error = %e, "Unable to prepare sync");
            return ExitCode::FAILURE;
        }
    };

    match update.run().await {
        CycleOutcome::Completed(data) => {
            print_summary(&data);
            ExitCode::SUCCESS
        }
        CycleOutcome::ConnectionFailed(failure) => {
            eprintln!("Sync failed: {}", failure);
            ExitCode::FAILURE
        }
        CycleOutcome::ServerError(message) => {
            eprintln!("Server error: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn print_summary(data: &SyncData) {
    print_catalog(&data.catalog);
    println!("Users:         {}", data.users.len());
    println!("Customers:     {}", data.customers.len());
    println!("Floors:        {}", data.floors.len());
    println!("Stock levels:  {}", data.stocks.len());
    println!("Compositions:  {}", data.compositions.len());
    println!("Tariff areas:  {}", data.tariff_areas.len());
    match &data.cash {
        Some(cash) if cash.is_closed() => println!("Cash session:  closed"),
        Some(cash) if cash.is_opened() => println!("Cash session:  open"),
        Some(_) => println!("Cash session:  not opened"),
        None => println!("Cash session:  none"),
    }
}

fn print_catalog(catalog: &Catalog) {
    if catalog.is_empty() {
        println!("Catalog:       empty");
        return;
    }
    println!("Categories:    {}", catalog.category_count());
    println!("Products:      {}", catalog.product_count());
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `--verbose` - DEBUG everywhere when `RUST_LOG` is unset
/// - Default: INFO level, DEBUG for the pasteque crates
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info,pasteque=debug" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
