//! # Sync Orchestrator
//!
//! Runs one sync cycle: fans out the resource fetches, merges their results,
//! and settles on exactly one terminal outcome.
//!
//! ## Cycle Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         SyncUpdate Cycle                                │
//! │                                                                         │
//! │   start ──► categories ─┐   users   customers   cash   tariff areas    │
//! │             (launched concurrently, one task per fetch)                 │
//! │                         │                                               │
//! │             floors:  launched in restaurant mode, else settled          │
//! │             stocks:  launched with a stock location, else settled       │
//! │                         │                                               │
//! │                         ▼ parsed                                        │
//! │                      products ──► parsed ──► compositions               │
//! │                                                                         │
//! │   fetch tasks ──► mpsc ──► ONE consumer loop ──► CycleState + SyncData  │
//! │                                                                         │
//! │   ┌──────────┐  fetch/marker failure   ┌──────────┐                   │
//! │   │ Running  │ ──────────────────────► │ Aborted  │  late results     │
//! │   │          │                          └──────────┘  still count,     │
//! │   │          │  every kind done        ┌───────────┐ payloads dropped │
//! │   │          │ ──────────────────────► │ Finalized │                  │
//! │   └──────────┘                          └───────────┘                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every kind counts one progress step, whichever path it takes, so the
//! reporter always reaches [`ResourceKind::TOTAL_STEPS`]. A dependent kind
//! whose fetch can no longer be launched (the cycle already terminated) is
//! settled without a network call.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::SyncConfig;
use crate::endpoint::{redacted, Endpoints, ResourceKind};
use crate::error::SyncResult;
use crate::events::{CycleOutcome, ProgressReporter, SyncData, SyncEvent, SyncListener};
use crate::parser;
use crate::transport::{FetchFailure, FetchOutcome, HttpTransport, Transport};

// =============================================================================
// Cycle State
// =============================================================================

/// Where a kind stands within the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepStatus {
    /// Waiting on a prerequisite.
    Pending,
    InFlight,
    Done,
}

/// Why a cycle stopped early.
#[derive(Debug, Clone, PartialEq)]
enum Termination {
    ConnectionFailed(FetchFailure),
    ServerError(String),
}

#[derive(Debug, Clone, PartialEq)]
enum CyclePhase {
    Running,
    Aborted(Termination),
    Finalized,
}

/// Per-cycle bookkeeping. Touched only by the completion loop.
#[derive(Debug)]
struct CycleState {
    steps: BTreeMap<ResourceKind, StepStatus>,
    phase: CyclePhase,
    completed_steps: usize,
    in_flight: usize,
}

impl CycleState {
    fn new() -> Self {
        CycleState {
            steps: ResourceKind::ALL
                .iter()
                .map(|kind| (*kind, StepStatus::Pending))
                .collect(),
            phase: CyclePhase::Running,
            completed_steps: 0,
            in_flight: 0,
        }
    }

    fn is_running(&self) -> bool {
        self.phase == CyclePhase::Running
    }

    fn all_done(&self) -> bool {
        self.steps.values().all(|s| *s == StepStatus::Done)
    }

    fn pending(&self) -> Vec<ResourceKind> {
        self.steps
            .iter()
            .filter(|(_, s)| **s == StepStatus::Pending)
            .map(|(kind, _)| *kind)
            .collect()
    }
}

/// A fetch result delivered to the completion loop.
#[derive(Debug)]
struct Completion {
    kind: ResourceKind,
    outcome: FetchOutcome,
}

// =============================================================================
// Sync Update
// =============================================================================

/// One sync cycle against a Pasteque server.
///
/// Create a fresh instance per invocation; nothing is shared between cycles.
///
/// ## Example
/// ```rust,no_run
/// use std::sync::Arc;
/// use pasteque_sync::{NoOpListener, NoOpProgress, SyncConfig, SyncUpdate};
///
/// # async fn demo() -> pasteque_sync::SyncResult<()> {
/// let config = SyncConfig::load(None)?;
/// let update = SyncUpdate::with_http(&config, Arc::new(NoOpListener), Arc::new(NoOpProgress))?;
/// let outcome = update.run().await;
/// println!("success: {}", outcome.is_success());
/// # Ok(())
/// # }
/// ```
pub struct SyncUpdate {
    endpoints: Endpoints,
    floors_enabled: bool,
    stocks_enabled: bool,
    transport: Arc<dyn Transport>,
    listener: Arc<dyn SyncListener>,
    progress: Arc<dyn ProgressReporter>,
}

impl SyncUpdate {
    /// Prepares a cycle over the given transport.
    pub fn new(
        config: &SyncConfig,
        transport: Arc<dyn Transport>,
        listener: Arc<dyn SyncListener>,
        progress: Arc<dyn ProgressReporter>,
    ) -> SyncResult<Self> {
        config.validate()?;

        Ok(SyncUpdate {
            endpoints: Endpoints::from_config(config)?,
            floors_enabled: config.floors_enabled(),
            stocks_enabled: config.stock_location().is_some(),
            transport,
            listener,
            progress,
        })
    }

    /// Prepares a cycle over HTTP, with the timeout from `config`.
    pub fn with_http(
        config: &SyncConfig,
        listener: Arc<dyn SyncListener>,
        progress: Arc<dyn ProgressReporter>,
    ) -> SyncResult<Self> {
        let transport = Arc::new(HttpTransport::from_config(config)?);
        Self::new(config, transport, listener, progress)
    }

    /// Runs the cycle as its own task.
    pub fn spawn(self) -> JoinHandle<CycleOutcome> {
        tokio::spawn(self.run())
    }

    /// Runs the cycle to completion.
    ///
    /// Returns once every launched fetch has resolved, so all progress
    /// steps have been reported by then.
    pub async fn run(self) -> CycleOutcome {
        let cycle_id = Uuid::new_v4();
        let span = info_span!("sync_cycle", %cycle_id);
        Cycle::new(self).run().instrument(span).await
    }
}

// =============================================================================
// Cycle Runner
// =============================================================================

struct Cycle {
    update: SyncUpdate,
    state: CycleState,
    data: SyncData,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl Cycle {
    fn new(update: SyncUpdate) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Cycle {
            update,
            state: CycleState::new(),
            data: SyncData::default(),
            completions_tx,
            completions_rx,
        }
    }

    async fn run(mut self) -> CycleOutcome {
        info!(
            base = %self.update.endpoints.base(),
            floors = self.update.floors_enabled,
            stocks = self.update.stocks_enabled,
            "Starting sync cycle"
        );
        self.update.progress.start(ResourceKind::TOTAL_STEPS);

        for kind in ResourceKind::ALL {
            if kind.prerequisite().is_some() {
                continue;
            }
            let enabled = match kind {
                ResourceKind::Floors => self.update.floors_enabled,
                ResourceKind::Stocks => self.update.stocks_enabled,
                _ => true,
            };
            if enabled {
                self.launch(kind);
            } else {
                debug!(kind = %kind, "Not needed in this configuration");
                self.complete_step(kind);
            }
        }

        while self.state.in_flight > 0 {
            let Some(completion) = self.completions_rx.recv().await else {
                error!("Completion channel closed with fetches in flight");
                break;
            };
            self.state.in_flight -= 1;
            self.handle(completion);
        }

        self.into_outcome()
    }

    /// Starts the fetch for `kind` on its own task.
    fn launch(&mut self, kind: ResourceKind) {
        self.state.steps.insert(kind, StepStatus::InFlight);
        self.state.in_flight += 1;

        let url = match self.update.endpoints.url(kind) {
            Ok(url) => url,
            Err(e) => {
                error!(kind = %kind, error = %e, "Unable to build resource URL");
                let completion = Completion {
                    kind,
                    outcome: FetchOutcome::TransportError(e.to_string()),
                };
                if self.completions_tx.send(completion).is_err() {
                    error!(kind = %kind, "Completion channel closed");
                }
                return;
            }
        };

        debug!(kind = %kind, url = %redacted(&url), "Fetching");

        let transport = self.update.transport.clone();
        let tx = self.completions_tx.clone();
        tokio::spawn(
            async move {
                let fetch = tokio::spawn(
                    async move { transport.fetch(url.as_str()).await }.in_current_span(),
                );
                // A fetch that dies without an answer still completes its kind.
                let outcome = match fetch.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!(kind = %kind, error = %e, "Fetch task failed");
                        FetchOutcome::TransportError(format!("fetch task failed: {}", e))
                    }
                };
                if tx.send(Completion { kind, outcome }).is_err() {
                    debug!(kind = %kind, "Cycle gone before fetch completed");
                }
            }
            .in_current_span(),
        );
    }

    /// Marks `kind` done and reports one progress step.
    fn complete_step(&mut self, kind: ResourceKind) {
        self.state.steps.insert(kind, StepStatus::Done);
        self.state.completed_steps += 1;
        self.update.progress.increment_by(1);
        debug!(
            kind = %kind,
            step = self.state.completed_steps,
            total = ResourceKind::TOTAL_STEPS,
            "Step complete"
        );
    }

    fn handle(&mut self, completion: Completion) {
        let Completion { kind, outcome } = completion;
        self.complete_step(kind);

        match outcome.into_result() {
            Err(failure) => {
                warn!(kind = %kind, failure = %failure, "Fetch failed");
                self.abort(Termination::ConnectionFailed(failure));
            }
            Ok(body) => {
                if let Some(message) = parser::server_error(&body) {
                    warn!(kind = %kind, message = %message, "Server reported an error");
                    self.abort(Termination::ServerError(message));
                } else if self.state.is_running() {
                    let payload = parser::merge(kind, &body, &mut self.data);
                    self.update.listener.on_event(SyncEvent::KindDone(payload));
                    if let Some(dependent) = kind.dependent() {
                        self.launch(dependent);
                    }
                } else {
                    debug!(kind = %kind, "Discarding result of terminated cycle");
                }
            }
        }

        if self.state.is_running() && self.state.all_done() {
            self.state.phase = CyclePhase::Finalized;
            self.update.progress.dismiss();
            info!(
                categories = self.data.catalog.category_count(),
                products = self.data.catalog.product_count(),
                "Sync cycle complete"
            );
            self.update.listener.on_event(SyncEvent::SyncDone);
        }
    }

    /// Terminates the cycle on its first failure. Later failures are ignored.
    fn abort(&mut self, termination: Termination) {
        if !self.state.is_running() {
            debug!("Cycle already terminated, suppressing notification");
            return;
        }

        let event = match &termination {
            Termination::ConnectionFailed(failure) => SyncEvent::ConnectionFailed(failure.clone()),
            Termination::ServerError(message) => SyncEvent::SyncError(message.clone()),
        };
        self.state.phase = CyclePhase::Aborted(termination);
        self.update.progress.dismiss();
        self.update.listener.on_event(event);

        // Dependents that will never be launched still count their step.
        for kind in self.state.pending() {
            debug!(kind = %kind, "Settling step of terminated cycle");
            self.complete_step(kind);
        }
    }

    fn into_outcome(mut self) -> CycleOutcome {
        if self.state.is_running() {
            let failure = FetchFailure::Transport("sync cycle interrupted".into());
            self.abort(Termination::ConnectionFailed(failure));
        }

        match self.state.phase {
            CyclePhase::Finalized => CycleOutcome::Completed(self.data),
            CyclePhase::Aborted(Termination::ConnectionFailed(failure)) => {
                CycleOutcome::ConnectionFailed(failure)
            }
            CyclePhase::Aborted(Termination::ServerError(message)) => {
                CycleOutcome::ServerError(message)
            }
            CyclePhase::Running => CycleOutcome::ConnectionFailed(FetchFailure::Transport(
                "sync cycle interrupted".into(),
            )),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TicketsMode;
    use crate::events::KindPayload;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    // -------------------------------------------------------------------------
    // Test doubles
    // -------------------------------------------------------------------------

    /// Answers by script name after a virtual delay.
    struct ScriptedTransport {
        responses: HashMap<&'static str, (u64, FetchOutcome)>,
        requested: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new() -> Self {
            let mut responses = HashMap::new();
            for kind in ResourceKind::ALL {
                let body = if kind == ResourceKind::Cash { "null" } else { "[]" };
                responses.insert(kind.script(), (10, FetchOutcome::Success(body.into())));
            }
            ScriptedTransport {
                responses,
                requested: Mutex::new(Vec::new()),
            }
        }

        fn respond(mut self, kind: ResourceKind, delay_ms: u64, outcome: FetchOutcome) -> Self {
            self.responses.insert(kind.script(), (delay_ms, outcome));
            self
        }

        fn ok(self, kind: ResourceKind, delay_ms: u64, body: serde_json::Value) -> Self {
            self.respond(kind, delay_ms, FetchOutcome::Success(body.to_string()))
        }

        fn was_requested(&self, kind: ResourceKind) -> bool {
            self.requested
                .lock()
                .unwrap()
                .iter()
                .any(|url| url.contains(kind.script()))
        }

        fn request_count(&self) -> usize {
            self.requested.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn fetch(&self, url: &str) -> FetchOutcome {
            self.requested.lock().unwrap().push(url.to_string());
            let (delay, outcome) = self
                .responses
                .iter()
                .find(|(script, _)| url.contains(*script))
                .map(|(_, response)| response.clone())
                .unwrap_or((0, FetchOutcome::TransportError("unscripted".into())));
            tokio::time::sleep(Duration::from_millis(delay)).await;
            outcome
        }
    }

    #[derive(Default)]
    struct RecordingListener {
        events: Mutex<Vec<SyncEvent>>,
    }

    impl RecordingListener {
        fn events(&self) -> Vec<SyncEvent> {
            self.events.lock().unwrap().clone()
        }

        fn terminal(&self) -> Vec<SyncEvent> {
            self.events().into_iter().filter(SyncEvent::is_terminal).collect()
        }

        fn kinds_done(&self) -> Vec<ResourceKind> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    SyncEvent::KindDone(payload) => Some(payload.kind()),
                    _ => None,
                })
                .collect()
        }
    }

    impl SyncListener for RecordingListener {
        fn on_event(&self, event: SyncEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        total: Mutex<Option<usize>>,
        steps: Mutex<usize>,
        dismissals: Mutex<usize>,
    }

    impl RecordingProgress {
        fn steps(&self) -> usize {
            *self.steps.lock().unwrap()
        }

        fn dismissals(&self) -> usize {
            *self.dismissals.lock().unwrap()
        }
    }

    impl ProgressReporter for RecordingProgress {
        fn start(&self, total: usize) {
            *self.total.lock().unwrap() = Some(total);
        }

        fn increment_by(&self, steps: usize) {
            *self.steps.lock().unwrap() += steps;
        }

        fn dismiss(&self) {
            *self.dismissals.lock().unwrap() += 1;
        }
    }

    struct Harness {
        transport: Arc<ScriptedTransport>,
        listener: Arc<RecordingListener>,
        progress: Arc<RecordingProgress>,
    }

    impl Harness {
        async fn run(config: &SyncConfig, transport: ScriptedTransport) -> (Self, CycleOutcome) {
            let harness = Harness {
                transport: Arc::new(transport),
                listener: Arc::new(RecordingListener::default()),
                progress: Arc::new(RecordingProgress::default()),
            };
            let update = SyncUpdate::new(
                config,
                harness.transport.clone(),
                harness.listener.clone(),
                harness.progress.clone(),
            )
            .unwrap();
            let outcome = update.run().await;
            (harness, outcome)
        }

        fn assert_progress_complete(&self) {
            assert_eq!(*self.progress.total.lock().unwrap(), Some(9));
            assert_eq!(self.progress.steps(), 9);
            assert_eq!(self.progress.dismissals(), 1);
        }
    }

    fn full_config() -> SyncConfig {
        let mut config = SyncConfig::default();
        config.sync.mode = TicketsMode::Restaurant;
        config.sync.stock_location = Some("shop".into());
        config
    }

    fn categories() -> serde_json::Value {
        json!([
            {"id": "1", "label": "Drinks"},
            {"id": "2", "label": "Sodas", "parent_id": "1"},
            {"id": "3", "label": "Food"}
        ])
    }

    fn products() -> serde_json::Value {
        json!([
            {"id": "p1", "label": "Water", "price_sell": 1.0, "category": {"id": "1"}},
            {"id": "p2", "label": "Cola", "price_sell": 2.0, "category": {"id": "2"}},
            {"id": "p3", "label": "Soup", "price_sell": 4.5, "category": {"id": "3"}}
        ])
    }

    // -------------------------------------------------------------------------
    // Success paths
    // -------------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_all_endpoints_succeed() {
        let transport = ScriptedTransport::new()
            .ok(ResourceKind::Categories, 5, categories())
            .ok(ResourceKind::Products, 5, products())
            .ok(ResourceKind::Users, 20, json!([{"id": "u1", "name": "Ann"}]))
            .ok(ResourceKind::Customers, 1, json!([{"id": "c1", "dispName": "Bob"}]))
            .ok(ResourceKind::Cash, 3, json!({"id": "9", "host": "Pasteque Register"}))
            .ok(ResourceKind::Floors, 7, json!([{"id": "f1", "name": "Main", "places": []}]))
            .ok(ResourceKind::Stocks, 2, json!([{"productId": "p1", "quantity": 4.0}]))
            .ok(ResourceKind::Compositions, 5, json!([{"id": "p3", "groups": []}]))
            .ok(ResourceKind::TariffAreas, 30, json!([{"id": "t1", "label": "Terrace"}]));

        let (h, outcome) = Harness::run(&full_config(), transport).await;

        let CycleOutcome::Completed(data) = outcome else {
            panic!("expected a completed cycle");
        };
        assert_eq!(data.catalog.root_categories().len(), 2);
        assert_eq!(data.catalog.category_count(), 3);
        // p2 sits under a subcategory and is dropped.
        assert_eq!(data.catalog.product_count(), 2);
        assert_eq!(data.users.len(), 1);
        assert_eq!(data.customers[0].display_name, "Bob");
        assert!(data.cash.is_some());
        assert_eq!(data.floors.len(), 1);
        assert_eq!(data.stocks["p1"].quantity, 4.0);
        assert!(data.compositions.contains_key("p3"));
        assert_eq!(data.tariff_areas.len(), 1);

        assert_eq!(h.listener.terminal(), vec![SyncEvent::SyncDone]);
        assert_eq!(h.listener.events().last(), Some(&SyncEvent::SyncDone));
        assert_eq!(h.listener.kinds_done().len(), 9);
        assert_eq!(h.transport.request_count(), 9);
        h.assert_progress_complete();
    }

    #[tokio::test(start_paused = true)]
    async fn test_dependent_fetches_wait_for_prerequisites() {
        let transport = ScriptedTransport::new()
            .ok(ResourceKind::Categories, 50, categories())
            .ok(ResourceKind::Products, 1, products());

        let (h, outcome) = Harness::run(&full_config(), transport).await;
        assert!(outcome.is_success());

        let kinds = h.listener.kinds_done();
        let position = |kind| kinds.iter().position(|k| *k == kind).unwrap();
        assert!(position(ResourceKind::Categories) < position(ResourceKind::Products));
        assert!(position(ResourceKind::Products) < position(ResourceKind::Compositions));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_kinds_are_settled_without_fetch() {
        let mut config = SyncConfig::default();
        config.sync.mode = TicketsMode::Standard;
        config.sync.stock_location = None;

        let (h, outcome) = Harness::run(&config, ScriptedTransport::new()).await;

        assert!(outcome.is_success());
        assert!(!h.transport.was_requested(ResourceKind::Floors));
        assert!(!h.transport.was_requested(ResourceKind::Stocks));
        assert_eq!(h.transport.request_count(), 7);
        assert_eq!(h.listener.terminal(), vec![SyncEvent::SyncDone]);
        h.assert_progress_complete();
    }

    #[tokio::test(start_paused = true)]
    async fn test_parse_failure_does_not_abort() {
        let transport = ScriptedTransport::new()
            .respond(ResourceKind::Users, 5, FetchOutcome::Success("<html>".into()))
            .respond(ResourceKind::Categories, 5, FetchOutcome::Success("{nope".into()))
            .ok(ResourceKind::Products, 5, products());

        let (h, outcome) = Harness::run(&full_config(), transport).await;

        let CycleOutcome::Completed(data) = outcome else {
            panic!("expected a completed cycle");
        };
        assert!(data.users.is_empty());
        assert!(data.catalog.root_categories().is_empty());
        assert_eq!(data.catalog.product_count(), 0);
        // Products still launched after the broken categories payload.
        assert!(h.transport.was_requested(ResourceKind::Products));
        assert!(h
            .listener
            .events()
            .contains(&SyncEvent::KindDone(KindPayload::Users(Vec::new()))));
        assert_eq!(h.listener.terminal(), vec![SyncEvent::SyncDone]);
        h.assert_progress_complete();
    }

    // -------------------------------------------------------------------------
    // Failure paths
    // -------------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_categories_transport_error_aborts_cycle() {
        let failure = FetchOutcome::TransportError("connection refused".into());
        let mut transport = ScriptedTransport::new().respond(ResourceKind::Categories, 1, failure);
        for kind in [ResourceKind::Users, ResourceKind::Customers, ResourceKind::TariffAreas] {
            transport = transport.ok(kind, 100, json!([]));
        }

        let (h, outcome) = Harness::run(&full_config(), transport).await;

        assert_eq!(
            outcome,
            CycleOutcome::ConnectionFailed(FetchFailure::Transport("connection refused".into()))
        );
        assert_eq!(
            h.listener.events(),
            vec![SyncEvent::ConnectionFailed(FetchFailure::Transport(
                "connection refused".into()
            ))]
        );
        // Independent fetches ran to completion; dependents never left.
        assert!(h.transport.was_requested(ResourceKind::Users));
        assert!(!h.transport.was_requested(ResourceKind::Products));
        assert!(!h.transport.was_requested(ResourceKind::Compositions));
        h.assert_progress_complete();
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_first_failure_is_reported() {
        let transport = ScriptedTransport::new()
            .ok(ResourceKind::Users, 5, json!([{"id": "u1", "name": "Ann"}]))
            .respond(
                ResourceKind::Customers,
                10,
                FetchOutcome::StatusNotOk {
                    status: 500,
                    body: "boom".into(),
                },
            )
            .respond(
                ResourceKind::Cash,
                20,
                FetchOutcome::TransportError("reset".into()),
            )
            .ok(ResourceKind::TariffAreas, 30, json!([{"id": "t1", "label": "Terrace"}]));

        let (h, outcome) = Harness::run(&full_config(), transport).await;

        let expected = FetchFailure::Status {
            status: 500,
            body: "boom".into(),
        };
        assert_eq!(outcome, CycleOutcome::ConnectionFailed(expected.clone()));
        assert_eq!(h.listener.terminal(), vec![SyncEvent::ConnectionFailed(expected)]);

        // Nothing escapes after the terminal notification.
        let events = h.listener.events();
        assert!(events.last().unwrap().is_terminal());
        assert!(!h.listener.kinds_done().contains(&ResourceKind::TariffAreas));
        assert!(h.listener.kinds_done().contains(&ResourceKind::Users));
        h.assert_progress_complete();
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_error_marker_aborts_cycle() {
        let transport = ScriptedTransport::new()
            .ok(ResourceKind::Cash, 5, json!({"error": "Cash register locked"}))
            .respond(
                ResourceKind::Users,
                8,
                FetchOutcome::TransportError("late".into()),
            );

        let (h, outcome) = Harness::run(&full_config(), transport).await;

        assert_eq!(outcome, CycleOutcome::ServerError("Cash register locked".into()));
        assert_eq!(
            h.listener.terminal(),
            vec![SyncEvent::SyncError("Cash register locked".into())]
        );
        h.assert_progress_complete();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_while_products_in_flight_settles_compositions() {
        let transport = ScriptedTransport::new()
            .ok(ResourceKind::Categories, 1, categories())
            .respond(
                ResourceKind::Products,
                50,
                FetchOutcome::StatusNotOk {
                    status: 403,
                    body: String::new(),
                },
            );

        let (h, outcome) = Harness::run(&full_config(), transport).await;

        assert!(matches!(
            outcome,
            CycleOutcome::ConnectionFailed(FetchFailure::Status { status: 403, .. })
        ));
        assert!(!h.transport.was_requested(ResourceKind::Compositions));
        assert_eq!(h.listener.terminal().len(), 1);
        h.assert_progress_complete();
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_cycle() {
        let transport = Arc::new(ScriptedTransport::new());
        let listener = Arc::new(RecordingListener::default());
        let update = SyncUpdate::new(
            &SyncConfig::default(),
            transport,
            listener.clone(),
            Arc::new(crate::events::NoOpProgress),
        )
        .unwrap();

        let outcome = update.spawn().await.unwrap();
        assert!(outcome.is_success());
        assert_eq!(listener.terminal(), vec![SyncEvent::SyncDone]);
    }

    /// Panics on one script, answers everything else with an empty list.
    struct PanickyTransport {
        script: &'static str,
    }

    #[async_trait]
    impl Transport for PanickyTransport {
        async fn fetch(&self, url: &str) -> FetchOutcome {
            if url.contains(self.script) {
                panic!("transport blew up on {}", self.script);
            }
            let body = if url.contains(ResourceKind::Cash.script()) { "null" } else { "[]" };
            FetchOutcome::Success(body.into())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_fetch_fails_cycle() {
        let listener = Arc::new(RecordingListener::default());
        let progress = Arc::new(RecordingProgress::default());
        let update = SyncUpdate::new(
            &full_config(),
            Arc::new(PanickyTransport {
                script: ResourceKind::Users.script(),
            }),
            listener.clone(),
            progress.clone(),
        )
        .unwrap();

        let outcome = tokio::time::timeout(Duration::from_secs(3600), update.run())
            .await
            .expect("cycle must terminate");

        let CycleOutcome::ConnectionFailed(FetchFailure::Transport(message)) = outcome else {
            panic!("expected a transport failure");
        };
        assert!(message.starts_with("fetch task failed"));
        assert_eq!(listener.terminal().len(), 1);
        assert!(matches!(
            listener.terminal()[0],
            SyncEvent::ConnectionFailed(FetchFailure::Transport(_))
        ));
        assert_eq!(progress.steps(), 9);
        assert_eq!(progress.dismissals(), 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = SyncConfig::default();
        config.sync.request_timeout_secs = 0;
        let result = SyncUpdate::new(
            &config,
            Arc::new(ScriptedTransport::new()),
            Arc::new(crate::events::NoOpListener),
            Arc::new(crate::events::NoOpProgress),
        );
        assert!(matches!(result, Err(e) if e.is_config_error()));
    }
}
