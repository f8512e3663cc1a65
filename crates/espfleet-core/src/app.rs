// ── Fleet coordinator ──
//
// Process-lifetime facade owning the registry, tracker, aggregator and
// catalogs. Wires unit-initialized notifications into the tracker, arms
// the fallback timer and sends the uninit hit on shutdown.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use indexmap::IndexMap;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::capability::{CapabilityMap, CapabilityRegistry};
use crate::config::FleetConfig;
use crate::error::CoreError;
use crate::model::{AppManifest, CapabilityDescriptor, FleetMetrics};
use crate::registry::{SubscriptionId, UnitRegistry};
use crate::tasks::TaskTypeCatalog;
use crate::telemetry::{APP_CATEGORY, TelemetryAggregator, TelemetryEvent, TelemetrySink};
use crate::tracker::{InitState, InitializationTracker};
use crate::unit::FleetUnit;

/// Reason reported on shutdown.
pub const UNINIT_REASON: &str = "Uninit";
/// Route reported on shutdown.
pub const UNINIT_ROUTE: &str = "/app/uninit";

/// The coordinator. Cheaply cloneable via `Arc<FleetInner>`.
#[derive(Clone)]
pub struct FleetApp {
    inner: Arc<FleetInner>,
}

struct FleetInner {
    config: FleetConfig,
    manifest: Arc<AppManifest>,
    registry: Arc<UnitRegistry>,
    tracker: InitializationTracker,
    aggregator: TelemetryAggregator,
    capabilities: CapabilityRegistry,
    task_types: TaskTypeCatalog,
    sink: Arc<dyn TelemetrySink>,
    started: AtomicBool,
    subscription: ArcSwapOption<SubscriptionId>,
    /// Cancels every background task.
    cancel: CancellationToken,
    /// Cancels only the fallback timer, once the fleet is initialized.
    fallback_cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl FleetApp {
    /// Build a coordinator over the bundled capability baseline.
    /// Does not start anything; call [`start()`](Self::start).
    pub fn new(
        config: FleetConfig,
        manifest: AppManifest,
        sink: Arc<dyn TelemetrySink>,
    ) -> Result<Self, CoreError> {
        let capabilities = CapabilityRegistry::with_builtin_baseline(&manifest.capabilities)?;
        Ok(Self::with_capabilities(config, manifest, capabilities, sink))
    }

    /// Build a coordinator with an explicit capability registry.
    pub fn with_capabilities(
        config: FleetConfig,
        manifest: AppManifest,
        capabilities: CapabilityRegistry,
        sink: Arc<dyn TelemetrySink>,
    ) -> Self {
        let manifest = Arc::new(manifest);
        let registry = Arc::new(UnitRegistry::new());
        let aggregator = TelemetryAggregator::new(Arc::clone(&registry), Arc::clone(&sink));
        let task_types = TaskTypeCatalog::new(Arc::clone(&manifest) as _);
        let cancel = CancellationToken::new();
        let fallback_cancel = cancel.child_token();

        Self {
            inner: Arc::new(FleetInner {
                tracker: InitializationTracker::new(config.settle_policy),
                config,
                manifest,
                registry,
                aggregator,
                capabilities,
                task_types,
                sink,
                started: AtomicBool::new(false),
                subscription: ArcSwapOption::empty(),
                cancel,
                fallback_cancel,
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Subscribe the tracker to unit notifications and arm the fallback
    /// timer. Must be called from within a tokio runtime.
    pub async fn start(&self) -> Result<(), CoreError> {
        if self.inner.started.swap(true, Ordering::AcqRel) {
            return Err(CoreError::AlreadyStarted);
        }

        let weak = Arc::downgrade(&self.inner);
        let id = self.inner.registry.subscribe(move |unit| {
            let Some(inner) = weak.upgrade() else { return };
            debug!(unit = unit.name(), "checking fleet initialization");
            if inner
                .tracker
                .on_unit_initialized(&inner.registry, &inner.aggregator)
            {
                inner.fallback_cancel.cancel();
            }
        });
        self.inner.subscription.store(Some(Arc::new(id)));

        let delay = self.inner.config.fallback_delay(self.inner.sink.initial_timeout());
        let app = self.clone();
        let cancel = self.inner.fallback_cancel.clone();
        self.inner
            .task_handles
            .lock()
            .await
            .push(tokio::spawn(fallback_task(app, delay, cancel)));

        info!(
            fallback_secs = delay.as_secs(),
            policy = ?self.inner.tracker.policy(),
            "fleet coordinator started"
        );
        Ok(())
    }

    /// Stop background tasks, detach from the registry and send the
    /// uninit hit.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, panicked = e.is_panic(), "background task failed");
            }
        }
        drop(handles);

        if let Some(id) = self.inner.subscription.swap(None) {
            self.inner.registry.unsubscribe(*id);
        }

        let event = TelemetryEvent::new(APP_CATEGORY, UNINIT_REASON, UNINIT_ROUTE, IndexMap::new());
        if let Err(e) = self.inner.sink.send(event) {
            warn!(category = APP_CATEGORY, reason = UNINIT_REASON, error = %e, "error sending uninit telemetry");
        }
        debug!("fleet coordinator stopped");
    }

    // ── Fleet operations ─────────────────────────────────────────────

    /// Register a newly discovered unit.
    pub fn register_unit(&self, unit: Arc<dyn FleetUnit>) -> Result<(), CoreError> {
        self.inner.registry.register(unit)
    }

    /// Report that a unit completed its own setup.
    pub fn unit_initialized(&self, name: &str) -> Result<bool, CoreError> {
        self.inner.registry.mark_initialized(name)
    }

    /// Compute and send fleet telemetry now. Never fails.
    pub fn update_telemetry(&self, reason: &str, route: &str, recurse: bool) {
        self.inner.aggregator.update_telemetry(reason, route, recurse);
    }

    pub fn compute_metrics(&self) -> FleetMetrics {
        self.inner.aggregator.compute_metrics()
    }

    // ── State / catalog accessors ────────────────────────────────────

    pub fn init_state(&self) -> InitState {
        self.inner.tracker.state()
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.tracker.is_initialized()
    }

    pub fn registry(&self) -> &Arc<UnitRegistry> {
        &self.inner.registry
    }

    pub fn config(&self) -> &FleetConfig {
        &self.inner.config
    }

    pub fn manifest(&self) -> &AppManifest {
        &self.inner.manifest
    }

    pub fn sink(&self) -> &Arc<dyn TelemetrySink> {
        &self.inner.sink
    }

    pub fn get_capabilities(&self) -> &CapabilityMap {
        self.inner.capabilities.get_capabilities()
    }

    pub fn get_capability(&self, id: &str) -> Option<&CapabilityDescriptor> {
        self.inner.capabilities.get_capability(id)
    }

    /// Title of a capability in the configured language.
    pub fn capability_title(&self, id: &str) -> Option<String> {
        self.get_capability(id)
            .map(|c| c.title.resolve(&self.inner.config.language))
    }

    pub fn supported_tasks(&self) -> &[String] {
        self.inner.task_types.supported_tasks()
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Initialize the fleet when the tracker's visit window is about to end,
/// unless it already happened.
async fn fallback_task(app: FleetApp, delay: Duration, cancel: CancellationToken) {
    tokio::select! {
        biased;
        () = cancel.cancelled() => debug!("fallback timer cancelled"),
        () = tokio::time::sleep(delay) => {
            if app.inner.tracker.on_fallback(&app.inner.aggregator) {
                debug!("fleet initialized by fallback timer");
            }
        }
    }
}
