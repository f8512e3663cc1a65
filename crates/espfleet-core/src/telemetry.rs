// ── Telemetry sinks and fleet aggregation ──
//
// `TelemetrySink` is the seam to the transport: sends are call-and-forget
// and must never block the caller. `TelemetryAggregator` reduces the
// online fleet into one metric snapshot and fans out per-unit updates,
// isolating every failure at the point it happens.

use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use espfleet_api::{TelemetryClient, TrackingHit};

use crate::error::CoreError;
use crate::model::{FleetMetrics, SYSTEM_INFO_NAME, SYSTEM_INFO_PLUGIN};
use crate::registry::UnitRegistry;

/// Category for fleet-wide hits.
pub const APP_CATEGORY: &str = "App";
/// Category for per-unit hits.
pub const UNIT_CATEGORY: &str = "Unit";

/// One telemetry payload handed to a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryEvent {
    pub category: String,
    pub reason: String,
    pub route: String,
    pub metrics: IndexMap<String, u64>,
}

impl TelemetryEvent {
    pub fn new(
        category: impl Into<String>,
        reason: impl Into<String>,
        route: impl Into<String>,
        metrics: IndexMap<String, u64>,
    ) -> Self {
        Self {
            category: category.into(),
            reason: reason.into(),
            route: route.into(),
            metrics,
        }
    }
}

impl From<TelemetryEvent> for TrackingHit {
    fn from(event: TelemetryEvent) -> Self {
        Self {
            category: event.category,
            reason: event.reason,
            route: event.route,
            metrics: event.metrics,
        }
    }
}

/// Destination for telemetry events.
///
/// `send` hands the event off and returns immediately. An `Err` means
/// the hand-off itself failed; delivery failures after that point are
/// the sink's to log.
pub trait TelemetrySink: Send + Sync {
    fn send(&self, event: TelemetryEvent) -> Result<(), CoreError>;

    /// Length of the tracker's visit window; the first snapshot must be
    /// sent before it elapses.
    fn initial_timeout(&self) -> Duration;
}

// ── HttpSink ─────────────────────────────────────────────────────────

/// Sink delivering events to a tracking endpoint in background tasks.
pub struct HttpSink {
    client: Arc<TelemetryClient>,
    in_flight: TaskTracker,
}

impl HttpSink {
    pub fn new(client: TelemetryClient) -> Self {
        Self {
            client: Arc::new(client),
            in_flight: TaskTracker::new(),
        }
    }

    /// Wait until every delivery started so far has finished.
    ///
    /// Sends issued after this returns are still delivered; the sink stays
    /// usable.
    pub async fn flush(&self) {
        self.in_flight.close();
        self.in_flight.wait().await;
        self.in_flight.reopen();
    }

    /// Number of deliveries still running.
    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }
}

impl TelemetrySink for HttpSink {
    fn send(&self, event: TelemetryEvent) -> Result<(), CoreError> {
        let handle =
            tokio::runtime::Handle::try_current().map_err(|_| espfleet_api::Error::NoRuntime)?;
        let client = Arc::clone(&self.client);
        let hit = TrackingHit::from(event);

        self.in_flight.spawn_on(
            async move {
                if let Err(e) = client.deliver(&hit).await {
                    warn!(
                        category = %hit.category,
                        reason = %hit.reason,
                        error = %e,
                        "telemetry delivery failed"
                    );
                }
            },
            &handle,
        );
        Ok(())
    }

    fn initial_timeout(&self) -> Duration {
        self.client.initial_timeout()
    }
}

// ── LogSink ──────────────────────────────────────────────────────────

/// Sink used when telemetry is disabled: events are logged, not sent.
pub struct LogSink {
    initial_timeout: Duration,
}

impl LogSink {
    pub fn new(initial_timeout: Duration) -> Self {
        Self { initial_timeout }
    }
}

impl TelemetrySink for LogSink {
    fn send(&self, event: TelemetryEvent) -> Result<(), CoreError> {
        info!(
            category = %event.category,
            reason = %event.reason,
            route = %event.route,
            metrics = ?event.metrics,
            "telemetry disabled, not sending"
        );
        Ok(())
    }

    fn initial_timeout(&self) -> Duration {
        self.initial_timeout
    }
}

// ── TelemetryAggregator ──────────────────────────────────────────────

/// Computes fleet metrics and pushes them (and per-unit updates) to a sink.
pub struct TelemetryAggregator {
    registry: Arc<UnitRegistry>,
    sink: Arc<dyn TelemetrySink>,
}

impl TelemetryAggregator {
    pub fn new(registry: Arc<UnitRegistry>, sink: Arc<dyn TelemetrySink>) -> Self {
        Self { registry, sink }
    }

    /// Reduce the current online snapshot into fleet metrics.
    ///
    /// Every sum runs over the online units only, except `total_units`
    /// which counts the whole fleet.
    pub fn compute_metrics(&self) -> FleetMetrics {
        let online = self.registry.get_online();

        FleetMetrics {
            total_tasks: online.iter().map(|u| u.tasks().len()).sum(),
            total_tasks_in_use: online
                .iter()
                .map(|u| {
                    u.sensors().len()
                        + u.tasks_by_name(SYSTEM_INFO_PLUGIN, SYSTEM_INFO_NAME, false)
                            .len()
                })
                .sum(),
            total_units: self.registry.len(),
            total_gpio_used: online.iter().map(|u| u.gpios().len()).sum(),
        }
    }

    /// Compute and send a fleet snapshot; with `recurse`, also ask every
    /// online unit for its own update.
    ///
    /// Never fails: transport errors and per-unit errors are logged and
    /// the remaining work carries on.
    pub fn update_telemetry(&self, reason: &str, route: &str, recurse: bool) {
        let metrics = self.compute_metrics();
        debug!(reason, route, ?metrics, "sending fleet telemetry");

        let event = TelemetryEvent::new(APP_CATEGORY, reason, route, metrics.to_metric_map());
        if let Err(e) = self.sink.send(event) {
            warn!(category = APP_CATEGORY, reason, error = %e, "error updating app telemetry");
        }

        if recurse {
            for unit in self.registry.get_online() {
                if let Err(e) = unit.update_telemetry(reason, recurse) {
                    warn!(unit = unit.name(), reason, error = %e, "error updating unit telemetry");
                }
            }
        }
    }
}
