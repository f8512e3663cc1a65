// ── Initialization tracking ──
//
// Decides, exactly once per process, that the fleet has settled and the
// first telemetry snapshot can go out. The transition is a single atomic
// compare-and-swap, so concurrent triggers cannot both win.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use crate::config::SettlePolicy;
use crate::registry::UnitRegistry;
use crate::telemetry::TelemetryAggregator;

/// Reason reported with the first fleet snapshot.
pub const INITIALIZED_REASON: &str = "Initialized";
/// Route reported with the first fleet snapshot.
pub const INITIALIZED_ROUTE: &str = "/app/initialized";

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum InitState {
    Pending,
    Initialized,
}

/// What caused the transition to [`InitState::Initialized`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum InitTrigger {
    UnitInitialized,
    Fallback,
}

impl SettlePolicy {
    pub fn is_settled(&self, registry: &UnitRegistry) -> bool {
        match self {
            Self::AllAtLeastOnline => registry.len() >= registry.online_count(),
            Self::ExpectedUnits(expected) => registry.initialized_count() >= *expected,
        }
    }
}

pub struct InitializationTracker {
    initialized: AtomicBool,
    policy: SettlePolicy,
}

impl InitializationTracker {
    pub fn new(policy: SettlePolicy) -> Self {
        Self {
            initialized: AtomicBool::new(false),
            policy,
        }
    }

    pub fn state(&self) -> InitState {
        if self.is_initialized() {
            InitState::Initialized
        } else {
            InitState::Pending
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub fn policy(&self) -> SettlePolicy {
        self.policy
    }

    /// Handle a `unit-initialized` notification. Returns `true` if this
    /// call performed the transition.
    pub fn on_unit_initialized(
        &self,
        registry: &UnitRegistry,
        aggregator: &TelemetryAggregator,
    ) -> bool {
        if self.is_initialized() {
            return false;
        }
        if !self.policy.is_settled(registry) {
            debug!(
                units = registry.len(),
                online = registry.online_count(),
                reported = registry.initialized_count(),
                "fleet not settled yet"
            );
            return false;
        }
        self.transition(aggregator, InitTrigger::UnitInitialized)
    }

    /// Handle the fallback timer. Settles unconditionally so at least one
    /// snapshot is sent even if no unit ever reports in.
    pub fn on_fallback(&self, aggregator: &TelemetryAggregator) -> bool {
        if self.is_initialized() {
            return false;
        }
        self.transition(aggregator, InitTrigger::Fallback)
    }

    fn transition(&self, aggregator: &TelemetryAggregator, trigger: InitTrigger) -> bool {
        if self
            .initialized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        info!(%trigger, "fleet initialized");
        aggregator.update_telemetry(INITIALIZED_REASON, INITIALIZED_ROUTE, false);
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::telemetry::tests::{RecordingSink, spec};
    use crate::telemetry::{APP_CATEGORY, TelemetrySink};
    use crate::unit::StaticUnit;

    struct Fixture {
        sink: Arc<RecordingSink>,
        registry: Arc<UnitRegistry>,
        aggregator: TelemetryAggregator,
    }

    fn fixture() -> Fixture {
        let sink = RecordingSink::new();
        let registry = Arc::new(UnitRegistry::new());
        let dyn_sink: Arc<dyn TelemetrySink> = sink.clone();
        let aggregator = TelemetryAggregator::new(Arc::clone(&registry), dyn_sink);
        Fixture {
            sink,
            registry,
            aggregator,
        }
    }

    impl Fixture {
        fn add(&self, name: &str, online: bool) {
            let mut s = spec(name, 1, 0, 0);
            s.online = online;
            self.registry
                .register(Arc::new(StaticUnit::new(s, self.sink.clone())))
                .unwrap();
        }

        fn initialized_sends(&self) -> usize {
            self.sink.count(APP_CATEGORY, INITIALIZED_REASON)
        }
    }

    #[test]
    fn first_unit_report_initializes_fleet() {
        let f = fixture();
        let tracker = InitializationTracker::new(SettlePolicy::AllAtLeastOnline);
        f.add("a", true);

        assert_eq!(tracker.state(), InitState::Pending);
        assert!(tracker.on_unit_initialized(&f.registry, &f.aggregator));
        assert_eq!(tracker.state(), InitState::Initialized);

        let events = f.sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].route, INITIALIZED_ROUTE);
    }

    #[test]
    fn repeated_triggers_send_nothing_more() {
        let f = fixture();
        let tracker = InitializationTracker::new(SettlePolicy::AllAtLeastOnline);
        f.add("a", true);
        f.add("b", false);

        assert!(tracker.on_unit_initialized(&f.registry, &f.aggregator));
        assert!(!tracker.on_unit_initialized(&f.registry, &f.aggregator));
        assert!(!tracker.on_fallback(&f.aggregator));
        assert_eq!(f.initialized_sends(), 1);
    }

    #[test]
    fn fallback_alone_initializes_empty_fleet() {
        let f = fixture();
        let tracker = InitializationTracker::new(SettlePolicy::AllAtLeastOnline);

        assert!(tracker.on_fallback(&f.aggregator));
        assert!(tracker.is_initialized());
        assert_eq!(f.initialized_sends(), 1);
        assert_eq!(f.sink.events()[0].metrics["Total units"], 0);
    }

    #[test]
    fn expected_units_policy_waits_for_reports() {
        let f = fixture();
        let tracker = InitializationTracker::new(SettlePolicy::ExpectedUnits(2));
        f.add("a", true);
        f.add("b", true);

        f.registry.mark_initialized("a").unwrap();
        assert!(!tracker.on_unit_initialized(&f.registry, &f.aggregator));
        assert_eq!(f.initialized_sends(), 0);

        f.registry.mark_initialized("b").unwrap();
        assert!(tracker.on_unit_initialized(&f.registry, &f.aggregator));
        assert_eq!(f.initialized_sends(), 1);
    }

    #[test]
    fn fallback_overrides_unsettled_policy() {
        let f = fixture();
        let tracker = InitializationTracker::new(SettlePolicy::ExpectedUnits(5));
        f.add("a", true);

        assert!(!tracker.on_unit_initialized(&f.registry, &f.aggregator));
        assert!(tracker.on_fallback(&f.aggregator));
        assert_eq!(f.initialized_sends(), 1);
    }

    #[test]
    fn failing_sink_still_completes_transition() {
        let sink = RecordingSink::failing();
        let registry = Arc::new(UnitRegistry::new());
        let aggregator = TelemetryAggregator::new(Arc::clone(&registry), sink);
        let tracker = InitializationTracker::new(SettlePolicy::AllAtLeastOnline);

        assert!(tracker.on_unit_initialized(&registry, &aggregator));
        assert!(tracker.is_initialized());
    }

    #[test]
    fn concurrent_triggers_initialize_once() {
        let f = Arc::new(fixture());
        let tracker = Arc::new(InitializationTracker::new(SettlePolicy::AllAtLeastOnline));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let f = Arc::clone(&f);
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    if i % 2 == 0 {
                        tracker.on_fallback(&f.aggregator)
                    } else {
                        tracker.on_unit_initialized(&f.registry, &f.aggregator)
                    }
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(f.initialized_sends(), 1);
    }
}
