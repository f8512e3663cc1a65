// ── Runtime fleet configuration ──
//
// Describes *how* the coordinator behaves. Built by the config crate or
// the CLI and handed in; core never reads config files.

use std::time::Duration;

/// When the fleet counts as settled after a unit reports initialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SettlePolicy {
    /// Settled once the number of known units is at least the number of
    /// online units. Loose, but never waits on units that stay offline.
    #[default]
    AllAtLeastOnline,
    /// Settled once this many units have reported initialized.
    ExpectedUnits(usize),
}

/// Configuration for a [`FleetApp`](crate::FleetApp).
#[derive(Debug, Clone)]
pub struct FleetConfig {
    /// How long before the tracker's visit window ends the fallback
    /// timer fires.
    pub fallback_margin: Duration,
    pub settle_policy: SettlePolicy,
    /// Language used to resolve capability titles.
    pub language: String,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            fallback_margin: Duration::from_secs(1),
            settle_policy: SettlePolicy::default(),
            language: "en".into(),
        }
    }
}

impl FleetConfig {
    /// Delay before the fallback initialization fires, given the tracker's
    /// visit window.
    pub fn fallback_delay(&self, initial_timeout: Duration) -> Duration {
        initial_timeout.saturating_sub(self.fallback_margin)
    }
}
