// ── Fleet metric snapshot ──

use indexmap::IndexMap;
use serde::Serialize;

/// Fleet-wide usage metrics, computed on demand and never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FleetMetrics {
    #[serde(rename = "Total tasks")]
    pub total_tasks: usize,
    #[serde(rename = "Total tasks in use")]
    pub total_tasks_in_use: usize,
    #[serde(rename = "Total units")]
    pub total_units: usize,
    #[serde(rename = "Total GPIO used")]
    pub total_gpio_used: usize,
}

impl FleetMetrics {
    /// The metric mapping sent to the telemetry transport.
    pub fn to_metric_map(&self) -> IndexMap<String, u64> {
        [
            ("Total tasks", self.total_tasks),
            ("Total tasks in use", self.total_tasks_in_use),
            ("Total units", self.total_units),
            ("Total GPIO used", self.total_gpio_used),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_owned(), to_metric(value)))
        .collect()
    }
}

/// Widen a count for the wire; saturates on (theoretical) overflow.
pub(crate) fn to_metric(count: usize) -> u64 {
    u64::try_from(count).unwrap_or(u64::MAX)
}
