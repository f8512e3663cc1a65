// ── Fleet units ──
//
// `FleetUnit` is the narrow contract the core needs from a unit. The
// unit's own bookkeeping stays behind it; `StaticUnit` is the
// implementation used for units described by a fleet file.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use indexmap::IndexMap;

use crate::error::CoreError;
use crate::model::metrics::to_metric;
use crate::model::{
    GpioDescriptor, SYSTEM_INFO_NAME, SYSTEM_INFO_PLUGIN, SensorDescriptor, TaskDescriptor,
    UnitSpec,
};
use crate::telemetry::{TelemetryEvent, TelemetrySink, UNIT_CATEGORY};

/// A discovered device, as seen by the fleet core.
pub trait FleetUnit: Send + Sync {
    fn name(&self) -> &str;

    fn is_online(&self) -> bool;

    fn tasks(&self) -> &[TaskDescriptor];

    fn sensors(&self) -> &[SensorDescriptor];

    fn gpios(&self) -> &[GpioDescriptor];

    /// Tasks with the given plugin id and name. Tasks already exposed as
    /// sensors are skipped unless `include_sensors` is set.
    fn tasks_by_name(
        &self,
        plugin_id: u32,
        name: &str,
        include_sensors: bool,
    ) -> Vec<&TaskDescriptor> {
        self.tasks()
            .iter()
            .filter(|t| t.matches(plugin_id, name, include_sensors))
            .collect()
    }

    /// Compute and send this unit's own telemetry.
    fn update_telemetry(&self, reason: &str, recurse: bool) -> Result<(), CoreError>;
}

/// A unit with a fixed task/sensor/GPIO layout and a mutable online flag.
pub struct StaticUnit {
    name: String,
    online: AtomicBool,
    tasks: Vec<TaskDescriptor>,
    sensors: Vec<SensorDescriptor>,
    gpios: Vec<GpioDescriptor>,
    sink: Arc<dyn TelemetrySink>,
}

impl StaticUnit {
    pub fn new(spec: UnitSpec, sink: Arc<dyn TelemetrySink>) -> Self {
        Self {
            name: spec.name,
            online: AtomicBool::new(spec.online),
            tasks: spec.tasks,
            sensors: spec.sensors,
            gpios: spec.gpios,
            sink,
        }
    }

    /// Update the online flag, returning the previous value.
    pub fn set_online(&self, online: bool) -> bool {
        self.online.swap(online, Ordering::AcqRel)
    }

    /// Per-unit metrics, in the order they are reported.
    pub fn metrics(&self) -> IndexMap<String, u64> {
        let system_info = self
            .tasks_by_name(SYSTEM_INFO_PLUGIN, SYSTEM_INFO_NAME, true)
            .len();
        [
            ("Tasks", self.tasks.len()),
            ("Sensors", self.sensors.len()),
            ("GPIOs", self.gpios.len()),
            ("System info tasks", system_info),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_owned(), to_metric(value)))
        .collect()
    }
}

impl FleetUnit for StaticUnit {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    fn tasks(&self) -> &[TaskDescriptor] {
        &self.tasks
    }

    fn sensors(&self) -> &[SensorDescriptor] {
        &self.sensors
    }

    fn gpios(&self) -> &[GpioDescriptor] {
        &self.gpios
    }

    // Static units have no children, so `recurse` stops here.
    fn update_telemetry(&self, reason: &str, _recurse: bool) -> Result<(), CoreError> {
        let route = format!("/unit/{}", reason.to_lowercase());
        self.sink
            .send(TelemetryEvent::new(UNIT_CATEGORY, reason, route, self.metrics()))
            .map_err(|e| CoreError::UnitFailed {
                unit: self.name.clone(),
                message: e.to_string(),
            })
    }
}
