// ── Unit descriptors ──

use serde::{Deserialize, Serialize};

/// Plugin id of the built-in system info task.
pub const SYSTEM_INFO_PLUGIN: u32 = 26;

/// Name under which the system info task is declared.
pub const SYSTEM_INFO_NAME: &str = "Generic - System Info";

/// One task slot configured on a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDescriptor {
    /// Task slot on the unit (1-based, as shown in the unit's web UI).
    pub index: u16,
    pub plugin_id: u32,
    pub name: String,
    /// Set when the host already exposes this task as a sensor device.
    #[serde(default)]
    pub is_sensor: bool,
}

impl TaskDescriptor {
    /// Whether this task has the given plugin id and name. Tasks flagged
    /// as sensors only match when `include_sensors` is set.
    pub fn matches(&self, plugin_id: u32, name: &str, include_sensors: bool) -> bool {
        self.plugin_id == plugin_id && self.name == name && (include_sensors || !self.is_sensor)
    }
}

/// A sensor device the host created from one of the unit's tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorDescriptor {
    pub task_index: u16,
    pub name: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

/// A GPIO pin claimed by a device on the unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpioDescriptor {
    pub pin: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Serializable description of one unit, as found in a fleet file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitSpec {
    pub name: String,
    #[serde(default = "default_online")]
    pub online: bool,
    #[serde(default)]
    pub tasks: Vec<TaskDescriptor>,
    #[serde(default)]
    pub sensors: Vec<SensorDescriptor>,
    #[serde(default)]
    pub gpios: Vec<GpioDescriptor>,
}

fn default_online() -> bool {
    true
}

/// A fleet file: the units to register, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetFile {
    #[serde(default)]
    pub units: Vec<UnitSpec>,
}

impl FleetFile {
    pub fn from_json_str(json: &str) -> Result<Self, crate::CoreError> {
        serde_json::from_str(json).map_err(|e| crate::CoreError::Fleet {
            message: e.to_string(),
        })
    }
}
