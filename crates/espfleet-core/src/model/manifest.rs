// ── Application manifest ──
//
// The subset of the app manifest the fleet core consumes: custom
// capabilities and the installed drivers with their task types.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::capability::{CapabilityDescriptor, LocalizedText};
use crate::error::CoreError;

/// A task type a driver can pair, e.g. plugin 4 "Environment - DS18b20".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskType {
    pub plugin: u32,
    pub name: String,
}

impl TaskType {
    /// Display label, `"<plugin> - <name>"`.
    pub fn label(&self) -> String {
        format!("{} - {}", self.plugin, self.name)
    }
}

/// An installed driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverDescriptor {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_types: Option<Vec<TaskType>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppManifest {
    #[serde(default = "default_app_id")]
    pub id: String,
    #[serde(default)]
    pub capabilities: BTreeMap<String, CapabilityDescriptor>,
    #[serde(default)]
    pub drivers: Vec<DriverDescriptor>,
}

fn default_app_id() -> String {
    "espfleet".into()
}

impl Default for AppManifest {
    fn default() -> Self {
        Self {
            id: default_app_id(),
            capabilities: BTreeMap::new(),
            drivers: Vec::new(),
        }
    }
}

impl AppManifest {
    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        serde_json::from_str(json).map_err(|e| CoreError::Manifest {
            message: e.to_string(),
        })
    }

    /// Read and parse a manifest file.
    pub fn from_path(path: &Path) -> Result<Self, CoreError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Installed drivers keyed by driver id.
    pub fn drivers_by_id(&self) -> BTreeMap<String, DriverDescriptor> {
        self.drivers
            .iter()
            .map(|d| (d.id.clone(), d.clone()))
            .collect()
    }
}
