// ── Capability resolution ──
//
// The bundled baseline catalog overlaid with the capabilities an app
// declares itself. Overlay is whole-descriptor replacement by id.

use std::collections::BTreeMap;

use crate::error::CoreError;
use crate::model::CapabilityDescriptor;

/// Baseline catalog bundled with the crate.
const BASELINE_JSON: &str = include_str!("../assets/capabilities.json");

/// Capability id -> descriptor.
pub type CapabilityMap = BTreeMap<String, CapabilityDescriptor>;

/// Overlay `overrides` onto `baseline`.
///
/// An override replaces the baseline descriptor with the same id as a
/// whole; fields are never merged individually. Baseline entries without
/// an override pass through unchanged, and override-only ids are added.
pub fn merge_capabilities(baseline: &CapabilityMap, overrides: &CapabilityMap) -> CapabilityMap {
    let mut merged = baseline.clone();
    for (id, descriptor) in overrides {
        merged.insert(id.clone(), descriptor.clone());
    }
    merged
}

/// Parse the bundled baseline catalog.
pub fn builtin_baseline() -> Result<CapabilityMap, CoreError> {
    serde_json::from_str(BASELINE_JSON).map_err(|e| CoreError::Catalog {
        message: e.to_string(),
    })
}

/// The merged capability catalog, computed once at construction.
#[derive(Debug, Clone)]
pub struct CapabilityRegistry {
    merged: CapabilityMap,
}

impl CapabilityRegistry {
    pub fn new(baseline: &CapabilityMap, overrides: &CapabilityMap) -> Self {
        Self {
            merged: merge_capabilities(baseline, overrides),
        }
    }

    /// Registry over the bundled baseline plus `overrides`.
    pub fn with_builtin_baseline(overrides: &CapabilityMap) -> Result<Self, CoreError> {
        Ok(Self::new(&builtin_baseline()?, overrides))
    }

    pub fn get_capabilities(&self) -> &CapabilityMap {
        &self.merged
    }

    /// Look up one capability. A miss is not an error.
    pub fn get_capability(&self, id: &str) -> Option<&CapabilityDescriptor> {
        self.merged.get(id)
    }

    pub fn len(&self) -> usize {
        self.merged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.merged.is_empty()
    }
}
