// ── Domain model ──
//
// Plain data types shared by every component of the fleet core:
// unit descriptors, capability descriptors, the app manifest and the
// fleet metric snapshot.

pub mod capability;
pub mod manifest;
pub mod metrics;
pub mod unit;

// ── Re-exports ──────────────────────────────────────────────────────

pub use capability::{CapabilityDescriptor, CapabilityType, LocalizedText};
pub use manifest::{AppManifest, DriverDescriptor, TaskType};
pub use metrics::FleetMetrics;
pub use unit::{
    FleetFile, GpioDescriptor, SYSTEM_INFO_NAME, SYSTEM_INFO_PLUGIN, SensorDescriptor,
    TaskDescriptor, UnitSpec,
};
