//! Fleet coordination core for a home-automation app managing ESPEasy units.
//!
//! The crate owns the coordination logic between discovered units and the
//! usage-telemetry transport:
//!
//! - **[`FleetApp`]**: process-lifetime facade. [`start()`](FleetApp::start)
//!   subscribes to unit notifications and arms the fallback timer;
//!   [`shutdown()`](FleetApp::shutdown) stops it and reports the uninit hit.
//!
//! - **[`UnitRegistry`]**: concurrent set of known units (`DashMap`) with a
//!   synchronous `unit-initialized` observer channel.
//!
//! - **[`InitializationTracker`]**: decides, exactly once per process, when
//!   the fleet counts as initialized, either when a unit report settles the
//!   fleet or when the fallback timer fires.
//!
//! - **[`TelemetryAggregator`]**: reduces the online fleet into
//!   [`FleetMetrics`] and hands it to a [`TelemetrySink`], optionally
//!   fanning out per-unit updates.
//!
//! - **[`CapabilityRegistry`]** / **[`TaskTypeCatalog`]**: the merged
//!   capability catalog and the naturally sorted list of supported task
//!   types.

pub mod app;
pub mod capability;
pub mod config;
pub mod error;
pub mod model;
pub mod registry;
pub mod tasks;
pub mod telemetry;
pub mod tracker;
pub mod unit;

// ── Primary re-exports ──────────────────────────────────────────────
pub use app::FleetApp;
pub use capability::{CapabilityMap, CapabilityRegistry};
pub use config::{FleetConfig, SettlePolicy};
pub use error::CoreError;
pub use registry::{SubscriptionId, UnitRegistry};
pub use tasks::{DriverSource, TaskTypeCatalog};
pub use telemetry::{
    HttpSink, LogSink, TelemetryAggregator, TelemetryEvent, TelemetrySink,
};
pub use tracker::{InitState, InitTrigger, InitializationTracker};
pub use unit::{FleetUnit, StaticUnit};

pub use model::{
    AppManifest, CapabilityDescriptor, CapabilityType, DriverDescriptor, FleetFile, FleetMetrics,
    GpioDescriptor, LocalizedText, SensorDescriptor, TaskDescriptor, TaskType, UnitSpec,
};
