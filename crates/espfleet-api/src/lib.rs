// espfleet-api: HTTP delivery of fleet telemetry hits.

pub mod client;
pub mod error;
pub mod transport;

pub use client::{TelemetryClient, TelemetryConfig, TrackingHit};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};

// Re-exported so consumers can hand in a pre-built client.
pub use reqwest;
