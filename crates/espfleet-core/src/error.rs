// ── Core error types ──
//
// Errors surfaced by espfleet-core. Transport-layer failures from
// espfleet-api are folded into `Telemetry` so callers never match on
// HTTP details directly.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Telemetry errors ─────────────────────────────────────────────
    #[error("Telemetry delivery failed: {message}")]
    Telemetry {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Fleet errors ─────────────────────────────────────────────────
    #[error("Unit not found: {name}")]
    UnitNotFound { name: String },

    #[error("Unit already registered: {name}")]
    DuplicateUnit { name: String },

    #[error("Unit {unit} failed: {message}")]
    UnitFailed { unit: String, message: String },

    // ── Lifecycle errors ─────────────────────────────────────────────
    #[error("Fleet coordinator already started")]
    AlreadyStarted,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Invalid capability catalog: {message}")]
    Catalog { message: String },

    #[error("Invalid app manifest: {message}")]
    Manifest { message: String },

    #[error("Invalid fleet description: {message}")]
    Fleet { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<espfleet_api::Error> for CoreError {
    fn from(err: espfleet_api::Error) -> Self {
        match err {
            espfleet_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid telemetry URL: {e}"),
            },
            espfleet_api::Error::Tls(msg) => CoreError::Config {
                message: format!("Telemetry TLS setup failed: {msg}"),
            },
            other => CoreError::Telemetry {
                status: other.status(),
                message: other.to_string(),
            },
        }
    }
}
