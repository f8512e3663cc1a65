//! Errors surfaced to the terminal.
//!
//! Library errors are folded into `CliError`, which carries a miette help
//! line and decides the exit code.

use miette::Diagnostic;
use thiserror::Error;

use espfleet_config::ConfigError;
use espfleet_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Telemetry ────────────────────────────────────────────────────
    #[error("Telemetry delivery failed: {message}")]
    #[diagnostic(
        code(espfleet::telemetry),
        help(
            "Check that the tracker host is reachable, or run with --no-telemetry.\n\
             Try: espfleet config show"
        )
    )]
    Telemetry { message: String },

    // ── Lookups ──────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(espfleet::not_found),
        help("Run: espfleet {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("{resource_type} '{identifier}' already exists")]
    #[diagnostic(code(espfleet::conflict))]
    Conflict {
        resource_type: String,
        identifier: String,
    },

    // ── Input files ──────────────────────────────────────────────────
    #[error("Could not load {kind} from {path}: {reason}")]
    #[diagnostic(
        code(espfleet::input),
        help("The file must be a JSON document; see `espfleet --help` for the expected shape.")
    )]
    Input {
        kind: String,
        path: String,
        reason: String,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(espfleet::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration file already exists")]
    #[diagnostic(
        code(espfleet::config_exists),
        help(
            "Use --force to overwrite it.\n\
             Path: {path}"
        )
    )]
    ConfigExists { path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(espfleet::config),
        help("Check the config file and any ESPFLEET_* environment variables.")
    )]
    Config { message: String },

    // ── Internal ─────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(espfleet::internal))]
    Internal { message: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(espfleet::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Exit status for `std::process::exit`.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Telemetry { .. } => exit_code::CONNECTION,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } | Self::ConfigExists { .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::Input { .. } | Self::Config { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── From core ────────────────────────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Telemetry { message, status } => CliError::Telemetry {
                message: match status {
                    Some(s) => format!("{message} (HTTP {s})"),
                    None => message,
                },
            },

            CoreError::UnitNotFound { name } => CliError::NotFound {
                resource_type: "unit".into(),
                identifier: name,
                list_command: "metrics --fleet <FILE>".into(),
            },

            CoreError::DuplicateUnit { name } => CliError::Conflict {
                resource_type: "unit".into(),
                identifier: name,
            },

            CoreError::Manifest { message } => CliError::Input {
                kind: "app manifest".into(),
                path: "--manifest".into(),
                reason: message,
            },

            CoreError::Fleet { message } => CliError::Input {
                kind: "fleet".into(),
                path: "--fleet".into(),
                reason: message,
            },

            CoreError::Config { message } => CliError::Config { message },

            CoreError::Io(e) => CliError::Io(e),

            other @ (CoreError::UnitFailed { .. }
            | CoreError::AlreadyStarted
            | CoreError::Catalog { .. }) => CliError::Internal {
                message: other.to_string(),
            },
        }
    }
}

// ── From config ──────────────────────────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}
