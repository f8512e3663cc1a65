//! Configuration for the espfleet coordinator.
//!
//! A TOML file layered under `ESPFLEET_*` environment overrides, and the
//! translation into `espfleet_core::FleetConfig` plus the telemetry
//! transport settings of `espfleet_api`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use espfleet_api::{TelemetryConfig, TlsMode, TransportConfig};
use espfleet_core::{FleetConfig, SettlePolicy};

/// Prefix for environment overrides. Nested keys use `__`, e.g.
/// `ESPFLEET_TELEMETRY__SITE_ID=7`.
pub const ENV_PREFIX: &str = "ESPFLEET_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── File layout ─────────────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub telemetry: TelemetrySection,

    #[serde(default)]
    pub fleet: FleetSection,
}

/// Where and how usage telemetry is reported.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TelemetrySection {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Tracker base URL. A bare host name is taken as `https://<host>`.
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_site_id")]
    pub site_id: u32,

    /// Length of the tracker's visit window, in seconds. The fallback
    /// initialization fires shortly before it ends.
    #[serde(default = "default_initial_timeout")]
    pub initial_timeout_secs: u64,

    /// Per-request HTTP timeout, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub insecure: bool,

    /// Path to a custom CA certificate (PEM).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_host(),
            site_id: default_site_id(),
            initial_timeout_secs: default_initial_timeout(),
            timeout_secs: default_timeout(),
            insecure: false,
            ca_cert: None,
        }
    }
}

/// Coordinator behaviour.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FleetSection {
    /// Language for capability titles.
    #[serde(default = "default_language")]
    pub language: String,

    /// When set, the fleet counts as settled once this many units have
    /// reported initialized. Otherwise the online-count heuristic applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_units: Option<usize>,

    /// Seconds before the end of the visit window the fallback fires.
    #[serde(default = "default_fallback_margin")]
    pub fallback_margin_secs: u64,
}

impl Default for FleetSection {
    fn default() -> Self {
        Self {
            language: default_language(),
            expected_units: None,
            fallback_margin_secs: default_fallback_margin(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_host() -> String {
    "https://espeasy.homey.joolee.nl".into()
}
fn default_site_id() -> u32 {
    2
}
fn default_initial_timeout() -> u64 {
    1800
}
fn default_timeout() -> u64 {
    30
}
fn default_language() -> String {
    "en".into()
}
fn default_fallback_margin() -> u64 {
    1
}

// ── Location ────────────────────────────────────────────────────────

/// `config.toml` under the platform config directory for espfleet.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "espfleet", "espfleet").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("espfleet");
    p
}

// ── Load ────────────────────────────────────────────────────────────

/// Load the config from `path` (or the canonical path) plus environment.
/// A missing file is not an error; defaults apply.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);

    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.telemetry.site_id == 0 {
        return Err(ConfigError::Validation {
            field: "telemetry.site_id".into(),
            reason: "must be greater than zero".into(),
        });
    }
    if config.fleet.language.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "fleet.language".into(),
            reason: "must not be empty".into(),
        });
    }
    if config.fleet.expected_units == Some(0) {
        return Err(ConfigError::Validation {
            field: "fleet.expected_units".into(),
            reason: "must be at least 1 when set".into(),
        });
    }
    tracker_url(&config.telemetry).map(drop)
}

// ── Save ────────────────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path` (or the canonical path).
pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, toml::to_string_pretty(cfg)?)?;
    Ok(path)
}

// ── Translation ─────────────────────────────────────────────────────

pub fn to_fleet_config(cfg: &Config) -> FleetConfig {
    FleetConfig {
        fallback_margin: Duration::from_secs(cfg.fleet.fallback_margin_secs),
        settle_policy: cfg
            .fleet
            .expected_units
            .map_or(SettlePolicy::AllAtLeastOnline, SettlePolicy::ExpectedUnits),
        language: cfg.fleet.language.clone(),
    }
}

/// Tracker endpoint settings for the app identified by `app_id`.
pub fn to_telemetry_config(cfg: &Config, app_id: &str) -> Result<TelemetryConfig, ConfigError> {
    Ok(TelemetryConfig {
        base_url: tracker_url(&cfg.telemetry)?,
        site_id: cfg.telemetry.site_id,
        app_id: app_id.to_owned(),
        initial_timeout: Duration::from_secs(cfg.telemetry.initial_timeout_secs),
    })
}

pub fn to_transport_config(cfg: &Config) -> TransportConfig {
    let tls = if cfg.telemetry.insecure {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca) = cfg.telemetry.ca_cert {
        TlsMode::CustomCa(ca.clone())
    } else {
        TlsMode::System
    };

    TransportConfig {
        tls,
        ..TransportConfig::default()
    }
    .with_timeout(Duration::from_secs(cfg.telemetry.timeout_secs))
}

fn tracker_url(section: &TelemetrySection) -> Result<Url, ConfigError> {
    let raw = section.host.trim();
    let candidate = if raw.contains("://") {
        raw.to_owned()
    } else {
        format!("https://{raw}")
    };

    let url: Url = candidate.parse().map_err(|_| ConfigError::Validation {
        field: "telemetry.host".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "telemetry.host".into(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(url)
}
