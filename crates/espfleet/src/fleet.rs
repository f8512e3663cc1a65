//! Shared wiring for commands that need the coordinator: manifest and
//! fleet file loading, sink selection, and unit registration.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use espfleet_api::TelemetryClient;
use espfleet_config::Config;
use espfleet_core::{
    AppManifest, CoreError, FleetApp, FleetFile, HttpSink, LogSink, StaticUnit, TelemetrySink,
};
use tracing::{debug, warn};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Input files ──────────────────────────────────────────────────────

/// Load the manifest named by `--manifest`, or an empty one.
pub fn load_manifest(global: &GlobalOpts) -> Result<AppManifest, CliError> {
    let Some(path) = global.manifest.as_deref() else {
        return Ok(AppManifest::default());
    };
    AppManifest::from_path(path).map_err(|e| input_error("app manifest", path, &e))
}

pub fn load_fleet(path: &Path) -> Result<FleetFile, CliError> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| input_error("fleet", path, &e))?;
    FleetFile::from_json_str(&contents).map_err(|e| match e {
        CoreError::Fleet { message } => CliError::Input {
            kind: "fleet".into(),
            path: path.display().to_string(),
            reason: message,
        },
        other => other.into(),
    })
}

fn input_error(kind: &str, path: &Path, err: &dyn std::fmt::Display) -> CliError {
    CliError::Input {
        kind: kind.into(),
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

// ── Sink selection ───────────────────────────────────────────────────

/// The telemetry sink in use, kept concrete so it can be flushed.
pub enum Sink {
    Http(Arc<HttpSink>),
    Log(Arc<LogSink>),
}

impl Sink {
    /// HTTP delivery when enabled in config and not suppressed by
    /// `--no-telemetry`; logging otherwise.
    pub fn from_config(cfg: &Config, app_id: &str, global: &GlobalOpts) -> Result<Self, CliError> {
        let initial_timeout = Duration::from_secs(cfg.telemetry.initial_timeout_secs);
        if global.no_telemetry || !cfg.telemetry.enabled {
            debug!("telemetry disabled, events will be logged only");
            return Ok(Self::Log(Arc::new(LogSink::new(initial_timeout))));
        }

        let telemetry = espfleet_config::to_telemetry_config(cfg, app_id)?;
        let transport = espfleet_config::to_transport_config(cfg);
        let client = TelemetryClient::new(telemetry, &transport).map_err(CoreError::from)?;
        debug!(
            tracker = %client.config().base_url,
            visitor = client.visitor_id(),
            "telemetry enabled"
        );
        Ok(Self::Http(Arc::new(HttpSink::new(client))))
    }

    pub fn as_dyn(&self) -> Arc<dyn TelemetrySink> {
        match self {
            Self::Http(sink) => Arc::clone(sink) as Arc<dyn TelemetrySink>,
            Self::Log(sink) => Arc::clone(sink) as Arc<dyn TelemetrySink>,
        }
    }

    /// Wait for in-flight deliveries, giving up after `limit`.
    pub async fn flush(&self, limit: Duration) {
        let Self::Http(sink) = self else { return };
        if tokio::time::timeout(limit, sink.flush()).await.is_err() {
            warn!(
                pending = sink.pending(),
                "telemetry deliveries still running at exit"
            );
        }
    }
}

// ── Coordinator ──────────────────────────────────────────────────────

pub fn build_app(cfg: &Config, manifest: AppManifest, sink: &Sink) -> Result<FleetApp, CliError> {
    Ok(FleetApp::new(
        espfleet_config::to_fleet_config(cfg),
        manifest,
        sink.as_dyn(),
    )?)
}

/// Register every unit of `fleet` in file order.
pub fn register_units(app: &FleetApp, fleet: &FleetFile) -> Result<Vec<Arc<StaticUnit>>, CliError> {
    fleet
        .units
        .iter()
        .map(|spec| {
            let unit = Arc::new(StaticUnit::new(spec.clone(), Arc::clone(app.sink())));
            app.register_unit(Arc::clone(&unit) as _)?;
            Ok(unit)
        })
        .collect()
}
