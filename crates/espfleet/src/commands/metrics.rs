//! One-shot fleet metric computation. Nothing is sent.

use std::sync::Arc;
use std::time::Duration;

use tabled::Tabled;

use espfleet_config::Config;
use espfleet_core::{AppManifest, FleetMetrics, LogSink};

use crate::cli::{FleetFileArgs, GlobalOpts};
use crate::error::CliError;
use crate::fleet::{self, Sink};
use crate::output;

#[derive(Tabled)]
pub(crate) struct MetricRow {
    #[tabled(rename = "Metric")]
    name: String,
    #[tabled(rename = "Value")]
    value: u64,
}

/// Metric table in transport order.
pub(crate) fn metrics_table(metrics: &FleetMetrics) -> String {
    let rows: Vec<MetricRow> = metrics
        .to_metric_map()
        .into_iter()
        .map(|(name, value)| MetricRow { name, value })
        .collect();
    tabled::Table::new(rows)
        .with(tabled::settings::Style::rounded())
        .to_string()
}

/// `name<TAB>value` lines in transport order.
pub(crate) fn metrics_plain(metrics: &FleetMetrics) -> String {
    metrics
        .to_metric_map()
        .iter()
        .map(|(name, value)| format!("{name}\t{value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn handle(
    args: &FleetFileArgs,
    cfg: &Config,
    manifest: AppManifest,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let fleet_file = fleet::load_fleet(&args.fleet)?;
    let sink = Sink::Log(Arc::new(LogSink::new(Duration::from_secs(
        cfg.telemetry.initial_timeout_secs,
    ))));
    let app = fleet::build_app(cfg, manifest, &sink)?;
    fleet::register_units(&app, &fleet_file)?;

    let metrics = app.compute_metrics();
    let rendered = output::render_single(global.output, &metrics, metrics_table, metrics_plain)?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}
