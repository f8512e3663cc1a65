//! Long-running coordinator: register a fleet, let it initialize, report
//! until interrupted, then shut down cleanly.

use std::future;
use std::time::Duration;

use serde::Serialize;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use espfleet_config::Config;
use espfleet_core::{AppManifest, FleetMetrics, FleetUnit, InitState};

use crate::cli::{GlobalOpts, RunArgs};
use crate::commands::metrics::{metrics_plain, metrics_table};
use crate::error::CliError;
use crate::fleet::{self, Sink};
use crate::output;

const UPDATE_REASON: &str = "Update";
const UPDATE_ROUTE: &str = "/app/update";

/// What the run ended with.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunSummary {
    state: String,
    units: usize,
    online: usize,
    metrics: FleetMetrics,
}

pub async fn handle(
    args: RunArgs,
    cfg: &Config,
    manifest: AppManifest,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let fleet_file = fleet::load_fleet(&args.fleet.fleet)?;
    let sink = Sink::from_config(cfg, &manifest.id, global)?;
    let app = fleet::build_app(cfg, manifest, &sink)?;
    let color = output::should_color(global.color);

    app.start().await?;
    let units = fleet::register_units(&app, &fleet_file)?;
    for unit in units.iter().filter(|u| u.is_online()) {
        app.unit_initialized(unit.name())?;
    }

    if !global.quiet {
        let state = app.init_state();
        eprintln!(
            "{} {} units ({} online), fleet {}",
            output::status("▸", true, color),
            app.registry().len(),
            app.registry().online_count(),
            output::status(&state.to_string(), state == InitState::Initialized, color),
        );
    }

    let deadline = async {
        match args.duration {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => future::pending().await,
        }
    };
    tokio::pin!(deadline);

    let mut ticker = args.update_interval.and_then(update_ticker);

    loop {
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                res?;
                info!("interrupt received, shutting down");
                break;
            }
            () = &mut deadline => {
                debug!("run duration elapsed");
                break;
            }
            () = next_tick(&mut ticker) => {
                app.update_telemetry(UPDATE_REASON, UPDATE_ROUTE, true);
            }
        }
    }

    let summary = RunSummary {
        state: app.init_state().to_string(),
        units: app.registry().len(),
        online: app.registry().online_count(),
        metrics: app.compute_metrics(),
    };

    app.shutdown().await;
    sink.flush(Duration::from_secs(cfg.telemetry.timeout_secs)).await;

    let rendered = output::render_single(
        global.output,
        &summary,
        |s| format!("State: {}\n{}", s.state, metrics_table(&s.metrics)),
        |s| format!("state\t{}\n{}", s.state, metrics_plain(&s.metrics)),
    )?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}

/// Periodic update ticker, first firing one period from now. A period
/// too large to schedule means no updates at all.
fn update_ticker(secs: u64) -> Option<Interval> {
    let period = Duration::from_secs(secs);
    let start = Instant::now().checked_add(period)?;
    let mut interval = tokio::time::interval_at(start, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    Some(interval)
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => future::pending().await,
    }
}
