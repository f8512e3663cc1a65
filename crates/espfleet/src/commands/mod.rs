//! Command dispatch: bridges CLI args -> core components -> output formatting.

pub mod capabilities;
pub mod config_cmd;
pub mod metrics;
pub mod run;
pub mod tasks;

use espfleet_config::Config;
use espfleet_core::AppManifest;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a command that needs the loaded config and manifest.
pub async fn dispatch(
    cmd: Command,
    cfg: &Config,
    manifest: AppManifest,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Capabilities(args) => capabilities::handle(args, cfg, &manifest, global),
        Command::Tasks => tasks::handle(manifest, global),
        Command::Metrics(args) => metrics::handle(&args, cfg, manifest, global),
        Command::Run(args) => run::handle(args, cfg, manifest, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal {
            message: "command dispatched without a handler".into(),
        }),
    }
}
