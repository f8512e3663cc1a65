//! Clap derive structures for the `espfleet` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

// ── Entry ────────────────────────────────────────────────────────────

/// espfleet -- coordinate a fleet of ESPEasy units
#[derive(Debug, Parser)]
#[command(
    name = "espfleet",
    version,
    about = "Coordinate a fleet of ESPEasy units from the command line",
    long_about = "Tracks when a fleet of ESPEasy units has finished starting up,\n\
        reports anonymous fleet usage metrics, and resolves the capability and\n\
        task-type catalogs the app exposes.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Flags shared by every subcommand ─────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config dir)
    #[arg(long, env = "ESPFLEET_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// App manifest JSON (capabilities and drivers)
    #[arg(long, short = 'm', env = "ESPFLEET_MANIFEST", global = true)]
    pub manifest: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "ESPFLEET_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Colorize output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// More log detail; repeat up to three times
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Print nothing but errors
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Log telemetry events instead of sending them
    #[arg(long, env = "ESPFLEET_NO_TELEMETRY", global = true)]
    pub no_telemetry: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

// ── Formats ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Bordered table for terminals
    Table,
    /// Indented JSON
    Json,
    /// JSON on one line
    JsonCompact,
    /// Bare values, one per line
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Color only when stdout is a terminal
    Auto,
    /// Force ANSI colors
    Always,
    /// No ANSI colors
    Never,
}

// ── Subcommands ──────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inspect the merged capability catalog
    #[command(alias = "caps")]
    Capabilities(CapabilitiesArgs),

    /// List supported task types
    Tasks,

    /// Compute fleet metrics for a fleet file
    Metrics(FleetFileArgs),

    /// Run the coordinator over a fleet file until interrupted
    Run(RunArgs),

    /// Config file commands
    Config(ConfigArgs),

    /// Print a shell completion script
    Completions(CompletionsArgs),
}

// ── Capabilities ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CapabilitiesArgs {
    #[command(subcommand)]
    pub command: CapabilitiesCommand,
}

#[derive(Debug, Subcommand)]
pub enum CapabilitiesCommand {
    /// List every capability
    #[command(alias = "ls")]
    List,

    /// Show one capability
    Get {
        /// Capability id, e.g. `measure_temperature`
        id: String,
    },
}

// ── Fleet commands ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct FleetFileArgs {
    /// Fleet description (JSON with a `units` array)
    #[arg(long, short = 'f')]
    pub fleet: PathBuf,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub fleet: FleetFileArgs,

    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(long)]
    pub duration: Option<u64>,

    /// Send a recursive fleet update every N seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub update_interval: Option<u64>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration (file + environment)
    Show,

    /// Print the config file path
    Path,

    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: Shell,
}
