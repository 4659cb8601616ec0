//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls per-cycle and error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[inline]
pub fn json_mode() -> bool {
    JSON_MODE.get().copied().unwrap_or(false)
}

#[derive(Parser, Debug)]
#[command(
    name = "proxmotor",
    version,
    about = "Proximity and temperature gated DC motor controller"
)]
pub struct Cli {
    /// Path to config TOML (a missing file means built-in defaults)
    #[arg(long, value_name = "FILE", default_value = "etc/proxmotor.toml")]
    pub config: PathBuf,

    /// Print one JSON object per cycle and log as JSON lines
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the control loop until Ctrl-C
    Run {
        /// Stop after this many cycles
        #[arg(long, value_name = "N")]
        cycles: Option<u64>,
        /// Override timing.period_ms from the config
        #[arg(long, value_name = "MS")]
        period_ms: Option<u64>,
    },
    /// Take one reading from every sensor and print it
    SelfCheck,
    /// Validate the config and print "ok"
    Health,
}
