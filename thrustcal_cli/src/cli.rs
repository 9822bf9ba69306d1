//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "thrustcal", version, about = "ESC thrust-curve calibration")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/thrustcal.toml")]
    pub config: PathBuf,

    /// Log and report as JSON instead of pretty text
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
    /// Run a calibration sweep and fit the expo coefficient
    Calibrate {
        /// Override the ESC under test (index in the command frame)
        #[arg(long, value_name = "IDX")]
        esc_index: Option<usize>,
        /// Override safety: max run time in ms (takes precedence over config)
        #[arg(long, value_name = "MS")]
        max_run_ms: Option<u64>,
        /// Override the lower edge of the working band (fraction of span)
        #[arg(long, value_name = "FRAC")]
        spin_min: Option<f64>,
        /// Override the upper edge of the working band (fraction of span)
        #[arg(long, value_name = "FRAC")]
        spin_max: Option<f64>,
        /// Print every recorded sample before the report
        #[arg(long, action = ArgAction::SetTrue)]
        print_samples: bool,
    },
    /// Quick health check (link present / config valid / sim ok)
    SelfCheck,
}
