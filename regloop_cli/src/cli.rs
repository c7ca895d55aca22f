//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

/// Environment override for the simulated probe's starting temperature (°C).
pub const ENV_SIM_TEMP: &str = "REGLOOP_SIM_TEMP";
/// Environment override for the simulated probe's drift per conversion (°C).
pub const ENV_SIM_DRIFT: &str = "REGLOOP_SIM_DRIFT";

#[derive(Parser, Debug)]
#[command(name = "regloop", version, about = "Voltage regulation loop")]
pub struct Cli {
    /// Path to config TOML; a missing file means built-in defaults
    #[arg(long, value_name = "FILE", default_value = "etc/regloop.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty
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
    /// Run the regulation loop until Ctrl-C (or for a fixed number of iterations)
    Run {
        /// Stop after this many iterations
        #[arg(long, value_name = "N")]
        iterations: Option<u64>,
        /// Inject a remote write of this voltage before the first iteration
        #[arg(long, value_name = "VOLTS", allow_negative_numbers = true)]
        remote_voltage: Option<f32>,
        /// Print run statistics on exit
        #[arg(long, action = ArgAction::SetTrue)]
        stats: bool,
    },
    /// Show the two register words for a float
    Encode {
        #[arg(long, allow_negative_numbers = true)]
        value: f32,
    },
    /// Join two register words (decimal or 0x-prefixed hex) into a float
    Decode {
        #[arg(long, value_parser = parse_word)]
        high: u16,
        #[arg(long, value_parser = parse_word)]
        low: u16,
    },
    /// Quick health check (sensor and network presence / sim ok)
    SelfCheck,
    /// Health check for operational monitoring
    Health,
}

fn parse_word(s: &str) -> Result<u16, String> {
    let t = s.trim();
    let parsed = match t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => t.parse::<u16>(),
    };
    parsed.map_err(|e| format!("invalid register word '{s}': {e}"))
}
