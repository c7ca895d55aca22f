#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! `regloop` command line: run the regulation loop, inspect register words,
//! check devices.

mod cli;
mod error_fmt;
mod logging;
mod run;

use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use regloop_core::RunStats;
use regloop_core::codec::{decode, encode};
use serde_json::json;

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};
use crate::run::{RunArgs, run_loop, self_check};

fn main() -> ExitCode {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    match real_main(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if JSON_MODE.get().copied().unwrap_or(false) {
                eprintln!("{}", format_error_json(&e));
            } else {
                eprintln!("{}", humanize(&e));
            }
            tracing::debug!(error = ?e, "command failed");
            let code = exit_code_for_error(&e);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    // Pure conversions need neither config nor logging.
    match cli.cmd {
        Commands::Encode { value } => {
            print_encode(value, cli.json);
            return Ok(());
        }
        Commands::Decode { high, low } => {
            print_decode(high, low, cli.json);
            return Ok(());
        }
        _ => {}
    }

    let cfg = regloop_config::load_file(&cli.config)?;
    cfg.validate().wrap_err("invalid configuration")?;
    logging::init_tracing(cli.json, &cli.log_level, &cfg.logging)?;
    tracing::debug!(config = %cli.config.display(), "configuration loaded");

    match cli.cmd {
        Commands::Run {
            iterations,
            remote_voltage,
            stats,
        } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            {
                let flag = Arc::clone(&shutdown);
                if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
                    tracing::warn!(error = %e, "failed to install Ctrl-C handler");
                }
            }
            let args = RunArgs {
                iterations,
                remote_voltage,
            };
            let result = run_loop(&cfg, args, &shutdown)?;
            print_run_summary(&result, stats, cli.json);
            Ok(())
        }
        Commands::SelfCheck => {
            let report = self_check(&cfg)?;
            if cli.json {
                println!(
                    "{}",
                    json!({
                        "sensor": report.sensor,
                        "celsius": report.celsius,
                        "network": report.network.map(|ip| ip.to_string()),
                    })
                );
            } else {
                match report.celsius {
                    Some(c) => println!("sensor: {} reading {c:.2} °C", report.sensor),
                    None => println!("sensor: {} (probe disconnected)", report.sensor),
                }
                match report.network {
                    Some(ip) => println!("network: connected, IP address {ip}"),
                    None => println!("network: not connected"),
                }
                println!("OK");
            }
            Ok(())
        }
        Commands::Health => {
            if cli.json {
                println!("{}", json!({ "status": "ok" }));
            } else {
                println!("OK");
            }
            Ok(())
        }
        Commands::Encode { .. } | Commands::Decode { .. } => Ok(()),
    }
}

fn print_encode(value: f32, as_json: bool) {
    let (high, low) = encode(value);
    if as_json {
        println!("{}", json!({ "value": value, "high": high, "low": low }));
    } else {
        println!("{value} -> high=0x{high:04X} low=0x{low:04X}");
    }
}

fn print_decode(high: u16, low: u16, as_json: bool) {
    let value = decode(high, low);
    if as_json {
        // NaN and infinities have no JSON number form
        let v = if value.is_finite() { json!(value) } else { json!(value.to_string()) };
        println!("{}", json!({ "high": high, "low": low, "value": v }));
    } else {
        println!("high=0x{high:04X} low=0x{low:04X} -> {value}");
    }
}

fn print_run_summary(s: &RunStats, stats: bool, as_json: bool) {
    if as_json {
        println!(
            "{}",
            json!({
                "iterations": s.iterations,
                "voltage": s.last_voltage,
                "temperature": s.last_temperature,
                "faults": s.faults,
                "traces": s.traces,
                "remote_updates": s.remote_updates,
                "manual_steps": s.manual_steps,
                "ramp_steps": s.ramp_steps,
                "sensor_updates": s.sensor_updates,
            })
        );
        return;
    }
    println!(
        "stopped after {} iterations: Voltage = {:.2} V | Temperature = {:.2} °C",
        s.iterations, s.last_voltage, s.last_temperature
    );
    if stats {
        eprintln!("\n--- Loop Stats ---");
        eprintln!("Iterations: {}", s.iterations);
        eprintln!("Faults: {}", s.faults);
        eprintln!("Trace lines: {}", s.traces);
        eprintln!("Remote writes adopted: {}", s.remote_updates);
        eprintln!("Manual steps: {}", s.manual_steps);
        eprintln!("Ramp steps / reversals: {} / {}", s.ramp_steps, s.reversals);
        eprintln!("Clamped iterations: {}", s.clamps);
        eprintln!("Sensor updates: {}", s.sensor_updates);
        eprintln!("------------------\n");
    }
}
