#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the register loop.
//!
//! Every section is optional; omitted keys take the firmware defaults, so an
//! empty file is a valid config. `Config::validate` rejects combinations the
//! loop cannot run safely with.
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct Registers {
    /// First of the two holding registers carrying the voltage float.
    pub voltage: u16,
    /// First of the two holding registers carrying the temperature float.
    pub temperature: u16,
}

impl Default for Registers {
    fn default() -> Self {
        Self {
            voltage: 0,
            temperature: 4,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Limits {
    pub hard_min: f32,
    pub hard_max: f32,
    /// Ramp turns upward at or below this value.
    pub auto_min: f32,
    /// Ramp turns downward at or above this value.
    pub auto_max: f32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            hard_min: 15.0,
            hard_max: 30.0,
            auto_min: 22.5,
            auto_max: 25.5,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Ramp {
    pub enabled: bool,
    pub step: f32,
    pub interval_ms: u64,
}

impl Default for Ramp {
    fn default() -> Self {
        Self {
            enabled: true,
            step: 0.1,
            interval_ms: 1000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Encoder {
    pub step: f32,
    /// Primary (CLK) input pin
    pub clk_pin: u8,
    /// Secondary (DT) input pin
    pub dt_pin: u8,
}

impl Default for Encoder {
    fn default() -> Self {
        Self {
            step: 0.1,
            clk_pin: 18,
            dt_pin: 19,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Sensor {
    pub poll_ms: u64,
    /// Probe index on the bus
    pub index: usize,
    /// Data pin of the 1-Wire bus (informational on Linux, where the kernel owns the bus)
    pub pin: u8,
    /// Restrict to one 1-Wire slave id, e.g. "28-0000071a2b3c"
    pub w1_device: Option<String>,
    /// Override the 1-Wire sysfs root
    pub w1_root: Option<String>,
}

impl Default for Sensor {
    fn default() -> Self {
        Self {
            poll_ms: 1000,
            index: 0,
            pin: 14,
            w1_device: None,
            w1_root: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Tolerance {
    /// Read-back deviation treated as a remote write
    pub remote_write: f32,
    /// Change needed before another trace line is emitted
    pub change_log: f32,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            remote_write: 0.01,
            change_log: 0.01,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Startup {
    pub voltage: f32,
    pub temperature: f32,
    /// Interval between link checks while waiting for the network
    pub network_poll_ms: u64,
}

impl Default for Startup {
    fn default() -> Self {
        Self {
            voltage: 24.0,
            temperature: 25.0,
            network_poll_ms: 500,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct RunnerCfg {
    /// Idle sleep between iterations in microseconds (0 = spin).
    pub idle_us: u64,
}

impl Default for RunnerCfg {
    fn default() -> Self {
        Self { idle_us: 1000 }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Config {
    pub registers: Registers,
    pub limits: Limits,
    pub ramp: Ramp,
    pub encoder: Encoder,
    pub sensor: Sensor,
    pub tolerance: Tolerance,
    pub startup: Startup,
    pub runner: RunnerCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read and parse a config file; a missing file yields the defaults.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {}: {}", path.display(), e))?;
    load_toml(&text).map_err(|e| eyre::eyre!("invalid configuration in {}: {}", path.display(), e))
}

fn finite(name: &str, v: f32) -> eyre::Result<()> {
    if !v.is_finite() {
        eyre::bail!("{name} must be finite");
    }
    Ok(())
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Limits
        let l = &self.limits;
        for (name, v) in [
            ("limits.hard_min", l.hard_min),
            ("limits.hard_max", l.hard_max),
            ("limits.auto_min", l.auto_min),
            ("limits.auto_max", l.auto_max),
        ] {
            finite(name, v)?;
        }
        if l.hard_min >= l.hard_max {
            eyre::bail!("limits.hard_min must be < limits.hard_max");
        }
        if l.auto_min >= l.auto_max {
            eyre::bail!("limits.auto_min must be < limits.auto_max");
        }
        if l.auto_min < l.hard_min || l.auto_max > l.hard_max {
            eyre::bail!("limits.auto_min..auto_max must lie within limits.hard_min..hard_max");
        }

        // Ramp
        finite("ramp.step", self.ramp.step)?;
        if self.ramp.step <= 0.0 {
            eyre::bail!("ramp.step must be > 0");
        }
        if self.ramp.step >= l.auto_max - l.auto_min {
            eyre::bail!("ramp.step must be smaller than the auto band");
        }
        if self.ramp.interval_ms == 0 {
            eyre::bail!("ramp.interval_ms must be >= 1");
        }

        // Encoder
        finite("encoder.step", self.encoder.step)?;
        if self.encoder.step <= 0.0 {
            eyre::bail!("encoder.step must be > 0");
        }
        if self.encoder.clk_pin == self.encoder.dt_pin {
            eyre::bail!("encoder.clk_pin and encoder.dt_pin must differ");
        }

        // Sensor
        if self.sensor.poll_ms == 0 {
            eyre::bail!("sensor.poll_ms must be >= 1");
        }

        // Tolerance
        finite("tolerance.remote_write", self.tolerance.remote_write)?;
        finite("tolerance.change_log", self.tolerance.change_log)?;
        if self.tolerance.remote_write < 0.0 {
            eyre::bail!("tolerance.remote_write must be >= 0");
        }
        if self.tolerance.change_log < 0.0 {
            eyre::bail!("tolerance.change_log must be >= 0");
        }

        // Registers: each float spans addr and addr + 1
        let v = u32::from(self.registers.voltage);
        let t = u32::from(self.registers.temperature);
        if v + 1 > u32::from(u16::MAX) || t + 1 > u32::from(u16::MAX) {
            eyre::bail!("registers: the second word of each pair must be at most 65535");
        }
        if v.abs_diff(t) < 2 {
            eyre::bail!("registers.voltage and registers.temperature pairs overlap");
        }

        // Startup
        finite("startup.voltage", self.startup.voltage)?;
        finite("startup.temperature", self.startup.temperature)?;
        if self.startup.voltage < l.hard_min || self.startup.voltage > l.hard_max {
            eyre::bail!("startup.voltage must lie within limits.hard_min..hard_max");
        }
        if self.startup.network_poll_ms == 0 {
            eyre::bail!("startup.network_poll_ms must be >= 1");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}
