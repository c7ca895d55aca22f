//! Runtime configuration for the loop.
//!
//! These are the structs `Controller` runs with. They are separate from the
//! TOML-deserialized config in `regloop_config`; see `conversions`.

use crate::error::BuildError;

/// Absolute lower voltage clamp (V).
pub const HARD_MIN: f32 = 15.0;
/// Absolute upper voltage clamp (V).
pub const HARD_MAX: f32 = 30.0;
/// Ramp turns upward at or below this voltage (V).
pub const AUTO_MIN: f32 = 22.5;
/// Ramp turns downward at or above this voltage (V).
pub const AUTO_MAX: f32 = 25.5;
pub const RAMP_STEP: f32 = 0.1;
pub const RAMP_INTERVAL_MS: u64 = 1000;
pub const MANUAL_STEP: f32 = 0.1;
pub const REMOTE_WRITE_TOLERANCE: f32 = 0.01;
pub const CHANGE_LOG_TOLERANCE: f32 = 0.01;
pub const TEMP_POLL_MS: u64 = 1000;
pub const VOLTAGE_REGISTER: u16 = 0;
pub const TEMPERATURE_REGISTER: u16 = 4;
pub const STARTUP_VOLTAGE: f32 = 24.0;
pub const STARTUP_TEMPERATURE: f32 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    pub hard_min: f32,
    pub hard_max: f32,
    pub auto_min: f32,
    pub auto_max: f32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            hard_min: HARD_MIN,
            hard_max: HARD_MAX,
            auto_min: AUTO_MIN,
            auto_max: AUTO_MAX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampCfg {
    pub enabled: bool,
    pub step: f32,
    pub interval_ms: u64,
}

impl Default for RampCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            step: RAMP_STEP,
            interval_ms: RAMP_INTERVAL_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncoderCfg {
    /// Voltage change per detected edge.
    pub step: f32,
}

impl Default for EncoderCfg {
    fn default() -> Self {
        Self { step: MANUAL_STEP }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorCfg {
    pub poll_ms: u64,
    pub index: usize,
}

impl Default for SensorCfg {
    fn default() -> Self {
        Self {
            poll_ms: TEMP_POLL_MS,
            index: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub remote_write: f32,
    pub change_log: f32,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            remote_write: REMOTE_WRITE_TOLERANCE,
            change_log: CHANGE_LOG_TOLERANCE,
        }
    }
}

/// First register of each published float pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterMap {
    pub voltage: u16,
    pub temperature: u16,
}

impl Default for RegisterMap {
    fn default() -> Self {
        Self {
            voltage: VOLTAGE_REGISTER,
            temperature: TEMPERATURE_REGISTER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartupCfg {
    pub voltage: f32,
    pub temperature: f32,
}

impl Default for StartupCfg {
    fn default() -> Self {
        Self {
            voltage: STARTUP_VOLTAGE,
            temperature: STARTUP_TEMPERATURE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LoopCfg {
    pub limits: Limits,
    pub ramp: RampCfg,
    pub encoder: EncoderCfg,
    pub sensor: SensorCfg,
    pub tolerance: Tolerances,
    pub registers: RegisterMap,
    pub startup: StartupCfg,
}

impl LoopCfg {
    /// Minimal checks the loop relies on; full validation lives in `regloop_config`.
    pub fn check(&self) -> Result<(), BuildError> {
        let l = &self.limits;
        if !(l.hard_min.is_finite() && l.hard_max.is_finite()) || l.hard_min >= l.hard_max {
            return Err(BuildError::InvalidConfig("hard limits must be finite and ordered"));
        }
        if !(l.auto_min.is_finite() && l.auto_max.is_finite()) || l.auto_min >= l.auto_max {
            return Err(BuildError::InvalidConfig("auto band must be finite and ordered"));
        }
        if self.ramp.interval_ms == 0 || self.sensor.poll_ms == 0 {
            return Err(BuildError::InvalidConfig("intervals must be >= 1 ms"));
        }
        if !self.startup.voltage.is_finite() || !self.startup.temperature.is_finite() {
            return Err(BuildError::InvalidConfig("startup values must be finite"));
        }
        if self.registers.voltage.abs_diff(self.registers.temperature) < 2 {
            return Err(BuildError::InvalidConfig("register pairs overlap"));
        }
        Ok(())
    }
}
