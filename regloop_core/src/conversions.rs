//! Conversions from `regloop_config` (TOML) types to runtime loop types.

use crate::config::{EncoderCfg, Limits, LoopCfg, RampCfg, RegisterMap, SensorCfg, StartupCfg, Tolerances};

impl From<&regloop_config::Limits> for Limits {
    fn from(l: &regloop_config::Limits) -> Self {
        Limits {
            hard_min: l.hard_min,
            hard_max: l.hard_max,
            auto_min: l.auto_min,
            auto_max: l.auto_max,
        }
    }
}

impl From<&regloop_config::Ramp> for RampCfg {
    fn from(r: &regloop_config::Ramp) -> Self {
        RampCfg {
            enabled: r.enabled,
            step: r.step,
            interval_ms: r.interval_ms,
        }
    }
}

impl From<&regloop_config::Encoder> for EncoderCfg {
    fn from(e: &regloop_config::Encoder) -> Self {
        EncoderCfg { step: e.step }
    }
}

impl From<&regloop_config::Sensor> for SensorCfg {
    fn from(s: &regloop_config::Sensor) -> Self {
        SensorCfg {
            poll_ms: s.poll_ms,
            index: s.index,
        }
    }
}

impl From<&regloop_config::Tolerance> for Tolerances {
    fn from(t: &regloop_config::Tolerance) -> Self {
        Tolerances {
            remote_write: t.remote_write,
            change_log: t.change_log,
        }
    }
}

impl From<&regloop_config::Registers> for RegisterMap {
    fn from(r: &regloop_config::Registers) -> Self {
        RegisterMap {
            voltage: r.voltage,
            temperature: r.temperature,
        }
    }
}

impl From<&regloop_config::Startup> for StartupCfg {
    fn from(s: &regloop_config::Startup) -> Self {
        StartupCfg {
            voltage: s.voltage,
            temperature: s.temperature,
        }
    }
}

impl From<&regloop_config::Config> for LoopCfg {
    fn from(c: &regloop_config::Config) -> Self {
        LoopCfg {
            limits: (&c.limits).into(),
            ramp: (&c.ramp).into(),
            encoder: (&c.encoder).into(),
            sensor: (&c.sensor).into(),
            tolerance: (&c.tolerance).into(),
            registers: (&c.registers).into(),
            startup: (&c.startup).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_file_config_matches_runtime_defaults() {
        let file = regloop_config::Config::default();
        let cfg: LoopCfg = (&file).into();
        assert_eq!(cfg, LoopCfg::default());
    }

    #[test]
    fn overrides_carry_through() {
        let file = regloop_config::load_toml("[registers]\nvoltage = 10\ntemperature = 20\n[ramp]\nenabled = false")
            .expect("parse");
        let cfg = LoopCfg::from(&file);
        assert_eq!(cfg.registers.voltage, 10);
        assert_eq!(cfg.registers.temperature, 20);
        assert!(!cfg.ramp.enabled);
    }
}
