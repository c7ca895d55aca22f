//! Human-readable error descriptions and structured JSON error formatting.

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use regloop_core::error::{BuildError, LoopError};

    // Typed matches first
    if let Some(BuildError::InvalidConfig(msg)) = err.downcast_ref::<BuildError>() {
        return format!(
            "What happened: Invalid loop configuration ({msg}).\nLikely causes: Out-of-range or inconsistent values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/regloop.toml for a sample."
        );
    }

    if let Some(le) = err.downcast_ref::<LoopError>() {
        return match le {
            LoopError::Sensor(_) => format!(
                "What happened: {le}.\nLikely causes: 1-Wire probe missing, wrong sensor.index, or the w1-gpio overlay is not loaded.\nHow to fix: Check /sys/bus/w1/devices for a 28-* entry and the [sensor] section of the config."
            ),
            LoopError::Encoder(_) => format!(
                "What happened: {le}.\nLikely causes: Wrong encoder pins or insufficient GPIO permissions.\nHow to fix: Fix [encoder] clk_pin/dt_pin; ensure the process may access GPIO."
            ),
            LoopError::Network(_) => format!(
                "What happened: {le}.\nLikely causes: Interface down or no route.\nHow to fix: Check the link and address assignment, then rerun."
            ),
            _ => format!(
                "What happened: {le}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("invalid configuration") || lower.contains("must be") {
        let detail = err
            .chain()
            .skip(1)
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(": ");
        let detail = if detail.is_empty() { msg.clone() } else { detail };
        return format!(
            "What happened: Configuration is invalid ({detail}).\nLikely causes: Out-of-range limits, zero intervals or overlapping register pairs.\nHow to fix: Edit the TOML config and try again."
        );
    }

    if lower.contains("no 1-wire temperature probe") {
        return "What happened: No DS18B20 probe was found on the 1-Wire bus.\nLikely causes: Probe not wired, missing pull-up, or w1 kernel modules not loaded.\nHow to fix: Check wiring and that /sys/bus/w1/devices lists a 28-* device.".to_string();
    }

    if lower.contains("shutdown requested") {
        return "Interrupted before the network came up.".to_string();
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Exit code for a failed command: 2 for configuration problems, 3 for device
/// faults, 1 otherwise.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    use regloop_core::error::{BuildError, LoopError};
    if err.downcast_ref::<BuildError>().is_some() {
        return 2;
    }
    if err.downcast_ref::<LoopError>().is_some() {
        return 3;
    }
    let lower = err.to_string().to_ascii_lowercase();
    if lower.contains("invalid configuration") {
        return 2;
    }
    1
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use regloop_core::error::{BuildError, LoopError};
    use serde_json::json;

    let reason = if err.downcast_ref::<BuildError>().is_some() {
        "InvalidConfig"
    } else if let Some(le) = err.downcast_ref::<LoopError>() {
        match le {
            LoopError::Transport(_) => "Transport",
            LoopError::Register { .. } => "Register",
            LoopError::Encoder(_) => "Encoder",
            LoopError::Sensor(_) => "Sensor",
            LoopError::Network(_) => "Network",
            LoopError::HardwareFault(_) => "HardwareFault",
        }
    } else if exit_code_for_error(err) == 2 {
        "InvalidConfig"
    } else {
        "Error"
    };
    json!({ "reason": reason, "message": humanize(err) }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use regloop_core::error::{BuildError, LoopError};

    #[test]
    fn build_error_is_config_exit() {
        let err = eyre::Report::new(BuildError::InvalidConfig("auto band must be finite and ordered"));
        assert_eq!(exit_code_for_error(&err), 2);
        assert!(humanize(&err).contains("auto band"));
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "InvalidConfig");
    }

    #[test]
    fn sensor_fault_mentions_one_wire() {
        let err = eyre::Report::new(LoopError::Sensor("no probe at index 2".into()));
        assert_eq!(exit_code_for_error(&err), 3);
        assert!(humanize(&err).contains("1-Wire"));
    }

    #[test]
    fn wrapped_validation_error_surfaces_detail() {
        let err = eyre::eyre!("ramp.step must be > 0").wrap_err("invalid configuration");
        assert_eq!(exit_code_for_error(&err), 2);
        assert!(humanize(&err).contains("ramp.step must be > 0"));
    }

    #[test]
    fn unknown_errors_fall_back() {
        let err = eyre::eyre!("boom");
        assert_eq!(exit_code_for_error(&err), 1);
        assert!(humanize(&err).contains("Original: boom"));
    }
}
