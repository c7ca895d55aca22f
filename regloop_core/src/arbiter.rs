//! Per-iteration voltage arbitration.
//!
//! Three writers touch the voltage each iteration, applied in a fixed order
//! where later writers overwrite or adjust earlier results:
//!
//! 1. remote write detected through the register read-back (adopted verbatim)
//! 2. autonomous ramp step, once per ramp interval
//! 3. manual encoder step
//!
//! The result is then clamped to the hard limits unconditionally. The order is
//! not commutative: a remote write and a knob step in the same iteration both
//! apply, with the knob step landing on top of the remote value.

use crate::config::{Limits, LoopCfg, RampCfg};
use crate::encoder::ManualStep;
use crate::state::{ControlState, RampDirection};
use crate::util::{due, moved};

/// What the arbiter did this iteration.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Arbitration {
    /// Value adopted from the register table, if a remote write was detected.
    pub remote: Option<f32>,
    /// A ramp step was applied.
    pub ramped: bool,
    /// The ramp step reversed the ramp direction.
    pub reversed: bool,
    pub manual: Option<ManualStep>,
    /// The clamp changed the value.
    pub clamped: bool,
}

/// Adopt `read_back` when it differs from the current voltage by more than `tolerance`.
pub fn detect_remote_write(state: &mut ControlState, read_back: f32, tolerance: f32) -> bool {
    if moved(read_back, state.voltage, tolerance) {
        state.voltage = read_back;
        true
    } else {
        false
    }
}

/// Apply one ramp step if the interval elapsed. Returns `None` when not due,
/// otherwise whether the direction reversed.
pub fn ramp_tick(
    state: &mut ControlState,
    ramp: &RampCfg,
    limits: &Limits,
    now_ms: u64,
) -> Option<bool> {
    if !ramp.enabled || !due(now_ms, state.last_auto_update_ms, ramp.interval_ms) {
        return None;
    }
    let before = state.direction;
    state.voltage += state.direction.sign() * ramp.step;
    if state.voltage >= limits.auto_max {
        state.direction = RampDirection::Down;
    }
    if state.voltage <= limits.auto_min {
        state.direction = RampDirection::Up;
    }
    state.last_auto_update_ms = now_ms;
    Some(state.direction != before)
}

pub fn apply_manual(state: &mut ControlState, step: ManualStep, amount: f32) {
    state.voltage += step.sign() * amount;
}

/// Clamp into the hard limits. Returns whether the value changed.
///
/// NaN is pulled to `hard_min` so the invariant holds for any input.
pub fn clamp(state: &mut ControlState, limits: &Limits) -> bool {
    let before = state.voltage;
    let clamped = if before.is_nan() {
        limits.hard_min
    } else {
        before.clamp(limits.hard_min, limits.hard_max)
    };
    state.voltage = clamped;
    clamped.to_bits() != before.to_bits()
}

/// Run one full arbitration pass.
///
/// `read_back` is the voltage currently served by the register table (`None`
/// when it could not be read); `manual` is this iteration's encoder edge.
pub fn arbitrate(
    state: &mut ControlState,
    cfg: &LoopCfg,
    read_back: Option<f32>,
    manual: Option<ManualStep>,
    now_ms: u64,
) -> Arbitration {
    let mut out = Arbitration::default();

    if let Some(v) = read_back
        && detect_remote_write(state, v, cfg.tolerance.remote_write)
    {
        out.remote = Some(v);
    }

    if let Some(reversed) = ramp_tick(state, &cfg.ramp, &cfg.limits, now_ms) {
        out.ramped = true;
        out.reversed = reversed;
    }

    if let Some(step) = manual {
        apply_manual(state, step, cfg.encoder.step);
        out.manual = Some(step);
    }

    out.clamped = clamp(state, &cfg.limits);
    out
}
