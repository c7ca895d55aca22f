//! Loop memory carried from one iteration to the next.

use regloop_traits::Level;

use crate::config::StartupCfg;
use crate::encoder::EdgeDetector;
use crate::publisher::TraceGate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampDirection {
    Up,
    Down,
}

impl RampDirection {
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            RampDirection::Up => 1.0,
            RampDirection::Down => -1.0,
        }
    }
}

/// Everything the loop mutates.
///
/// `voltage` is within the hard limits after every completed iteration;
/// `temperature` only ever holds real readings (or the startup default).
#[derive(Debug, Clone, PartialEq)]
pub struct ControlState {
    pub voltage: f32,
    pub temperature: f32,
    pub direction: RampDirection,
    pub encoder: EdgeDetector,
    /// Loop-relative ms of the last ramp step.
    pub last_auto_update_ms: u64,
    /// Loop-relative ms of the last sensor poll.
    pub last_temp_update_ms: u64,
    pub trace: TraceGate,
}

impl ControlState {
    pub fn new(startup: &StartupCfg, encoder_level: Level) -> Self {
        Self {
            voltage: startup.voltage,
            temperature: startup.temperature,
            direction: RampDirection::Up,
            encoder: EdgeDetector::new(encoder_level),
            last_auto_update_ms: 0,
            last_temp_update_ms: 0,
            trace: TraceGate::default(),
        }
    }
}

impl Default for ControlState {
    fn default() -> Self {
        Self::new(&StartupCfg::default(), Level::High)
    }
}
