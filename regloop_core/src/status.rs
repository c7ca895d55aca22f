//! Report returned from each loop iteration.

use crate::arbiter::Arbitration;
use crate::error::LoopError;
use crate::sensor::SensorPoll;

#[derive(Debug, Clone, PartialEq)]
pub struct IterationReport {
    /// 1-based iteration counter since `begin`.
    pub iteration: u64,
    /// Loop-relative time of this iteration.
    pub now_ms: u64,
    pub voltage: f32,
    pub temperature: f32,
    pub arbitration: Arbitration,
    pub sensor: SensorPoll,
    /// Trace line emitted this iteration, if any.
    pub trace: Option<String>,
    /// Device faults absorbed this iteration.
    pub faults: Vec<LoopError>,
}

impl IterationReport {
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }
}
