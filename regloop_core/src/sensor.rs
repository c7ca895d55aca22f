//! Temperature polling on its own cadence.

use regloop_traits::{TempReading, TemperatureSensor};
use tracing::debug;

use crate::config::SensorCfg;
use crate::error::LoopError;
use crate::hw_error::{Device, map_hw_error};
use crate::state::ControlState;
use crate::util::due;

/// Outcome of one sensor poll attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorPoll {
    /// Poll interval has not elapsed.
    NotDue,
    /// A good reading replaced the temperature.
    Updated(f32),
    /// Probe reported disconnected; the previous temperature was kept.
    Retained,
    /// Driver error; the previous temperature was kept.
    Failed(LoopError),
}

/// Poll the sensor if due. The poll timer restarts whatever the outcome, so a
/// failing probe is retried once per interval, not every iteration.
pub fn poll_temperature<S: TemperatureSensor + ?Sized>(
    sensor: &mut S,
    state: &mut ControlState,
    cfg: &SensorCfg,
    now_ms: u64,
) -> SensorPoll {
    if !due(now_ms, state.last_temp_update_ms, cfg.poll_ms) {
        return SensorPoll::NotDue;
    }
    state.last_temp_update_ms = now_ms;

    if let Err(e) = sensor.request_conversion() {
        return SensorPoll::Failed(map_hw_error(&*e, Device::Sensor));
    }
    match sensor.read_celsius(cfg.index) {
        Ok(TempReading::Celsius(c)) => {
            state.temperature = c;
            SensorPoll::Updated(c)
        }
        Ok(TempReading::Disconnected) => {
            debug!(index = cfg.index, "temperature probe disconnected; keeping last reading");
            SensorPoll::Retained
        }
        Err(e) => SensorPoll::Failed(map_hw_error(&*e, Device::Sensor)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regloop_hardware::SimSensor;

    fn started(c: f32) -> SimSensor {
        let mut s = SimSensor::new(c);
        s.begin().unwrap();
        s
    }

    #[test]
    fn not_due_leaves_timer_alone() {
        let mut sensor = started(30.0);
        let mut state = ControlState::default();
        let out = poll_temperature(&mut sensor, &mut state, &SensorCfg::default(), 500);
        assert_eq!(out, SensorPoll::NotDue);
        assert_eq!(state.last_temp_update_ms, 0);
        assert_eq!(sensor.probe().conversions(), 0);
    }

    #[test]
    fn failure_still_restarts_timer() {
        let mut sensor = started(30.0);
        let mut state = ControlState::default();
        let cfg = SensorCfg {
            index: 1,
            ..SensorCfg::default()
        };
        let out = poll_temperature(&mut sensor, &mut state, &cfg, 1000);
        assert!(matches!(out, SensorPoll::Failed(LoopError::Sensor(_))));
        assert_eq!(state.last_temp_update_ms, 1000);
        assert_eq!(state.temperature, 25.0);
        assert_eq!(
            poll_temperature(&mut sensor, &mut state, &cfg, 1500),
            SensorPoll::NotDue
        );
    }

    #[test]
    fn sentinel_reading_is_retained() {
        let mut sensor = started(-127.0);
        let mut state = ControlState::default();
        let out = poll_temperature(&mut sensor, &mut state, &SensorCfg::default(), 1000);
        assert_eq!(out, SensorPoll::Retained);
        assert_eq!(state.temperature, 25.0);
    }
}
