//! Free-running loop driver around `Controller::step`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use regloop_traits::{QuadratureEncoder, RegisterServer, TemperatureSensor};
use tracing::info;

use crate::controller::Controller;
use crate::sensor::SensorPoll;
use crate::status::IterationReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Stop after this many iterations; `None` runs until shutdown.
    pub max_iterations: Option<u64>,
    /// Pause between iterations. Zero spins; the encoder is sampled once per
    /// iteration so long pauses lose knob edges.
    pub idle: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_iterations: None,
            idle: Duration::from_millis(1),
        }
    }
}

/// Counters accumulated over a run.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct RunStats {
    pub iterations: u64,
    pub faults: u64,
    pub traces: u64,
    pub remote_updates: u64,
    pub manual_steps: u64,
    pub ramp_steps: u64,
    pub reversals: u64,
    pub clamps: u64,
    pub sensor_updates: u64,
    pub last_voltage: f32,
    pub last_temperature: f32,
}

impl RunStats {
    pub fn record(&mut self, report: &IterationReport) {
        self.iterations += 1;
        self.faults += report.faults.len() as u64;
        self.traces += u64::from(report.trace.is_some());
        self.remote_updates += u64::from(report.arbitration.remote.is_some());
        self.manual_steps += u64::from(report.arbitration.manual.is_some());
        self.ramp_steps += u64::from(report.arbitration.ramped);
        self.reversals += u64::from(report.arbitration.reversed);
        self.clamps += u64::from(report.arbitration.clamped);
        self.sensor_updates += u64::from(matches!(report.sensor, SensorPoll::Updated(_)));
        self.last_voltage = report.voltage;
        self.last_temperature = report.temperature;
    }
}

/// Step `ctrl` until `shutdown` is set or `opts.max_iterations` is reached.
///
/// `on_report` sees every iteration report. Faults never end the run.
/// Expects `ctrl.begin()` to have succeeded.
pub fn run<R, S, E, F>(
    ctrl: &mut Controller<R, S, E>,
    opts: &RunOptions,
    shutdown: &AtomicBool,
    mut on_report: F,
) -> RunStats
where
    R: RegisterServer,
    S: TemperatureSensor,
    E: QuadratureEncoder,
    F: FnMut(&IterationReport),
{
    let mut stats = RunStats {
        last_voltage: ctrl.voltage(),
        last_temperature: ctrl.temperature(),
        ..RunStats::default()
    };
    let clock = ctrl.clock().clone();

    loop {
        if shutdown.load(Ordering::Relaxed) {
            info!(iterations = stats.iterations, "shutdown requested");
            break;
        }
        if let Some(max) = opts.max_iterations
            && stats.iterations >= max
        {
            break;
        }

        let report = ctrl.step();
        stats.record(&report);
        on_report(&report);

        clock.sleep(opts.idle);
    }

    info!(
        iterations = stats.iterations,
        faults = stats.faults,
        voltage = stats.last_voltage,
        temperature = stats.last_temperature,
        "loop stopped"
    );
    stats
}
