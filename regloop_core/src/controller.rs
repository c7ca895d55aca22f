//! The loop controller (`Controller`).
//!
//! Owns the register server, sensor and encoder together with the loop
//! state, and drives one iteration per `step()`: service the transport,
//! arbitrate the voltage, poll the sensor, publish, trace.

use std::sync::Arc;
use std::time::Instant;

use eyre::WrapErr;
use regloop_traits::clock::Clock;
use regloop_traits::{QuadratureEncoder, RegisterServer, TemperatureSensor};
use tracing::{debug, info, warn};

use crate::arbiter;
use crate::codec::{allocate_float, read_float, write_float};
use crate::config::LoopCfg;
use crate::error::Result;
use crate::hw_error::{Device, map_hw_error};
use crate::publisher;
use crate::sensor::{self, SensorPoll};
use crate::state::ControlState;
use crate::status::IterationReport;

/// Target used for the change-triggered trace lines.
pub const TRACE_TARGET: &str = "regloop::trace";

pub struct Controller<R, S, E> {
    pub(crate) server: R,
    pub(crate) sensor: S,
    pub(crate) encoder: E,
    pub(crate) cfg: LoopCfg,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) epoch: Instant,
    pub(crate) state: ControlState,
    pub(crate) iteration: u64,
}

impl<R, S, E> core::fmt::Debug for Controller<R, S, E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Controller")
            .field("voltage", &self.state.voltage)
            .field("temperature", &self.state.temperature)
            .field("direction", &self.state.direction)
            .field("iteration", &self.iteration)
            .finish()
    }
}

impl<R, S, E> Controller<R, S, E> {
    pub fn state(&self) -> &ControlState {
        &self.state
    }

    pub fn voltage(&self) -> f32 {
        self.state.voltage
    }

    pub fn temperature(&self) -> f32 {
        self.state.temperature
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn clock(&self) -> &Arc<dyn Clock + Send + Sync> {
        &self.clock
    }

    /// Milliseconds since `begin`.
    pub fn now_ms(&self) -> u64 {
        self.clock.ms_since(self.epoch)
    }
}

impl<R, S, E> Controller<R, S, E>
where
    R: RegisterServer,
    S: TemperatureSensor,
    E: QuadratureEncoder,
{
    /// Startup after the network is up: latch the encoder level, bring up the
    /// sensor bus and register server, allocate both float pairs and publish
    /// the startup values. Resets the loop clock and state.
    pub fn begin(&mut self) -> Result<()> {
        let level = self
            .encoder
            .primary()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e, Device::Encoder)))
            .wrap_err("sampling encoder")?;

        self.sensor
            .begin()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e, Device::Sensor)))
            .wrap_err("initializing temperature sensor")?;

        self.server
            .start()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e, Device::Transport)))
            .wrap_err("starting register server")?;

        let regs = self.cfg.registers;
        for addr in [regs.voltage, regs.temperature] {
            allocate_float(&mut self.server, addr)
                .map_err(|e| eyre::Report::new(map_hw_error(&*e, Device::Register(addr))))
                .wrap_err("allocating registers")?;
        }

        self.state = ControlState::new(&self.cfg.startup, level);
        for (addr, value) in [
            (regs.voltage, self.state.voltage),
            (regs.temperature, self.state.temperature),
        ] {
            write_float(&mut self.server, addr, value)
                .map_err(|e| eyre::Report::new(map_hw_error(&*e, Device::Register(addr))))
                .wrap_err("initializing registers")?;
        }

        self.epoch = self.clock.now();
        self.iteration = 0;
        info!(
            voltage_reg = regs.voltage,
            temperature_reg = regs.temperature,
            "register server started"
        );
        Ok(())
    }

    /// Replace loop memory (e.g. resume from a chosen voltage and ramp
    /// direction) and publish it, so the read-back does not look like a
    /// remote write on the next iteration.
    pub fn restore_state(&mut self, state: ControlState) -> Result<()> {
        self.state = state;
        publisher::publish(&mut self.server, &self.cfg.registers, &self.state)
            .map_err(eyre::Report::new)
            .wrap_err("publishing restored state")
    }

    /// One loop iteration. Device faults are absorbed into the report; the
    /// voltage is clamped even when an input failed.
    pub fn step(&mut self) -> IterationReport {
        let now = self.clock.ms_since(self.epoch);
        self.iteration = self.iteration.saturating_add(1);
        let mut faults = Vec::new();
        let regs = self.cfg.registers;

        if let Err(e) = self.server.poll() {
            faults.push(map_hw_error(&*e, Device::Transport));
        }

        let read_back = match read_float(&self.server, regs.voltage) {
            Ok(v) => Some(v),
            Err(e) => {
                faults.push(map_hw_error(&*e, Device::Register(regs.voltage)));
                None
            }
        };

        let manual = match self.state.encoder.poll(&mut self.encoder) {
            Ok(step) => step,
            Err(e) => {
                faults.push(map_hw_error(&*e, Device::Encoder));
                None
            }
        };

        let arbitration = arbiter::arbitrate(&mut self.state, &self.cfg, read_back, manual, now);
        if let Some(v) = arbitration.remote {
            info!(voltage = v, "voltage updated by client");
        }
        if arbitration.reversed {
            debug!(direction = ?self.state.direction, voltage = self.state.voltage, "ramp reversed");
        }

        let sensor = sensor::poll_temperature(&mut self.sensor, &mut self.state, &self.cfg.sensor, now);
        if let SensorPoll::Failed(e) = &sensor {
            faults.push(e.clone());
        }

        if let Err(e) = publisher::publish(&mut self.server, &regs, &self.state) {
            faults.push(e);
        }

        let trace = publisher::trace_if_changed(&mut self.state, self.cfg.tolerance.change_log);
        if let Some(line) = &trace {
            info!(
                target: TRACE_TARGET,
                voltage = self.state.voltage,
                temperature = self.state.temperature,
                "{line}"
            );
        }

        for f in &faults {
            warn!(iteration = self.iteration, error = %f, "iteration fault");
        }

        IterationReport {
            iteration: self.iteration,
            now_ms: now,
            voltage: self.state.voltage,
            temperature: self.state.temperature,
            arbitration,
            sensor,
            trace,
            faults,
        }
    }
}
