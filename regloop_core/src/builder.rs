//! Type-state builder for `Controller`.
//!
//! The register server, sensor and encoder start as `Missing`; `build()` only
//! exists once all three are real devices, so a half-wired controller does
//! not compile.

use std::sync::Arc;

use regloop_traits::clock::{Clock, MonotonicClock};
use regloop_traits::{Level, QuadratureEncoder, RegisterServer, TemperatureSensor};

use crate::config::LoopCfg;
use crate::controller::Controller;
use crate::error::Result;
use crate::state::ControlState;

/// Placeholder for a device not yet supplied to the builder.
#[derive(Debug, Default, Clone, Copy)]
pub struct Missing;

pub struct ControllerBuilder<R, S, E> {
    server: R,
    sensor: S,
    encoder: E,
    cfg: LoopCfg,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
}

impl Default for ControllerBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl ControllerBuilder<Missing, Missing, Missing> {
    pub fn new() -> Self {
        ControllerBuilder {
            server: Missing,
            sensor: Missing,
            encoder: Missing,
            cfg: LoopCfg::default(),
            clock: None,
        }
    }
}

impl<R, S, E> ControllerBuilder<R, S, E> {
    pub fn with_server<R2: RegisterServer>(self, server: R2) -> ControllerBuilder<R2, S, E> {
        ControllerBuilder {
            server,
            sensor: self.sensor,
            encoder: self.encoder,
            cfg: self.cfg,
            clock: self.clock,
        }
    }

    pub fn with_sensor<S2: TemperatureSensor>(self, sensor: S2) -> ControllerBuilder<R, S2, E> {
        ControllerBuilder {
            server: self.server,
            sensor,
            encoder: self.encoder,
            cfg: self.cfg,
            clock: self.clock,
        }
    }

    pub fn with_encoder<E2: QuadratureEncoder>(self, encoder: E2) -> ControllerBuilder<R, S, E2> {
        ControllerBuilder {
            server: self.server,
            sensor: self.sensor,
            encoder,
            cfg: self.cfg,
            clock: self.clock,
        }
    }

    pub fn with_config(mut self, cfg: LoopCfg) -> Self {
        self.cfg = cfg;
        self
    }

    /// Inject a clock; defaults to `MonotonicClock`.
    pub fn with_clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }
}

impl<R, S, E> ControllerBuilder<R, S, E>
where
    R: RegisterServer,
    S: TemperatureSensor,
    E: QuadratureEncoder,
{
    /// Validate the config and assemble the controller. Call `begin()` before stepping.
    pub fn build(self) -> Result<Controller<R, S, E>> {
        self.cfg.check()?;
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));
        let epoch = clock.now();
        Ok(Controller {
            server: self.server,
            sensor: self.sensor,
            encoder: self.encoder,
            state: ControlState::new(&self.cfg.startup, Level::High),
            cfg: self.cfg,
            clock,
            epoch,
            iteration: 0,
        })
    }
}

/// Start building a `Controller`.
pub fn builder() -> ControllerBuilder<Missing, Missing, Missing> {
    ControllerBuilder::new()
}
