#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Voltage regulation loop (hardware-agnostic).
//!
//! All device access goes through the `regloop_traits` seams: a register
//! server exposing the voltage and temperature as float register pairs, a
//! temperature sensor, and a quadrature encoder for manual adjustment.
//!
//! ## Architecture
//!
//! - **Codec**: IEEE-754 float split across two 16-bit registers (`codec`)
//! - **Arbitration**: remote write, autonomous ramp, manual step, clamp (`arbiter`)
//! - **Sensing**: temperature polled on its own cadence (`sensor`)
//! - **Publishing**: register write-back and change-triggered traces (`publisher`)
//! - **Driving**: `Controller::step` and the free-running `runner`
//!
//! The voltage lies within the hard limits after every iteration, whatever
//! the remote client writes.

pub mod arbiter;
pub mod builder;
pub mod codec;
pub mod config;
pub mod controller;
pub mod conversions;
pub mod encoder;
pub mod error;
pub mod hw_error;
pub mod publisher;
pub mod runner;
pub mod sensor;
pub mod startup;
pub mod state;
pub mod status;
pub mod util;

pub use arbiter::Arbitration;
pub use builder::{ControllerBuilder, Missing, builder};
pub use config::{EncoderCfg, Limits, LoopCfg, RampCfg, RegisterMap, SensorCfg, StartupCfg, Tolerances};
pub use controller::{Controller, TRACE_TARGET};
pub use encoder::{EdgeDetector, ManualStep};
pub use error::{BuildError, LoopError, Result};
pub use runner::{RunOptions, RunStats};
pub use sensor::SensorPoll;
pub use startup::wait_for_network;
pub use state::{ControlState, RampDirection};
pub use status::IterationReport;
