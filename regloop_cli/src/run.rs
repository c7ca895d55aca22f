//! Device assembly and loop execution for the CLI commands.

use std::sync::atomic::AtomicBool;
use std::time::Duration;

use eyre::WrapErr;
use regloop_config::Config;
use regloop_core::codec::encode;
use regloop_core::hw_error::{Device, map_hw_error};
use regloop_core::{LoopCfg, RunOptions, RunStats, runner, wait_for_network};
use regloop_hardware::{SimRegisterServer, SimSensor, W1Sensor};
use regloop_traits::clock::{Clock, MonotonicClock};
use regloop_traits::{DeviceError, Network, QuadratureEncoder, TempReading, TemperatureSensor};

use crate::cli::{ENV_SIM_DRIFT, ENV_SIM_TEMP};

/// Probe temperature the simulated sensor starts at when not overridden.
const SIM_DEFAULT_CELSIUS: f32 = 21.5;
/// How long `self-check` waits for a 1-Wire conversion.
const W1_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, Default)]
pub struct RunArgs {
    pub iterations: Option<u64>,
    pub remote_voltage: Option<f32>,
}

/// Run the loop on whatever devices this build and config select.
pub fn run_loop(cfg: &Config, args: RunArgs, shutdown: &AtomicBool) -> eyre::Result<RunStats> {
    #[cfg(all(feature = "hardware", target_os = "linux"))]
    {
        let encoder = regloop_hardware::gpio::GpioEncoder::new(cfg.encoder.clk_pin, cfg.encoder.dt_pin)
            .wrap_err("open encoder pins")?;
        let mut net = regloop_hardware::HostNetwork::new()?;
        drive(cfg, w1_sensor(cfg), encoder, &mut net, args, shutdown)
    }
    #[cfg(not(all(feature = "hardware", target_os = "linux")))]
    {
        let encoder = regloop_hardware::SimEncoder::new();
        let mut net = regloop_hardware::SimNetwork::new(0);
        if cfg.sensor.w1_root.is_some() {
            drive(cfg, w1_sensor(cfg), encoder, &mut net, args, shutdown)
        } else {
            drive(cfg, sim_sensor()?, encoder, &mut net, args, shutdown)
        }
    }
}

fn drive<S, E, N>(
    cfg: &Config,
    sensor: S,
    encoder: E,
    net: &mut N,
    args: RunArgs,
    shutdown: &AtomicBool,
) -> eyre::Result<RunStats>
where
    S: TemperatureSensor,
    E: QuadratureEncoder,
    N: Network,
{
    let clock = MonotonicClock::new();
    let poll = Duration::from_millis(cfg.startup.network_poll_ms);
    wait_for_network(net, &clock, poll, shutdown)?;

    let server = SimRegisterServer::new();
    let client = server.client();
    let mut ctrl = regloop_core::builder()
        .with_server(server)
        .with_sensor(sensor)
        .with_encoder(encoder)
        .with_config(LoopCfg::from(cfg))
        .with_clock(clock)
        .build()?;
    ctrl.begin()?;

    if let Some(v) = args.remote_voltage {
        let (high, low) = encode(v);
        client.write_registers(cfg.registers.voltage, &[high, low]);
        tracing::info!(voltage = v, high, low, "queued remote voltage write");
    }

    let opts = RunOptions {
        max_iterations: args.iterations,
        idle: Duration::from_micros(cfg.runner.idle_us),
    };
    Ok(runner::run(&mut ctrl, &opts, shutdown, |_| {}))
}

fn device(e: DeviceError, kind: Device) -> eyre::Report {
    eyre::Report::new(map_hw_error(&*e, kind))
}

fn w1_sensor(cfg: &Config) -> W1Sensor {
    let sensor = match cfg.sensor.w1_root.as_deref() {
        Some(root) => W1Sensor::with_root(root),
        None => W1Sensor::new(),
    };
    match cfg.sensor.w1_device.as_deref() {
        Some(id) => sensor.with_device(id),
        None => sensor,
    }
}

fn env_f32(name: &str, default: f32) -> eyre::Result<f32> {
    match std::env::var(name) {
        Ok(s) => s
            .trim()
            .parse::<f32>()
            .wrap_err_with(|| format!("invalid {name} value '{s}'")),
        Err(_) => Ok(default),
    }
}

fn sim_sensor() -> eyre::Result<SimSensor> {
    let celsius = env_f32(ENV_SIM_TEMP, SIM_DEFAULT_CELSIUS)?;
    let drift = env_f32(ENV_SIM_DRIFT, 0.0)?;
    Ok(SimSensor::new(celsius).with_drift(drift))
}

/// Outcome of a device presence check.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckReport {
    pub sensor: String,
    pub celsius: Option<f32>,
    pub network: Option<std::net::IpAddr>,
}

/// Probe the temperature sensor and network once, without starting the loop.
pub fn self_check(cfg: &Config) -> eyre::Result<CheckReport> {
    let index = cfg.sensor.index;
    let use_w1 = cfg!(all(feature = "hardware", target_os = "linux")) || cfg.sensor.w1_root.is_some();

    let (sensor, celsius) = if use_w1 {
        let mut s = w1_sensor(cfg);
        s.begin()
            .map_err(|e| device(e, Device::Sensor))
            .wrap_err("scan 1-wire bus")?;
        if s.probe_count() == 0 {
            eyre::bail!("no 1-wire temperature probe found");
        }
        (format!("1-wire ({} probe(s))", s.probe_count()), await_w1(&mut s, index)?)
    } else {
        let mut s = sim_sensor()?;
        s.begin().map_err(|e| device(e, Device::Sensor))?;
        s.request_conversion()
            .map_err(|e| device(e, Device::Sensor))?;
        let reading = s
            .read_celsius(index)
            .map_err(|e| device(e, Device::Sensor))
            .wrap_err("read simulated probe")?;
        ("simulated".to_string(), reading.celsius())
    };

    #[cfg(all(feature = "hardware", target_os = "linux"))]
    let network = {
        let mut net = regloop_hardware::HostNetwork::new()?;
        net.begin().map_err(|e| device(e, Device::Network))?;
        if net.is_connected() { net.local_ip() } else { None }
    };
    #[cfg(not(all(feature = "hardware", target_os = "linux")))]
    let network = {
        let mut net = regloop_hardware::SimNetwork::new(0);
        net.begin().map_err(|e| device(e, Device::Network))?;
        if net.is_connected() { net.local_ip() } else { None }
    };

    Ok(CheckReport {
        sensor,
        celsius,
        network,
    })
}

/// Request one conversion and wait for the worker to deliver it.
fn await_w1(sensor: &mut W1Sensor, index: usize) -> eyre::Result<Option<f32>> {
    let clock = MonotonicClock::new();
    let start = clock.now();
    sensor
        .request_conversion()
        .map_err(|e| device(e, Device::Sensor))?;
    loop {
        let reading = sensor
            .read_celsius(index)
            .map_err(|e| device(e, Device::Sensor))
            .wrap_err("read 1-wire probe")?;
        if let TempReading::Celsius(c) = reading {
            return Ok(Some(c));
        }
        if clock.ms_since(start) >= W1_CHECK_TIMEOUT.as_millis() as u64 {
            return Ok(None);
        }
        clock.sleep(Duration::from_millis(20));
    }
}
