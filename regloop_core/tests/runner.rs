use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use regloop_core::codec::encode;
use regloop_core::runner::run;
use regloop_core::{LoopCfg, RunOptions};
use regloop_hardware::{SimEncoder, SimRegisterServer, SimSensor};
use regloop_traits::clock::test_clock::TestClock;

#[test]
fn runs_bounded_iterations_on_the_injected_clock() {
    let server = SimRegisterServer::new();
    let client = server.client();
    let clock = TestClock::new();
    let mut ctrl = regloop_core::builder()
        .with_server(server)
        .with_sensor(SimSensor::new(22.0))
        .with_encoder(SimEncoder::new())
        .with_config(LoopCfg::default())
        .with_clock(clock.clone())
        .build()
        .unwrap();
    ctrl.begin().unwrap();

    let (hi, lo) = encode(40.0);
    client.write_registers(0, &[hi, lo]);

    let opts = RunOptions {
        max_iterations: Some(10),
        idle: Duration::from_millis(500),
    };
    let stop = AtomicBool::new(false);
    let mut seen = Vec::new();
    let stats = run(&mut ctrl, &opts, &stop, |r| seen.push(r.iteration));

    assert_eq!(stats.iterations, 10);
    assert_eq!(seen, (1..=10).collect::<Vec<_>>());
    assert_eq!(stats.remote_updates, 1);
    // the remote write, then the first ramp step overshooting 30.0
    assert_eq!(stats.clamps, 2);
    assert_eq!(stats.reversals, 1);
    assert_eq!(stats.faults, 0);
    // iterations at 0, 500, ... 4500 ms: ramp due at 1000, 2000, 3000, 4000
    assert_eq!(stats.ramp_steps, 4);
    assert_eq!(stats.sensor_updates, 4);
    assert_eq!(stats.last_temperature, 22.0);
    assert!((stats.last_voltage - 29.7).abs() < 1e-4);
}

#[test]
fn preset_shutdown_runs_nothing() {
    let mut ctrl = regloop_core::builder()
        .with_server(SimRegisterServer::new())
        .with_sensor(SimSensor::new(22.0))
        .with_encoder(SimEncoder::new())
        .with_clock(TestClock::new())
        .build()
        .unwrap();
    ctrl.begin().unwrap();
    let stop = AtomicBool::new(true);
    let stats = run(&mut ctrl, &RunOptions::default(), &stop, |_| {});
    assert_eq!(stats.iterations, 0);
    assert_eq!(stats.last_voltage, 24.0);
}

#[test]
fn shutdown_from_callback_stops_after_current_iteration() {
    let mut ctrl = regloop_core::builder()
        .with_server(SimRegisterServer::new())
        .with_sensor(SimSensor::new(22.0))
        .with_encoder(SimEncoder::new())
        .with_clock(TestClock::new())
        .build()
        .unwrap();
    ctrl.begin().unwrap();
    let stop = AtomicBool::new(false);
    let stats = run(&mut ctrl, &RunOptions::default(), &stop, |r| {
        if r.iteration == 3 {
            stop.store(true, Ordering::Relaxed);
        }
    });
    assert_eq!(stats.iterations, 3);
}
