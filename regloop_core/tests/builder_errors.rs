use regloop_core::LoopCfg;
use regloop_core::error::BuildError;
use regloop_hardware::{SimEncoder, SimRegisterServer, SimSensor};
use rstest::rstest;

fn build(cfg: LoopCfg) -> regloop_core::Result<()> {
    regloop_core::builder()
        .with_server(SimRegisterServer::new())
        .with_sensor(SimSensor::new(25.0))
        .with_encoder(SimEncoder::new())
        .with_config(cfg)
        .build()
        .map(|_| ())
}

#[rstest]
#[case::inverted_hard(|c: &mut LoopCfg| c.limits.hard_min = 40.0)]
#[case::inverted_auto(|c: &mut LoopCfg| c.limits.auto_max = 20.0)]
#[case::nan_limit(|c: &mut LoopCfg| c.limits.hard_max = f32::NAN)]
#[case::zero_ramp_interval(|c: &mut LoopCfg| c.ramp.interval_ms = 0)]
#[case::zero_poll(|c: &mut LoopCfg| c.sensor.poll_ms = 0)]
#[case::overlapping_registers(|c: &mut LoopCfg| c.registers.temperature = 1)]
#[case::nan_startup(|c: &mut LoopCfg| c.startup.voltage = f32::NAN)]
fn invalid_config_yields_typed_build_error(#[case] tweak: fn(&mut LoopCfg)) {
    let mut cfg = LoopCfg::default();
    tweak(&mut cfg);
    let err = build(cfg).expect_err("config should be rejected");
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::InvalidConfig(_)) => {}
        other => panic!("expected InvalidConfig, got: {other:?}"),
    }
}

#[test]
fn defaults_build() {
    build(LoopCfg::default()).expect("defaults are valid");
}

#[test]
fn step_before_begin_reports_transport_fault() {
    let mut ctrl = regloop_core::builder()
        .with_server(SimRegisterServer::new())
        .with_sensor(SimSensor::new(25.0))
        .with_encoder(SimEncoder::new())
        .build()
        .unwrap();
    let report = ctrl.step();
    assert!(!report.is_clean());
    // the clamp still holds without a working transport
    assert_eq!(report.voltage, 24.0);
}
