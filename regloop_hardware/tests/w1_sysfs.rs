use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use regloop_hardware::W1Sensor;
use regloop_traits::{TempReading, TemperatureSensor};
use rstest::rstest;
use tempfile::tempdir;

fn write_probe(root: &Path, id: &str, frame: &str) {
    let dir = root.join(id);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("w1_slave"), frame).unwrap();
}

fn good_frame(milli: i32) -> String {
    format!("72 01 4b 46 7f ff 0e 10 57 : crc=57 YES\n72 01 4b 46 7f ff 0e 10 57 t={milli}\n")
}

/// Poll until the worker has delivered a reading or the deadline passes.
fn wait_for_reading(sensor: &mut W1Sensor, index: usize) -> TempReading {
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        let r = sensor.read_celsius(index).expect("probe index valid");
        if r != TempReading::Disconnected || Instant::now() >= deadline {
            return r;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn conversion_runs_off_thread_and_delivers() {
    let dir = tempdir().unwrap();
    write_probe(dir.path(), "28-000000000001", &good_frame(24_500));
    write_probe(dir.path(), "10-not-a-ds18b20", &good_frame(99_000));

    let mut sensor = W1Sensor::with_root(dir.path());
    sensor.begin().unwrap();
    assert_eq!(sensor.probe_count(), 1);

    // Nothing converted yet.
    assert_eq!(sensor.read_celsius(0).unwrap(), TempReading::Disconnected);

    sensor.request_conversion().unwrap();
    assert_eq!(wait_for_reading(&mut sensor, 0), TempReading::Celsius(24.5));
}

#[test]
fn probes_are_ordered_by_id() {
    let dir = tempdir().unwrap();
    write_probe(dir.path(), "28-000000000002", &good_frame(2_000));
    write_probe(dir.path(), "28-000000000001", &good_frame(1_000));

    let mut sensor = W1Sensor::with_root(dir.path());
    sensor.begin().unwrap();
    sensor.request_conversion().unwrap();
    assert_eq!(wait_for_reading(&mut sensor, 1), TempReading::Celsius(2.0));
    assert_eq!(sensor.read_celsius(0).unwrap(), TempReading::Celsius(1.0));
    assert!(sensor.read_celsius(2).is_err());
}

#[rstest]
#[case("ff : crc=00 NO\nff t=0\n")]
#[case("garbage")]
fn unusable_frames_read_as_disconnected(#[case] frame: &str) {
    let dir = tempdir().unwrap();
    write_probe(dir.path(), "28-00000000000a", frame);

    let mut sensor = W1Sensor::with_root(dir.path());
    sensor.begin().unwrap();
    sensor.request_conversion().unwrap();
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(sensor.read_celsius(0).unwrap(), TempReading::Disconnected);
}

#[test]
fn selected_device_only() {
    let dir = tempdir().unwrap();
    write_probe(dir.path(), "28-000000000001", &good_frame(1_000));
    write_probe(dir.path(), "28-000000000002", &good_frame(2_000));

    let mut sensor = W1Sensor::with_root(dir.path()).with_device("28-000000000002");
    sensor.begin().unwrap();
    assert_eq!(sensor.probe_count(), 1);
    sensor.request_conversion().unwrap();
    assert_eq!(wait_for_reading(&mut sensor, 0), TempReading::Celsius(2.0));
}

#[test]
fn request_before_begin_fails() {
    let mut sensor = W1Sensor::with_root("/nonexistent");
    assert!(sensor.request_conversion().is_err());
}

#[test]
fn missing_root_fails_begin() {
    let mut sensor = W1Sensor::with_root("/definitely/not/a/w1/root");
    assert!(sensor.begin().is_err());
}
