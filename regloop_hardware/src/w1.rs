//! DS18B20 probes through the Linux 1-Wire sysfs interface.
//!
//! The kernel blocks a `w1_slave` read for the full conversion time (~750 ms),
//! so reads run on a worker thread. `request_conversion` hands the worker a
//! request through a bounded channel and returns immediately; `read_celsius`
//! drains finished results without waiting. A reading therefore reflects the
//! most recently completed conversion.
//!
//! The worker is shut down and joined when the sensor is dropped.
use std::fs;
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

use crossbeam_channel as xch;
use regloop_traits::{DeviceError, TempReading, TemperatureSensor};
use tracing::{debug, trace, warn};

use crate::error::{HwError, Result};

/// Default sysfs root for 1-Wire slaves.
pub const W1_DEVICES: &str = "/sys/bus/w1/devices";

/// DS18B20 family code prefix in slave directory names.
const DS18B20_FAMILY: &str = "28-";

pub struct W1Sensor {
    root: PathBuf,
    device: Option<String>,
    probes: Vec<PathBuf>,
    latest: Vec<TempReading>,
    req_tx: Option<xch::Sender<()>>,
    res_rx: Option<xch::Receiver<Vec<TempReading>>>,
    join_handle: Option<JoinHandle<()>>,
}

impl W1Sensor {
    /// Sensor rooted at the default sysfs location.
    pub fn new() -> Self {
        Self::with_root(W1_DEVICES)
    }

    /// Sensor rooted at `root`; every `28-*` directory is a probe, in name order.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        W1Sensor {
            root: root.into(),
            device: None,
            probes: Vec::new(),
            latest: Vec::new(),
            req_tx: None,
            res_rx: None,
            join_handle: None,
        }
    }

    /// Restrict the sensor to a single slave id (e.g. `28-0000071a2b3c`).
    pub fn with_device(mut self, id: impl Into<String>) -> Self {
        self.device = Some(id.into());
        self
    }

    pub fn probe_count(&self) -> usize {
        self.probes.len()
    }

    fn scan(&self) -> Result<Vec<PathBuf>> {
        let mut found = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let wanted = match &self.device {
                Some(id) => &name == id,
                None => name.starts_with(DS18B20_FAMILY),
            };
            if wanted {
                found.push(entry.path().join("w1_slave"));
            }
        }
        found.sort();
        Ok(found)
    }

    fn shutdown_worker(&mut self) {
        // Dropping the sender ends the worker's receive loop.
        self.req_tx.take();
        if let Some(h) = self.join_handle.take()
            && h.join().is_err()
        {
            warn!("1-wire worker panicked");
        }
        self.res_rx.take();
    }
}

impl Default for W1Sensor {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for W1Sensor {
    fn drop(&mut self) {
        self.shutdown_worker();
    }
}

impl TemperatureSensor for W1Sensor {
    fn begin(&mut self) -> std::result::Result<(), DeviceError> {
        self.shutdown_worker();
        self.probes = self.scan()?;
        if self.probes.is_empty() {
            warn!(root = %self.root.display(), "no 1-wire temperature probes found");
        } else {
            debug!(count = self.probes.len(), "1-wire probes found");
        }
        self.latest = vec![TempReading::Disconnected; self.probes.len()];

        let (req_tx, req_rx) = xch::bounded::<()>(1);
        let (res_tx, res_rx) = xch::bounded::<Vec<TempReading>>(1);
        let probes = self.probes.clone();
        let handle = std::thread::Builder::new()
            .name("w1-conversion".into())
            .spawn(move || {
                for () in req_rx.iter() {
                    let readings: Vec<TempReading> =
                        probes.iter().map(|p| read_probe(p)).collect();
                    // Consumer gone: stop.
                    if res_tx.send(readings).is_err() {
                        break;
                    }
                }
                trace!("1-wire worker exiting");
            })?;

        self.req_tx = Some(req_tx);
        self.res_rx = Some(res_rx);
        self.join_handle = Some(handle);
        Ok(())
    }

    fn request_conversion(&mut self) -> std::result::Result<(), DeviceError> {
        let tx = self.req_tx.as_ref().ok_or(HwError::NotStarted)?;
        match tx.try_send(()) {
            // A conversion is already queued; this request is folded into it.
            Ok(()) | Err(xch::TrySendError::Full(())) => Ok(()),
            Err(xch::TrySendError::Disconnected(())) => {
                Err(HwError::OneWire("conversion worker stopped".into()).into())
            }
        }
    }

    fn read_celsius(&mut self, index: usize) -> std::result::Result<TempReading, DeviceError> {
        if let Some(rx) = &self.res_rx {
            for readings in rx.try_iter() {
                self.latest = readings;
            }
        }
        self.latest
            .get(index)
            .copied()
            .ok_or_else(|| HwError::NoProbe(index).into())
    }
}

fn read_probe(path: &Path) -> TempReading {
    match fs::read_to_string(path) {
        Ok(text) => parse_w1_slave(&text).unwrap_or_else(|e| {
            debug!(path = %path.display(), error = %e, "unusable 1-wire frame");
            TempReading::Disconnected
        }),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "1-wire probe unreadable");
            TempReading::Disconnected
        }
    }
}

/// Parse the two-line `w1_slave` frame:
///
/// ```text
/// 72 01 4b 46 7f ff 0e 10 57 : crc=57 YES
/// 72 01 4b 46 7f ff 0e 10 57 t=23125
/// ```
///
/// A failed CRC is reported as `Disconnected`.
pub fn parse_w1_slave(text: &str) -> Result<TempReading> {
    let mut lines = text.lines();
    let crc_line = lines
        .next()
        .ok_or_else(|| HwError::OneWire("empty frame".into()))?;
    if !crc_line.trim_end().ends_with("YES") {
        return Ok(TempReading::Disconnected);
    }
    let data_line = lines
        .next()
        .ok_or_else(|| HwError::OneWire("missing data line".into()))?;
    let milli = data_line
        .rsplit_once("t=")
        .map(|(_, t)| t.trim())
        .ok_or_else(|| HwError::OneWire("missing t= field".into()))?
        .parse::<i32>()
        .map_err(|e| HwError::OneWire(format!("bad t= field: {e}")))?;
    Ok(TempReading::from_raw_celsius(milli as f32 / 1000.0))
}
