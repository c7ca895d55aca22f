pub mod clock;

pub use clock::{Clock, MonotonicClock};

use std::net::IpAddr;

/// Error type returned across every device trait boundary.
pub type DeviceError = Box<dyn std::error::Error + Send + Sync>;

/// Raw temperature value drivers report for an absent or unreadable probe.
pub const DEVICE_DISCONNECTED_C: f32 = -127.0;

/// Logic level of a digital input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Low,
    High,
}

impl Level {
    #[inline]
    pub fn is_high(self) -> bool {
        matches!(self, Level::High)
    }

    #[inline]
    pub fn toggled(self) -> Self {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

impl From<bool> for Level {
    #[inline]
    fn from(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }
}

/// One temperature sample from a sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TempReading {
    Celsius(f32),
    Disconnected,
}

impl TempReading {
    /// Map a raw driver value, treating the disconnected sentinel (and NaN) as absent.
    pub fn from_raw_celsius(c: f32) -> Self {
        if c.is_nan() || c == DEVICE_DISCONNECTED_C {
            TempReading::Disconnected
        } else {
            TempReading::Celsius(c)
        }
    }

    pub fn celsius(self) -> Option<f32> {
        match self {
            TempReading::Celsius(c) => Some(c),
            TempReading::Disconnected => None,
        }
    }
}

/// Holding-register table addressed by 16-bit register number.
pub trait RegisterTable {
    /// Make `addr` available to remote peers. Allocating twice is a no-op.
    fn allocate(&mut self, addr: u16) -> Result<(), DeviceError>;
    fn read(&self, addr: u16) -> Result<u16, DeviceError>;
    fn write(&mut self, addr: u16, value: u16) -> Result<(), DeviceError>;
}

/// Server side of the register protocol.
///
/// `poll` services pending client traffic and must return promptly; remote
/// writes become visible through `RegisterTable::read` once polled.
pub trait RegisterServer: RegisterTable {
    fn start(&mut self) -> Result<(), DeviceError>;
    fn poll(&mut self) -> Result<(), DeviceError>;
}

pub trait TemperatureSensor {
    /// Initialize the bus and enumerate probes.
    fn begin(&mut self) -> Result<(), DeviceError>;
    /// Kick off a measurement cycle. Must not block the caller.
    fn request_conversion(&mut self) -> Result<(), DeviceError>;
    /// Latest reading of the probe at `index`.
    fn read_celsius(&mut self, index: usize) -> Result<TempReading, DeviceError>;
}

/// Two-channel rotary encoder (CLK = primary, DT = secondary).
pub trait QuadratureEncoder {
    fn primary(&mut self) -> Result<Level, DeviceError>;
    fn secondary(&mut self) -> Result<Level, DeviceError>;
}

/// Network link that must be associated before the register server starts.
pub trait Network {
    fn begin(&mut self) -> Result<(), DeviceError>;
    fn is_connected(&mut self) -> bool;
    fn local_ip(&self) -> Option<IpAddr>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_maps_to_disconnected() {
        assert_eq!(
            TempReading::from_raw_celsius(DEVICE_DISCONNECTED_C),
            TempReading::Disconnected
        );
        assert_eq!(
            TempReading::from_raw_celsius(f32::NAN),
            TempReading::Disconnected
        );
        assert_eq!(
            TempReading::from_raw_celsius(21.5),
            TempReading::Celsius(21.5)
        );
    }

    #[test]
    fn level_helpers() {
        assert_eq!(Level::from(true), Level::High);
        assert_eq!(Level::Low.toggled(), Level::High);
        assert!(!Level::Low.is_high());
    }
}
