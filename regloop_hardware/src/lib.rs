pub mod error;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio;
pub mod net;
pub mod w1;

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::net::{IpAddr, Ipv4Addr};
use std::rc::Rc;

use regloop_traits::{
    DeviceError, Level, Network, QuadratureEncoder, RegisterServer, RegisterTable, TempReading,
    TemperatureSensor,
};
use tracing::{debug, trace, warn};

use crate::error::HwError;

pub use net::HostNetwork;
pub use w1::W1Sensor;

/// In-memory holding-register table.
#[derive(Debug, Default, Clone)]
pub struct MemoryRegisters {
    regs: BTreeMap<u16, u16>,
}

impl MemoryRegisters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_allocated(&self, addr: u16) -> bool {
        self.regs.contains_key(&addr)
    }

    pub fn len(&self) -> usize {
        self.regs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regs.is_empty()
    }
}

impl RegisterTable for MemoryRegisters {
    fn allocate(&mut self, addr: u16) -> Result<(), DeviceError> {
        self.regs.entry(addr).or_insert(0);
        Ok(())
    }

    fn read(&self, addr: u16) -> Result<u16, DeviceError> {
        self.regs
            .get(&addr)
            .copied()
            .ok_or_else(|| HwError::Unallocated(addr).into())
    }

    fn write(&mut self, addr: u16, value: u16) -> Result<(), DeviceError> {
        match self.regs.get_mut(&addr) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(HwError::Unallocated(addr).into()),
        }
    }
}

#[derive(Debug, Default)]
struct SimBus {
    table: MemoryRegisters,
    inbox: VecDeque<(u16, u16)>,
    rejected: usize,
}

/// Simulated register server. Remote traffic comes from a [`RemoteClient`]
/// and is applied to the table on the next `poll`, in arrival order.
#[derive(Debug, Default)]
pub struct SimRegisterServer {
    bus: Rc<RefCell<SimBus>>,
    started: bool,
}

impl SimRegisterServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for acting as the remote peer.
    pub fn client(&self) -> RemoteClient {
        RemoteClient {
            bus: Rc::clone(&self.bus),
        }
    }
}

impl RegisterTable for SimRegisterServer {
    fn allocate(&mut self, addr: u16) -> Result<(), DeviceError> {
        self.bus.borrow_mut().table.allocate(addr)
    }

    fn read(&self, addr: u16) -> Result<u16, DeviceError> {
        self.bus.borrow().table.read(addr)
    }

    fn write(&mut self, addr: u16, value: u16) -> Result<(), DeviceError> {
        self.bus.borrow_mut().table.write(addr, value)
    }
}

impl RegisterServer for SimRegisterServer {
    fn start(&mut self) -> Result<(), DeviceError> {
        self.started = true;
        debug!("simulated register server started");
        Ok(())
    }

    fn poll(&mut self) -> Result<(), DeviceError> {
        if !self.started {
            return Err(HwError::NotStarted.into());
        }
        let mut bus = self.bus.borrow_mut();
        while let Some((addr, value)) = bus.inbox.pop_front() {
            if bus.table.write(addr, value).is_err() {
                bus.rejected += 1;
                warn!(addr, "remote write to unallocated register ignored");
            } else {
                trace!(addr, value, "remote write applied");
            }
        }
        Ok(())
    }
}

/// Remote peer attached to a [`SimRegisterServer`].
#[derive(Debug, Clone)]
pub struct RemoteClient {
    bus: Rc<RefCell<SimBus>>,
}

impl RemoteClient {
    /// Queue a write of consecutive registers starting at `addr`.
    pub fn write_registers(&self, addr: u16, words: &[u16]) {
        let mut bus = self.bus.borrow_mut();
        for (i, w) in words.iter().enumerate() {
            bus.inbox.push_back((addr.wrapping_add(i as u16), *w));
        }
    }

    /// Read `count` consecutive registers as currently served.
    pub fn read_registers(&self, addr: u16, count: u16) -> Result<Vec<u16>, DeviceError> {
        let bus = self.bus.borrow();
        (0..count)
            .map(|i| bus.table.read(addr.wrapping_add(i)))
            .collect()
    }

    /// Writes dropped because they targeted unallocated registers.
    pub fn rejected_writes(&self) -> usize {
        self.bus.borrow().rejected
    }

    pub fn pending_writes(&self) -> usize {
        self.bus.borrow().inbox.len()
    }
}

#[derive(Debug)]
struct ProbeState {
    celsius: f32,
    connected: bool,
    drift_per_conversion: f32,
    conversions: u64,
}

/// Simulated single-probe temperature sensor.
#[derive(Debug)]
pub struct SimSensor {
    probe: Rc<RefCell<ProbeState>>,
    started: bool,
}

impl SimSensor {
    pub fn new(celsius: f32) -> Self {
        SimSensor {
            probe: Rc::new(RefCell::new(ProbeState {
                celsius,
                connected: true,
                drift_per_conversion: 0.0,
                conversions: 0,
            })),
            started: false,
        }
    }

    /// Temperature moves by `delta` °C on every conversion.
    pub fn with_drift(self, delta: f32) -> Self {
        self.probe.borrow_mut().drift_per_conversion = delta;
        self
    }

    pub fn probe(&self) -> SimProbe {
        SimProbe {
            state: Rc::clone(&self.probe),
        }
    }
}

impl TemperatureSensor for SimSensor {
    fn begin(&mut self) -> Result<(), DeviceError> {
        self.started = true;
        Ok(())
    }

    fn request_conversion(&mut self) -> Result<(), DeviceError> {
        let mut p = self.probe.borrow_mut();
        p.conversions += 1;
        if p.connected {
            p.celsius += p.drift_per_conversion;
        }
        Ok(())
    }

    fn read_celsius(&mut self, index: usize) -> Result<TempReading, DeviceError> {
        if index != 0 {
            return Err(HwError::NoProbe(index).into());
        }
        let p = self.probe.borrow();
        if !self.started || !p.connected {
            return Ok(TempReading::Disconnected);
        }
        Ok(TempReading::from_raw_celsius(p.celsius))
    }
}

/// Test/CLI handle for steering a [`SimSensor`].
#[derive(Debug, Clone)]
pub struct SimProbe {
    state: Rc<RefCell<ProbeState>>,
}

impl SimProbe {
    pub fn set_celsius(&self, c: f32) {
        self.state.borrow_mut().celsius = c;
    }

    pub fn disconnect(&self) {
        self.state.borrow_mut().connected = false;
    }

    pub fn reconnect(&self) {
        self.state.borrow_mut().connected = true;
    }

    pub fn conversions(&self) -> u64 {
        self.state.borrow().conversions
    }
}

#[derive(Debug)]
struct EncoderPins {
    clk: Level,
    dt: Level,
    dt_reads: u64,
}

/// Simulated rotary encoder; pins idle high as with pull-ups.
#[derive(Debug)]
pub struct SimEncoder {
    pins: Rc<RefCell<EncoderPins>>,
}

impl Default for SimEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SimEncoder {
    pub fn new() -> Self {
        SimEncoder {
            pins: Rc::new(RefCell::new(EncoderPins {
                clk: Level::High,
                dt: Level::High,
                dt_reads: 0,
            })),
        }
    }

    pub fn knob(&self) -> SimKnob {
        SimKnob {
            pins: Rc::clone(&self.pins),
        }
    }
}

impl QuadratureEncoder for SimEncoder {
    fn primary(&mut self) -> Result<Level, DeviceError> {
        Ok(self.pins.borrow().clk)
    }

    fn secondary(&mut self) -> Result<Level, DeviceError> {
        let mut pins = self.pins.borrow_mut();
        pins.dt_reads += 1;
        Ok(pins.dt)
    }
}

/// Handle for turning a [`SimEncoder`].
#[derive(Debug, Clone)]
pub struct SimKnob {
    pins: Rc<RefCell<EncoderPins>>,
}

impl SimKnob {
    pub fn set_levels(&self, clk: Level, dt: Level) {
        let mut pins = self.pins.borrow_mut();
        pins.clk = clk;
        pins.dt = dt;
    }

    /// Produce one CLK transition; clockwise leaves DT opposite the new CLK level.
    pub fn turn(&self, clockwise: bool) {
        let mut pins = self.pins.borrow_mut();
        let clk = pins.clk.toggled();
        pins.clk = clk;
        pins.dt = if clockwise { clk.toggled() } else { clk };
    }

    pub fn secondary_reads(&self) -> u64 {
        self.pins.borrow().dt_reads
    }
}

/// Simulated link that associates after a fixed number of status polls.
#[derive(Debug)]
pub struct SimNetwork {
    polls_until_up: u32,
    polls: u32,
    started: bool,
    ip: IpAddr,
}

impl SimNetwork {
    pub fn new(polls_until_up: u32) -> Self {
        SimNetwork {
            polls_until_up,
            polls: 0,
            started: false,
            ip: IpAddr::V4(Ipv4Addr::new(192, 168, 1, 50)),
        }
    }

    pub fn with_ip(mut self, ip: IpAddr) -> Self {
        self.ip = ip;
        self
    }

    pub fn polls(&self) -> u32 {
        self.polls
    }
}

impl Network for SimNetwork {
    fn begin(&mut self) -> Result<(), DeviceError> {
        self.started = true;
        Ok(())
    }

    fn is_connected(&mut self) -> bool {
        if !self.started {
            return false;
        }
        self.polls = self.polls.saturating_add(1);
        self.polls > self.polls_until_up
    }

    fn local_ip(&self) -> Option<IpAddr> {
        (self.started && self.polls > self.polls_until_up).then_some(self.ip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_registers_reject_unallocated() {
        let mut regs = MemoryRegisters::new();
        assert!(regs.read(3).is_err());
        regs.allocate(3).unwrap();
        regs.write(3, 0xBEEF).unwrap();
        assert_eq!(regs.read(3).unwrap(), 0xBEEF);
        assert!(regs.write(4, 1).is_err());
    }

    #[test]
    fn remote_writes_land_on_poll() {
        let mut server = SimRegisterServer::new();
        server.allocate(0).unwrap();
        server.allocate(1).unwrap();
        server.start().unwrap();
        let client = server.client();
        client.write_registers(0, &[0x4220, 0x0000]);
        assert_eq!(server.read(0).unwrap(), 0);
        server.poll().unwrap();
        assert_eq!(server.read(0).unwrap(), 0x4220);
        assert_eq!(client.read_registers(0, 2).unwrap(), vec![0x4220, 0]);
    }

    #[test]
    fn writes_to_unallocated_registers_are_counted() {
        let mut server = SimRegisterServer::new();
        server.allocate(0).unwrap();
        server.start().unwrap();
        let client = server.client();
        client.write_registers(0, &[7, 8]);
        assert_eq!(client.pending_writes(), 2);
        server.poll().unwrap();
        assert_eq!(client.pending_writes(), 0);
        assert_eq!(client.rejected_writes(), 1);
        assert_eq!(server.read(0).unwrap(), 7);
    }

    #[test]
    fn memory_registers_track_allocation() {
        let mut regs = MemoryRegisters::new();
        assert!(regs.is_empty());
        regs.allocate(4).unwrap();
        regs.allocate(4).unwrap();
        assert!(regs.is_allocated(4));
        assert!(!regs.is_allocated(5));
        assert_eq!(regs.len(), 1);
    }

    #[test]
    fn poll_before_start_fails() {
        let mut server = SimRegisterServer::new();
        assert!(server.poll().is_err());
    }

    #[test]
    fn sim_sensor_disconnects() {
        let mut sensor = SimSensor::new(21.0);
        let probe = sensor.probe();
        sensor.begin().unwrap();
        sensor.request_conversion().unwrap();
        assert_eq!(sensor.read_celsius(0).unwrap(), TempReading::Celsius(21.0));
        probe.disconnect();
        assert_eq!(sensor.read_celsius(0).unwrap(), TempReading::Disconnected);
        assert!(sensor.read_celsius(1).is_err());
        assert_eq!(probe.conversions(), 1);
        probe.reconnect();
        probe.set_celsius(22.5);
        assert_eq!(sensor.read_celsius(0).unwrap(), TempReading::Celsius(22.5));
    }

    #[test]
    fn knob_levels_drive_encoder_pins() {
        let mut enc = SimEncoder::new();
        let knob = enc.knob();
        assert_eq!(enc.primary().unwrap(), Level::High);
        knob.set_levels(Level::Low, Level::High);
        assert_eq!(enc.primary().unwrap(), Level::Low);
        assert_eq!(enc.secondary().unwrap(), Level::High);
        assert_eq!(knob.secondary_reads(), 1);
    }

    #[test]
    fn sim_network_comes_up_after_polls() {
        let mut net = SimNetwork::new(2);
        assert!(!net.is_connected());
        net.begin().unwrap();
        assert!(!net.is_connected());
        assert!(!net.is_connected());
        assert!(net.is_connected());
        assert!(net.local_ip().is_some());
        assert_eq!(net.polls(), 3);
    }

    #[test]
    fn sim_network_reports_configured_ip() {
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7));
        let mut net = SimNetwork::new(0).with_ip(ip);
        net.begin().unwrap();
        assert_eq!(net.local_ip(), None);
        assert!(net.is_connected());
        assert_eq!(net.local_ip(), Some(ip));
    }
}
