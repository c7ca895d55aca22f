//! Host network link: "associated" once the OS has a route and a source address.
use std::net::{IpAddr, SocketAddr, UdpSocket};

use regloop_traits::{DeviceError, Network};
use tracing::trace;

use crate::error::HwError;

/// Documentation-range address used only to ask the OS for a route; no packet is sent.
const DEFAULT_PROBE: &str = "192.0.2.1:9";

#[derive(Debug)]
pub struct HostNetwork {
    probe: SocketAddr,
    ip: Option<IpAddr>,
}

impl HostNetwork {
    pub fn new() -> Result<Self, HwError> {
        let probe = DEFAULT_PROBE
            .parse()
            .map_err(|e| HwError::Network(format!("probe address: {e}")))?;
        Ok(Self::with_probe(probe))
    }

    pub fn with_probe(probe: SocketAddr) -> Self {
        HostNetwork { probe, ip: None }
    }

    fn route_source(&self) -> std::io::Result<IpAddr> {
        let bind: SocketAddr = if self.probe.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };
        let sock = UdpSocket::bind(bind)?;
        sock.connect(self.probe)?;
        Ok(sock.local_addr()?.ip())
    }
}

impl Network for HostNetwork {
    fn begin(&mut self) -> Result<(), DeviceError> {
        self.ip = None;
        Ok(())
    }

    fn is_connected(&mut self) -> bool {
        self.ip = match self.route_source() {
            Ok(ip) if !ip.is_unspecified() => Some(ip),
            Ok(_) => None,
            Err(e) => {
                trace!(error = %e, "no route yet");
                None
            }
        };
        self.ip.is_some()
    }

    fn local_ip(&self) -> Option<IpAddr> {
        self.ip
    }
}
