//! Boot sequence before the loop runs.

use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eyre::WrapErr;
use regloop_traits::Network;
use regloop_traits::clock::Clock;
use tracing::{debug, info};

use crate::controller::TRACE_TARGET;
use crate::error::Result;
use crate::hw_error::{Device, map_hw_error};

/// Bring up the network interface and block until it is connected with an
/// address, polling every `poll`. There is no timeout; only `shutdown` ends
/// the wait early (reported as an error).
pub fn wait_for_network<N: Network + ?Sized>(
    net: &mut N,
    clock: &dyn Clock,
    poll: Duration,
    shutdown: &AtomicBool,
) -> Result<IpAddr> {
    net.begin()
        .map_err(|e| eyre::Report::new(map_hw_error(&*e, Device::Network)))
        .wrap_err("starting network interface")?;

    let mut attempts: u64 = 0;
    loop {
        if shutdown.load(Ordering::Relaxed) {
            eyre::bail!("shutdown requested while waiting for network");
        }
        if net.is_connected()
            && let Some(ip) = net.local_ip()
        {
            info!(target: TRACE_TARGET, %ip, attempts, "IP address: {ip}");
            return Ok(ip);
        }
        attempts = attempts.saturating_add(1);
        debug!(attempts, "network not connected yet");
        clock.sleep(poll);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regloop_hardware::SimNetwork;
    use regloop_traits::clock::test_clock::TestClock;

    #[test]
    fn returns_ip_after_link_comes_up() {
        let clock = TestClock::new();
        let start = clock.now();
        let mut net = SimNetwork::new(3);
        let stop = AtomicBool::new(false);
        let ip = wait_for_network(&mut net, &clock, Duration::from_millis(500), &stop).unwrap();
        assert_eq!(ip.to_string(), "192.168.1.50");
        // three failed polls, each followed by a sleep
        assert_eq!(clock.ms_since(start), 1500);
    }

    #[test]
    fn shutdown_aborts_the_wait() {
        let clock = TestClock::new();
        let mut net = SimNetwork::new(u32::MAX);
        let stop = AtomicBool::new(true);
        let err = wait_for_network(&mut net, &clock, Duration::from_millis(10), &stop).unwrap_err();
        assert!(err.to_string().contains("shutdown"));
    }
}
