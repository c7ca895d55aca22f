//! Maps `Box<dyn Error>` from trait boundaries to typed `LoopError`.
//!
//! The traits in `regloop_traits` use `Box<dyn Error + Send + Sync>`; this
//! module converts those to our typed error enum, with an optional
//! feature-gated path for `regloop_hardware::HwError` downcasting.

use crate::error::LoopError;

/// Which collaborator produced an error; decides the fallback variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Transport,
    Register(u16),
    Encoder,
    Sensor,
    Network,
}

/// Map a trait-boundary error to a typed `LoopError`.
///
/// Known hardware error types are downcast first; anything else is classified
/// by the device it came from.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static), device: Device) -> LoopError {
    #[cfg(feature = "hardware-errors")]
    {
        use regloop_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Unallocated(addr) => LoopError::Register {
                    addr: *addr,
                    msg: hw.to_string(),
                },
                HwError::NotStarted => LoopError::Transport(hw.to_string()),
                HwError::Gpio(_) => LoopError::Encoder(hw.to_string()),
                HwError::NoProbe(_) | HwError::OneWire(_) => LoopError::Sensor(hw.to_string()),
                HwError::Network(_) => LoopError::Network(hw.to_string()),
                HwError::Io(_) => LoopError::HardwareFault(hw.to_string()),
            };
        }
    }

    let msg = e.to_string();
    match device {
        Device::Transport => LoopError::Transport(msg),
        Device::Register(addr) => LoopError::Register { addr, msg },
        Device::Encoder => LoopError::Encoder(msg),
        Device::Sensor => LoopError::Sensor(msg),
        Device::Network => LoopError::Network(msg),
    }
}
