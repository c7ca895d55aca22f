use regloop_traits::{DeviceError, Level, QuadratureEncoder};
use rppal::gpio::{Gpio, InputPin};
use tracing::debug;

use crate::error::{HwError, Result};

/// Rotary encoder on two pulled-up GPIO inputs.
pub struct GpioEncoder {
    clk: InputPin,
    dt: InputPin,
}

impl GpioEncoder {
    pub fn new(clk_pin: u8, dt_pin: u8) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let clk = gpio
            .get(clk_pin)
            .map_err(|e| HwError::Gpio(format!("clk pin {clk_pin}: {e}")))?
            .into_input_pullup();
        let dt = gpio
            .get(dt_pin)
            .map_err(|e| HwError::Gpio(format!("dt pin {dt_pin}: {e}")))?
            .into_input_pullup();
        debug!(clk_pin, dt_pin, "encoder inputs configured");
        Ok(GpioEncoder { clk, dt })
    }
}

impl QuadratureEncoder for GpioEncoder {
    fn primary(&mut self) -> std::result::Result<Level, DeviceError> {
        Ok(Level::from(self.clk.is_high()))
    }

    fn secondary(&mut self) -> std::result::Result<Level, DeviceError> {
        Ok(Level::from(self.dt.is_high()))
    }
}
