//! Publishing loop values to the register table, and trace-line suppression.

use regloop_traits::RegisterTable;

use crate::codec::write_float;
use crate::config::RegisterMap;
use crate::error::LoopError;
use crate::hw_error::{Device, map_hw_error};
use crate::state::ControlState;
use crate::util::moved;

/// Write voltage and temperature into their register pairs.
///
/// Both pairs are always attempted; the first failure is returned.
pub fn publish<T: RegisterTable + ?Sized>(
    table: &mut T,
    regs: &RegisterMap,
    state: &ControlState,
) -> Result<(), LoopError> {
    let v = write_float(table, regs.voltage, state.voltage)
        .map_err(|e| map_hw_error(&*e, Device::Register(regs.voltage)));
    let t = write_float(table, regs.temperature, state.temperature)
        .map_err(|e| map_hw_error(&*e, Device::Register(regs.temperature)));
    v.and(t)
}

/// Remembers the last traced pair so unchanged values are not traced again.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct TraceGate {
    last: Option<(f32, f32)>,
}

impl TraceGate {
    /// Whether `(voltage, temperature)` warrants a trace line; records it if so.
    pub fn check(&mut self, voltage: f32, temperature: f32, tolerance: f32) -> bool {
        let emit = match self.last {
            None => true,
            Some((v, t)) => moved(voltage, v, tolerance) || moved(temperature, t, tolerance),
        };
        if emit {
            self.last = Some((voltage, temperature));
        }
        emit
    }

    pub fn last(&self) -> Option<(f32, f32)> {
        self.last
    }
}

pub fn trace_line(voltage: f32, temperature: f32) -> String {
    format!("Voltage = {voltage:.2} V | Temperature = {temperature:.2} °C")
}

/// Trace line for the current state, if it moved enough since the last one.
pub fn trace_if_changed(state: &mut ControlState, tolerance: f32) -> Option<String> {
    let (v, t) = (state.voltage, state.temperature);
    state
        .trace
        .check(v, t, tolerance)
        .then(|| trace_line(v, t))
}
