//! Float ↔ holding-register codec.
//!
//! A value occupies two consecutive registers: `addr` holds the high 16 bits
//! of the IEEE-754 single-precision pattern and `addr + 1` the low 16 bits.
//! This is a bit reinterpretation, so every pattern (NaN payloads included)
//! survives a round trip unchanged.

use regloop_traits::{DeviceError, RegisterTable};

/// Split `value` into `(high, low)` register words.
#[inline]
pub fn encode(value: f32) -> (u16, u16) {
    let bits = value.to_bits();
    ((bits >> 16) as u16, bits as u16)
}

/// Join `(high, low)` register words into a float.
#[inline]
pub fn decode(high: u16, low: u16) -> f32 {
    f32::from_bits((u32::from(high) << 16) | u32::from(low))
}

fn second_word(addr: u16) -> Result<u16, DeviceError> {
    addr.checked_add(1)
        .ok_or_else(|| "float register pair exceeds the address space".into())
}

/// Reserve both registers of the float at `addr`.
pub fn allocate_float<T: RegisterTable + ?Sized>(table: &mut T, addr: u16) -> Result<(), DeviceError> {
    let low = second_word(addr)?;
    table.allocate(addr)?;
    table.allocate(low)
}

pub fn write_float<T: RegisterTable + ?Sized>(
    table: &mut T,
    addr: u16,
    value: f32,
) -> Result<(), DeviceError> {
    let low_addr = second_word(addr)?;
    let (high, low) = encode(value);
    table.write(addr, high)?;
    table.write(low_addr, low)
}

pub fn read_float<T: RegisterTable + ?Sized>(table: &T, addr: u16) -> Result<f32, DeviceError> {
    let low_addr = second_word(addr)?;
    Ok(decode(table.read(addr)?, table.read(low_addr)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_patterns() {
        // 24.0 = 0x41C0_0000
        assert_eq!(encode(24.0), (0x41C0, 0x0000));
        // 30.0 = 0x41F0_0000
        assert_eq!(encode(30.0), (0x41F0, 0x0000));
        // 25.5 = 0x41CC_0000
        assert_eq!(decode(0x41CC, 0x0000), 25.5);
        // 0.1 = 0x3DCC_CCCD
        assert_eq!(encode(0.1), (0x3DCC, 0xCCCD));
        assert_eq!(encode(-0.0), (0x8000, 0x0000));
    }

    #[test]
    fn nan_payload_survives() {
        let nan = f32::from_bits(0x7FC0_1234);
        let (h, l) = encode(nan);
        assert_eq!(decode(h, l).to_bits(), 0x7FC0_1234);
    }

    #[test]
    fn pair_at_top_of_address_space_is_rejected() {
        struct Unused;
        impl RegisterTable for Unused {
            fn allocate(&mut self, _addr: u16) -> Result<(), DeviceError> {
                Ok(())
            }
            fn read(&self, _addr: u16) -> Result<u16, DeviceError> {
                Ok(0)
            }
            fn write(&mut self, _addr: u16, _value: u16) -> Result<(), DeviceError> {
                Ok(())
            }
        }
        let mut t = Unused;
        assert!(write_float(&mut t, u16::MAX, 1.0).is_err());
        assert!(read_float(&t, u16::MAX).is_err());
        assert!(allocate_float(&mut t, u16::MAX).is_err());
    }
}
