use std::fmt;
use std::ops::RangeInclusive;

// --- --- --- --- ADT74x0 Constants --- --- --- ---

// ADT7410/ADT7420 registers, all 1 byte
pub const ADT74X0_T_MSB: u8 = 0x00;
pub const ADT74X0_T_LSB: u8 = 0x01;
pub const ADT74X0_STATUS: u8 = 0x02;
pub const ADT74X0_CONFIG: u8 = 0x03;
pub const ADT74X0_ID: u8 = 0x0B;
pub const ADT74X0_RESET: u8 = 0x2F; // Command byte, no data

pub const ADT74X0_CONFIG_16BIT_CONTINUOUS: u8 = 0b1000_0000;

pub const ADT74X0_ID_MASK: u8 = 0b1111_1000; // Low 3 bits are the silicon revision
pub const ADT74X0_ID_EXPECTED: u8 = 0b1100_1000;

/// The only addresses the A0/A1 strap pins can select.
pub const ADT74X0_ADDR_WINDOW: RangeInclusive<u8> = 0x48..=0x4B;

/// Returns true if `id` (the raw contents of the ID register) belongs to an ADT7410 or ADT7420.
pub fn is_adt74x0_id(id: u8) -> bool {
    id & ADT74X0_ID_MASK == ADT74X0_ID_EXPECTED
}

/// A temperature in the sensor's native 16-bit format, 1/128 °C per LSB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Temperature(i16);

impl Temperature {
    /// Builds a temperature from the T_MSB/T_LSB register pair as it arrives on the wire.
    pub fn from_wire(bytes: [u8; 2]) -> Temperature {
        Temperature(i16::from_be_bytes(bytes))
    }

    pub fn raw(self) -> i16 {
        self.0
    }

    pub fn celsius(self) -> f64 {
        f64::from(self.0) / 128.0
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:.5}C", self.celsius())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_positive_and_negative_readings() {
        assert_eq!(Temperature::from_wire([0x00, 0x80]).celsius(), 1.0);
        assert_eq!(Temperature::from_wire([0xFF, 0x80]).celsius(), -1.0);
        assert_eq!(Temperature::from_wire([0x19, 0x00]).celsius(), 50.0);
        assert_eq!(Temperature::from_wire([0x0B, 0xC0]).celsius(), 23.5);
        assert_eq!(Temperature::from_wire([0xFD, 0x80]).celsius(), -5.0);
    }

    #[test]
    fn decodes_extremes_of_the_register() {
        assert_eq!(Temperature::from_wire([0x80, 0x00]).raw(), i16::MIN);
        assert_eq!(Temperature::from_wire([0x80, 0x00]).celsius(), -256.0);
        assert_eq!(Temperature::from_wire([0x7F, 0xFF]).celsius(), 32767.0 / 128.0);
    }

    #[test]
    fn formats_with_five_decimals() {
        assert_eq!(Temperature::from_wire([0x0C, 0x00]).to_string(), "24.00000C");
        assert_eq!(Temperature::from_wire([0xFD, 0x80]).to_string(), "-5.00000C");
        assert_eq!(Temperature::from_wire([0x00, 0x01]).to_string(), "0.00781C");
    }

    #[test]
    fn identity_check_only_looks_at_top_five_bits() {
        for id in [0xC8, 0xC9, 0xCB, 0xCF] {
            assert!(is_adt74x0_id(id), "{:#04x} should be accepted", id);
        }
        for id in [0x00, 0xD0, 0x48, 0xC0, 0xFF] {
            assert!(!is_adt74x0_id(id), "{:#04x} should be rejected", id);
        }
    }
}
