//! # Quantized Battery Voltage
//!
//! Battery voltage shares a byte with the packet version: the low nibble
//! stores `(volts × 10) - 27`, covering 2.7-4.2 V in 0.1 V steps.

use crate::error::FormatError;

/// Nibble value 0 corresponds to 2.7 V
const NIBBLE_OFFSET: u8 = 27;

/// Volts per nibble step
const VOLTS_PER_STEP: f32 = 0.1;

/// Largest nibble value
const NIBBLE_MAX: u8 = 0x0F;

/// Lowest representable voltage
pub const VOLTAGE_MIN: f32 = 2.7;

/// Highest representable voltage
pub const VOLTAGE_MAX: f32 = 4.2;

/// Float slack when checking range, well below half a step
const RANGE_TOLERANCE: f32 = 0.0005;

/// Decode a voltage nibble into volts
///
/// Only the low 4 bits are used.
pub fn decode_voltage(nibble: u8) -> f32 {
    ((nibble & NIBBLE_MAX) + NIBBLE_OFFSET) as f32 * VOLTS_PER_STEP
}

/// Encode volts into a voltage nibble
///
/// # Errors
///
/// Returns [`FormatError::VoltageOutOfRange`] outside 2.7-4.2 V.
pub fn encode_voltage(volts: f32) -> Result<u8, FormatError> {
    if !volts.is_finite()
        || volts < VOLTAGE_MIN - RANGE_TOLERANCE
        || volts > VOLTAGE_MAX + RANGE_TOLERANCE
    {
        return Err(FormatError::VoltageOutOfRange(volts));
    }

    let steps = (volts / VOLTS_PER_STEP).round() - NIBBLE_OFFSET as f32;
    Ok(steps.clamp(0.0, NIBBLE_MAX as f32) as u8)
}

/// Convert the raw millivolt field of text-mode frames into volts
pub fn volts_from_millivolts(millivolts: u16) -> f32 {
    millivolts as f32 / 1000.0
}

/// Convert volts into whole millivolts for the text-mode field
///
/// # Errors
///
/// Returns [`FormatError::VoltageOutOfRange`] if the value is not finite or
/// does not fit the 16-bit millivolt field.
pub fn millivolts_from_volts(volts: f32) -> Result<u16, FormatError> {
    let millivolts = (volts * 1000.0).round();
    if !millivolts.is_finite() || millivolts < 0.0 || millivolts > u16::MAX as f32 {
        return Err(FormatError::VoltageOutOfRange(volts));
    }

    Ok(millivolts as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_range_ends() {
        assert!((decode_voltage(0) - 2.7).abs() < 1e-5);
        assert!((decode_voltage(15) - 4.2).abs() < 1e-5);
        assert!((decode_voltage(14) - 4.1).abs() < 1e-5);
    }

    #[test]
    fn test_decode_ignores_high_nibble() {
        assert_eq!(decode_voltage(0x1F), decode_voltage(0x0F));
    }

    #[test]
    fn test_round_trip_every_nibble() {
        for nibble in 0..=15u8 {
            assert_eq!(encode_voltage(decode_voltage(nibble)).unwrap(), nibble);
        }
    }

    #[test]
    fn test_encode_rounds_to_nearest_step() {
        assert_eq!(encode_voltage(3.74).unwrap(), 10);
        assert_eq!(encode_voltage(3.76).unwrap(), 11);
        assert_eq!(encode_voltage(2.7).unwrap(), 0);
        assert_eq!(encode_voltage(4.2).unwrap(), 15);
    }

    #[test]
    fn test_encode_out_of_range() {
        assert!(matches!(
            encode_voltage(2.6),
            Err(FormatError::VoltageOutOfRange(_))
        ));
        assert!(encode_voltage(4.3).is_err());
        assert!(encode_voltage(f32::NAN).is_err());
    }

    #[test]
    fn test_millivolts() {
        assert!((volts_from_millivolts(4210) - 4.21).abs() < 1e-5);
        assert_eq!(millivolts_from_volts(4.21).unwrap(), 4210);
        assert_eq!(millivolts_from_volts(65.535).unwrap(), u16::MAX);
    }

    #[test]
    fn test_millivolts_out_of_range() {
        for volts in [-1.0, 70.0, f32::NAN, f32::INFINITY] {
            assert!(
                matches!(
                    millivolts_from_volts(volts),
                    Err(FormatError::VoltageOutOfRange(_))
                ),
                "{} V should be rejected",
                volts
            );
        }
    }
}
