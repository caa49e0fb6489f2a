//! # 24-bit Fixed-Point Coordinates
//!
//! Latitude and longitude travel as signed 24-bit two's-complement integers
//! of degrees × 10 000, always most significant byte first, whatever the byte
//! order of the surrounding frame.
//!
//! **Range**: ±838.8607°
//! **Resolution**: 0.0001° (about 11 m of latitude)

use crate::error::FormatError;

/// Degrees are multiplied by this before truncation to 24 bits
pub const GEO_SCALE: f64 = 10_000.0;

/// Sign bit of a 24-bit value
const SIGN_BIT: i32 = 0x80_0000;

/// 2^24, subtracted to sign-extend
const TWO_POW_24: i32 = 0x100_0000;

/// Largest positive raw value
const RAW_MAX: i32 = 0x7F_FFFF;

/// Most negative raw value
const RAW_MIN: i32 = -0x80_0000;

/// Decode 3 big-endian bytes into degrees
///
/// # Examples
///
/// ```
/// use loko_p2p::codec::geo::decode_coordinate;
///
/// let lat = decode_coordinate([0x05, 0xF1, 0xC2]);
/// assert!((lat - 38.957).abs() < 1e-9);
/// ```
pub fn decode_coordinate(raw: [u8; 3]) -> f64 {
    let mut scaled = (raw[0] as i32) << 16 | (raw[1] as i32) << 8 | raw[2] as i32;
    if scaled & SIGN_BIT != 0 {
        scaled -= TWO_POW_24;
    }

    scaled as f64 / GEO_SCALE
}

/// Encode degrees into 3 big-endian bytes
///
/// The scaled value is rounded to the nearest step.
///
/// # Errors
///
/// Returns [`FormatError::CoordinateOutOfRange`] if the value is not finite
/// or its scaled magnitude does not fit 24 bits.
pub fn encode_coordinate(degrees: f64) -> Result<[u8; 3], FormatError> {
    let scaled = (degrees * GEO_SCALE).round();
    if !scaled.is_finite() || scaled > RAW_MAX as f64 || scaled < RAW_MIN as f64 {
        return Err(FormatError::CoordinateOutOfRange(degrees));
    }

    let scaled = scaled as i32;
    Ok([(scaled >> 16) as u8, (scaled >> 8) as u8, scaled as u8])
}

#[cfg(test)]
mod tests {
    use super::*;

    const HALF_STEP: f64 = 0.00005;

    #[test]
    fn test_decode_known_positions() {
        assert!((decode_coordinate([0x05, 0xF1, 0xC2]) - 38.957).abs() < 1e-9);
        assert!((decode_coordinate([0x06, 0xF6, 0x72]) - 45.6306).abs() < 1e-9);
        assert!((decode_coordinate([0x08, 0x58, 0x24]) - 54.6852).abs() < 1e-9);
        assert!((decode_coordinate([0x03, 0xDB, 0x94]) - 25.282).abs() < 1e-9);
    }

    #[test]
    fn test_decode_sign_extension() {
        assert_eq!(decode_coordinate([0xFF, 0xFF, 0xFF]), -0.0001);
        assert_eq!(decode_coordinate([0x80, 0x00, 0x00]), -838.8608);
        assert_eq!(decode_coordinate([0x7F, 0xFF, 0xFF]), 838.8607);
        assert_eq!(decode_coordinate([0x00, 0x00, 0x00]), 0.0);
    }

    #[test]
    fn test_encode_is_big_endian() {
        assert_eq!(encode_coordinate(38.957).unwrap(), [0x05, 0xF1, 0xC2]);
        assert_eq!(encode_coordinate(-0.0001).unwrap(), [0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_round_trip_within_half_step() {
        let mut v = -837.9999;
        while v < 838.0 {
            let decoded = decode_coordinate(encode_coordinate(v).unwrap());
            assert!(
                (decoded - v).abs() <= HALF_STEP + 1e-9,
                "round trip drifted for {}: got {}",
                v,
                decoded
            );
            v += 0.37311;
        }
    }

    #[test]
    fn test_round_trip_geographic_extremes() {
        for v in [90.0, -90.0, 180.0, -180.0, 180.12345, -180.54321] {
            let decoded = decode_coordinate(encode_coordinate(v).unwrap());
            assert!((decoded - v).abs() <= HALF_STEP + 1e-9);
        }
    }

    #[test]
    fn test_encode_out_of_range() {
        assert!(matches!(
            encode_coordinate(839.0),
            Err(FormatError::CoordinateOutOfRange(_))
        ));
        assert!(encode_coordinate(-839.0).is_err());
        assert!(encode_coordinate(f64::NAN).is_err());
        assert!(encode_coordinate(f64::INFINITY).is_err());
    }
}
