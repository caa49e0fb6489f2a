//! # Loko P2P Packet Encoder
//!
//! Builds frames the way the tracker firmware transmits them. Used to
//! simulate trackers and to produce fixtures for receivers.

use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::BufMut;

use super::checksum;
use super::cipher::P2pKey;
use super::geo::encode_coordinate;
use super::protocol::*;
use super::voltage::{encode_voltage, millivolts_from_volts};
use crate::error::{FormatError, Result};

/// Encode a 15-byte short plaintext frame
///
/// # Errors
///
/// Returns error if the voltage or a coordinate cannot be represented.
///
/// # Examples
///
/// ```
/// use loko_p2p::codec::encoder::encode_short;
/// use loko_p2p::codec::protocol::TelemetryFix;
///
/// let fix = TelemetryFix {
///     id1: 0,
///     id2: 0,
///     latitude: 38.957,
///     longitude: 45.6306,
///     battery_volts: 4.2,
///     speed_mps: 0,
///     altitude_m: 0,
/// };
/// let frame = encode_short(&fix).unwrap();
/// assert_eq!(frame.len(), 15);
/// ```
pub fn encode_short(fix: &TelemetryFix) -> Result<Vec<u8>> {
    let mut frame = Vec::with_capacity(SHORT_FRAME_SIZE);
    put_plaintext_common(&mut frame, fix, PACKET_VERSION_SHORT)?;
    Ok(frame)
}

/// Encode an 18-byte extended plaintext frame
///
/// # Errors
///
/// Returns error if the voltage or a coordinate cannot be represented.
pub fn encode_extended(fix: &TelemetryFix) -> Result<Vec<u8>> {
    let mut frame = Vec::with_capacity(EXTENDED_FRAME_SIZE);
    put_plaintext_common(&mut frame, fix, PACKET_VERSION_EXTENDED)?;
    frame.put_u8(fix.speed_mps);
    frame.put_i16_le(fix.altitude_m);
    Ok(frame)
}

fn put_plaintext_common(frame: &mut Vec<u8>, fix: &TelemetryFix, version: u8) -> Result<()> {
    frame.put_u32_le(fix.id1);
    frame.put_u32_le(fix.id2);
    frame.put_u8(combine_byte(version, encode_voltage(fix.battery_volts)?));
    frame.put_slice(&encode_coordinate(fix.latitude)?);
    frame.put_slice(&encode_coordinate(fix.longitude)?);
    Ok(())
}

/// Build the sealed plaintext block of an encrypted binary frame
pub fn encrypted_payload(fix: &TelemetryFix) -> Result<[u8; BLOCK_SIZE]> {
    let mut block = [0u8; BLOCK_SIZE];
    {
        let mut buf = &mut block[..INTEGRITY_OFFSET];
        buf.put_u8(combine_byte(0, encode_voltage(fix.battery_volts)?));
        buf.put_slice(&encode_coordinate(fix.latitude)?);
        buf.put_slice(&encode_coordinate(fix.longitude)?);
        buf.put_u8(fix.speed_mps);
        // Unsigned slot on the wire, two's complement for negative altitudes
        buf.put_u16_le(fix.altitude_m as u16);
    }
    checksum::seal(&mut block);
    Ok(block)
}

/// Encode a 25-byte encrypted binary frame
///
/// # Errors
///
/// Returns error if the voltage or a coordinate cannot be represented.
pub fn encode_encrypted(fix: &TelemetryFix, key: &P2pKey) -> Result<Vec<u8>> {
    let ciphertext = key.encrypt_block(&encrypted_payload(fix)?);

    let mut frame = Vec::with_capacity(ENCRYPTED_FRAME_SIZE);
    frame.put_u32(fix.id1);
    frame.put_u32(fix.id2);
    frame.put_u8(combine_byte(PACKET_VERSION_ENCRYPTED, 0));
    frame.put_slice(&ciphertext);
    Ok(frame)
}

/// Build the sealed plaintext block of a text-mode frame
///
/// # Errors
///
/// Returns error if a coordinate does not fit an `f32` or the voltage does
/// not fit the millivolt field.
pub fn text_payload(fix: &TelemetryFix) -> Result<[u8; BLOCK_SIZE]> {
    let latitude = text_coordinate(fix.latitude)?;
    let longitude = text_coordinate(fix.longitude)?;
    let millivolts = millivolts_from_volts(fix.battery_volts)?;

    let mut block = [0u8; BLOCK_SIZE];
    {
        let mut buf = &mut block[..INTEGRITY_OFFSET];
        buf.put_f32_le(latitude);
        buf.put_f32_le(longitude);
        buf.put_u16_le(millivolts);
    }
    checksum::seal(&mut block);
    Ok(block)
}

/// Narrow a coordinate to the `f32` carried by text-mode frames
fn text_coordinate(degrees: f64) -> std::result::Result<f32, FormatError> {
    let narrowed = degrees as f32;
    if !narrowed.is_finite() {
        return Err(FormatError::CoordinateOutOfRange(degrees));
    }

    Ok(narrowed)
}

/// Encode a text-mode line `"<id1>,<id2>,<base64>"`
///
/// Ids are zero-padded the way the firmware prints them (`%02lu,%03lu`).
///
/// # Errors
///
/// Returns error if a coordinate or the voltage cannot be represented.
pub fn encode_text(fix: &TelemetryFix, key: &P2pKey) -> Result<String> {
    let ciphertext = key.encrypt_block(&text_payload(fix)?);
    Ok(format!(
        "{:02}{sep}{:03}{sep}{}",
        fix.id1,
        fix.id2,
        STANDARD.encode(ciphertext),
        sep = TEXT_FIELD_SEPARATOR
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decoder::{decode, decode_line};
    use crate::error::LokoError;

    fn fix() -> TelemetryFix {
        TelemetryFix {
            id1: 123_456,
            id2: 222_222,
            latitude: 54.6851,
            longitude: 25.2822,
            battery_volts: 4.2,
            speed_mps: 2,
            altitude_m: 109,
        }
    }

    fn zero_key() -> P2pKey {
        P2pKey::new(&[0u8; 32]).unwrap()
    }

    #[test]
    fn test_encode_short_matches_reference_frame() {
        let fix = TelemetryFix {
            id1: 0,
            id2: 0,
            latitude: 38.957,
            longitude: 45.6306,
            battery_volts: 4.2,
            speed_mps: 0,
            altitude_m: 0,
        };

        let frame = encode_short(&fix).unwrap();
        assert_eq!(
            frame,
            vec![0, 0, 0, 0, 0, 0, 0, 0, 0x1F, 0x05, 0xF1, 0xC2, 0x06, 0xF6, 0x72]
        );
    }

    #[test]
    fn test_encode_extended_layout() {
        let frame = encode_extended(&fix()).unwrap();
        assert_eq!(frame.len(), EXTENDED_FRAME_SIZE);
        assert_eq!(&frame[0..4], &123_456u32.to_le_bytes());
        assert_eq!(frame[8], 0x2F);
        assert_eq!(frame[15], 2);
        assert_eq!(&frame[16..18], &109i16.to_le_bytes());
    }

    #[test]
    fn test_encrypted_payload_matches_reference_block() {
        let fix = TelemetryFix { id1: 0, id2: 0, ..fix() };
        let block = encrypted_payload(&fix).unwrap();
        assert_eq!(
            block,
            [0x0F, 0x08, 0x58, 0x23, 0x03, 0xDB, 0x96, 0x02, 0x6D, 0, 0, 0, 0, 0, 0, 0x75]
        );
    }

    #[test]
    fn test_encode_encrypted_matches_reference_frame() {
        let fix = TelemetryFix { id1: 0, id2: 0, ..fix() };
        let frame = encode_encrypted(&fix, &zero_key()).unwrap();
        assert_eq!(
            hex::encode_upper(frame),
            "0000000000000000302C01694AAD3996B9831555F75B4251BC"
        );
    }

    #[test]
    fn test_encode_encrypted_decodes_back() {
        let key = P2pKey::new(&[0x42u8; 16]).unwrap();
        let frame = encode_encrypted(&fix(), &key).unwrap();

        let telemetry = decode(RawTransmission::Binary(&frame), Some(&key)).unwrap();
        assert_eq!(telemetry.id1, 123_456);
        assert_eq!(telemetry.id2, 222_222);
        assert_eq!(telemetry.packet_version, PACKET_VERSION_ENCRYPTED);
        assert_eq!(telemetry.altitude_m, Some(109));
        assert!(telemetry.integrity_ok);
    }

    #[test]
    fn test_encode_encrypted_negative_altitude() {
        let key = zero_key();
        let fix = TelemetryFix { altitude_m: -20, ..fix() };
        let frame = encode_encrypted(&fix, &key).unwrap();

        let telemetry = decode(RawTransmission::Binary(&frame), Some(&key)).unwrap();
        assert_eq!(telemetry.altitude_m, Some(-20));
    }

    #[test]
    fn test_encode_text_decodes_back() {
        let key = zero_key();
        let fix = TelemetryFix {
            id1: 0,
            id2: 0,
            latitude: 180.12345,
            longitude: -180.54321,
            battery_volts: 4.21,
            ..fix()
        };

        let line = encode_text(&fix, &key).unwrap();
        assert_eq!(line, "00,000,KsC72EMf5cAYJU8eATDTMg==");

        let telemetry = decode_line(&line, Some(&key)).unwrap();
        assert!((telemetry.latitude - 180.12345).abs() < 1e-4);
        assert!((telemetry.battery_volts - 4.21).abs() < 1e-5);
    }

    #[test]
    fn test_encode_rejects_voltage_out_of_range() {
        let fix = TelemetryFix { battery_volts: 5.0, ..fix() };
        assert!(matches!(
            encode_short(&fix),
            Err(LokoError::Format(FormatError::VoltageOutOfRange(_)))
        ));
        assert!(encode_encrypted(&fix, &zero_key()).is_err());
    }

    #[test]
    fn test_encode_rejects_coordinate_out_of_range() {
        let fix = TelemetryFix { longitude: 900.0, ..fix() };
        assert!(matches!(
            encode_extended(&fix),
            Err(LokoError::Format(FormatError::CoordinateOutOfRange(_)))
        ));
    }

    #[test]
    fn test_encode_text_rejects_non_finite_coordinate() {
        let fix = TelemetryFix { latitude: f64::NAN, ..fix() };
        assert!(matches!(
            encode_text(&fix, &zero_key()),
            Err(LokoError::Format(FormatError::CoordinateOutOfRange(_)))
        ));
    }

    #[test]
    fn test_encode_text_rejects_coordinate_beyond_f32() {
        let fix = TelemetryFix { longitude: 1e40, ..fix() };
        assert!(matches!(
            text_payload(&fix),
            Err(LokoError::Format(FormatError::CoordinateOutOfRange(_)))
        ));
    }

    #[test]
    fn test_encode_text_rejects_voltage_beyond_millivolt_field() {
        let fix = TelemetryFix { battery_volts: 70.0, ..fix() };
        assert!(matches!(
            encode_text(&fix, &zero_key()),
            Err(LokoError::Format(FormatError::VoltageOutOfRange(_)))
        ));

        let fix = TelemetryFix { battery_volts: -0.5, ..self::fix() };
        assert!(encode_text(&fix, &zero_key()).is_err());
    }
}
