//! # Loko P2P Packet Decoder
//!
//! Decodes the plaintext, encrypted binary and text-mode telemetry frames.
//!
//! Byte order differs per field and per variant, so every field is read with
//! an explicit rule:
//!
//! | frame              | ids | altitude | coordinates |
//! |--------------------|-----|----------|-------------|
//! | plaintext          | LE  | i16 LE   | 24-bit BE   |
//! | encrypted binary   | BE  | u16 LE   | 24-bit BE   |
//! | text mode          | dec | -        | f32 LE      |

use bytes::Buf;
use tracing::debug;

use super::checksum;
use super::cipher::P2pKey;
use super::classifier::classify;
use super::geo::decode_coordinate;
use super::protocol::*;
use super::voltage::{decode_voltage, volts_from_millivolts};
use crate::error::{CryptoError, FormatError, Result};

/// Decode a raw transmission
///
/// # Arguments
///
/// * `raw` - Binary frame or text-mode line
/// * `key` - P2P key, only needed for encrypted variants
///
/// # Returns
///
/// * `Result<DecodedTelemetry>` - Decoded record
///
/// # Errors
///
/// Returns error if:
/// - The transmission matches no known variant
/// - The frame is encrypted and no key was given
/// - The decrypted payload fails its checksum (wrong key or corrupted frame)
///
/// # Examples
///
/// ```
/// use loko_p2p::codec::decoder::decode;
/// use loko_p2p::codec::protocol::RawTransmission;
///
/// let frame = [0, 0, 0, 0, 0, 0, 0, 0, 0x1F, 0x05, 0xF1, 0xC2, 0x06, 0xF6, 0x72];
/// let telemetry = decode(RawTransmission::Binary(&frame), None).unwrap();
/// assert_eq!(telemetry.packet_version, 1);
/// ```
pub fn decode(raw: RawTransmission<'_>, key: Option<&P2pKey>) -> Result<DecodedTelemetry> {
    let packet = classify(raw)?;
    decode_packet(&packet, key)
}

/// Decode an already classified packet
pub fn decode_packet(packet: &Packet<'_>, key: Option<&P2pKey>) -> Result<DecodedTelemetry> {
    match packet {
        Packet::PlaintextShort(frame) => Ok(decode_plaintext_short(frame)),
        Packet::PlaintextExtended(frame) => Ok(decode_plaintext_extended(frame)),
        Packet::EncryptedBinary(frame) => {
            decode_encrypted_binary(frame, key.ok_or(CryptoError::MissingKey)?)
        }
        Packet::EncryptedText { id1, id2, block } => {
            decode_encrypted_text(*id1, *id2, block, key.ok_or(CryptoError::MissingKey)?)
        }
    }
}

/// Decode a hex-encoded binary frame, as printed by radio receivers
///
/// Whitespace between bytes is ignored.
pub fn decode_hex(frame_hex: &str, key: Option<&P2pKey>) -> Result<DecodedTelemetry> {
    let compact: String = frame_hex.chars().filter(|c| !c.is_whitespace()).collect();
    let frame = hex::decode(&compact).map_err(|e| FormatError::InvalidHex(e.to_string()))?;
    decode(RawTransmission::Binary(&frame), key)
}

/// Decode one received line
///
/// Lines containing a comma are text-mode frames; anything else is taken as
/// a hex-encoded binary frame.
pub fn decode_line(line: &str, key: Option<&P2pKey>) -> Result<DecodedTelemetry> {
    let line = line.trim();
    if line.contains(TEXT_FIELD_SEPARATOR) {
        decode(RawTransmission::Text(line), key)
    } else {
        decode_hex(line, key)
    }
}

/// Decode a 15-byte plaintext frame
///
/// Layout: id1 (u32 LE), id2 (u32 LE), version/voltage, latitude, longitude.
pub fn decode_plaintext_short(frame: &[u8; SHORT_FRAME_SIZE]) -> DecodedTelemetry {
    let mut buf = &frame[..];
    decode_plaintext_common(&mut buf, PacketVariant::PlaintextShort)
}

/// Decode an 18-byte plaintext frame
///
/// Layout: the short frame followed by speed (u8) and altitude (i16 LE).
pub fn decode_plaintext_extended(frame: &[u8; EXTENDED_FRAME_SIZE]) -> DecodedTelemetry {
    let mut buf = &frame[..];
    let mut telemetry = decode_plaintext_common(&mut buf, PacketVariant::PlaintextExtended);
    telemetry.speed_mps = Some(buf.get_u8());
    telemetry.altitude_m = Some(buf.get_i16_le());
    telemetry
}

fn decode_plaintext_common(buf: &mut &[u8], variant: PacketVariant) -> DecodedTelemetry {
    let id1 = buf.get_u32_le();
    let id2 = buf.get_u32_le();
    let (packet_version, voltage_nibble) = split_combined_byte(buf.get_u8());
    let latitude = read_coordinate(buf);
    let longitude = read_coordinate(buf);

    DecodedTelemetry {
        variant,
        id1,
        id2,
        packet_version,
        battery_volts: decode_voltage(voltage_nibble),
        latitude,
        longitude,
        altitude_m: None,
        speed_mps: None,
        integrity_ok: false,
    }
}

/// Decode a 25-byte encrypted binary frame
///
/// The ids are big-endian here, unlike the plaintext frames. The outer
/// combined byte carries the version nibble; its low nibble is reserved.
///
/// # Errors
///
/// Returns [`crate::error::IntegrityError::ChecksumMismatch`] if the
/// decrypted payload fails its checksum. No partial record is produced.
pub fn decode_encrypted_binary(
    frame: &[u8; ENCRYPTED_FRAME_SIZE],
    key: &P2pKey,
) -> Result<DecodedTelemetry> {
    let mut buf = &frame[..];
    let id1 = buf.get_u32();
    let id2 = buf.get_u32();
    let (packet_version, _reserved) = split_combined_byte(buf.get_u8());

    let mut ciphertext = [0u8; BLOCK_SIZE];
    buf.copy_to_slice(&mut ciphertext);

    let plaintext = key.decrypt_block(&ciphertext);
    verify_payload(&plaintext, PacketVariant::EncryptedBinary)?;

    let mut payload = &plaintext[..];
    // Inner high nibble is reserved and always zero
    let (_reserved, voltage_nibble) = split_combined_byte(payload.get_u8());
    let latitude = read_coordinate(&mut payload);
    let longitude = read_coordinate(&mut payload);
    let speed_mps = payload.get_u8();
    let altitude_raw = payload.get_u16_le();

    // Firmware stores a signed altitude in this unsigned slot
    let altitude_m = altitude_raw as i16;
    if altitude_m < 0 {
        debug!(
            "Encrypted frame altitude slot reads {} unsigned, reporting {} m",
            altitude_raw, altitude_m
        );
    }

    Ok(DecodedTelemetry {
        variant: PacketVariant::EncryptedBinary,
        id1,
        id2,
        packet_version,
        battery_volts: decode_voltage(voltage_nibble),
        latitude,
        longitude,
        altitude_m: Some(altitude_m),
        speed_mps: Some(speed_mps),
        integrity_ok: true,
    })
}

/// Decode the 16-byte block of a text-mode frame
///
/// Layout after decryption: latitude (f32 LE), longitude (f32 LE), battery
/// millivolts (u16 LE), reserved (u32), reserved (u8), integrity.
///
/// # Errors
///
/// Returns [`crate::error::IntegrityError::ChecksumMismatch`] if the
/// decrypted payload fails its checksum.
pub fn decode_encrypted_text(
    id1: u32,
    id2: u32,
    block: &[u8; BLOCK_SIZE],
    key: &P2pKey,
) -> Result<DecodedTelemetry> {
    let plaintext = key.decrypt_block(block);
    verify_payload(&plaintext, PacketVariant::EncryptedText)?;

    let mut payload = &plaintext[..];
    let latitude = payload.get_f32_le() as f64;
    let longitude = payload.get_f32_le() as f64;
    let battery_mv = payload.get_u16_le();

    Ok(DecodedTelemetry {
        variant: PacketVariant::EncryptedText,
        id1,
        id2,
        packet_version: PACKET_VERSION_TEXT,
        battery_volts: volts_from_millivolts(battery_mv),
        latitude,
        longitude,
        altitude_m: None,
        speed_mps: None,
        integrity_ok: true,
    })
}

fn verify_payload(plaintext: &[u8; BLOCK_SIZE], variant: PacketVariant) -> Result<()> {
    checksum::verify(plaintext).map_err(|e| {
        debug!("{:?} payload rejected: {}", variant, e);
        e.into()
    })
}

fn read_coordinate(buf: &mut &[u8]) -> f64 {
    let mut raw = [0u8; 3];
    buf.copy_to_slice(&mut raw);
    decode_coordinate(raw)
}
