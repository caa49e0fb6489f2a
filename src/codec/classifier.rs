//! # Packet Classifier
//!
//! Frames carry no magic number or explicit type: binary frames are told
//! apart by their length alone, text frames by their comma-separated shape.

use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::debug;

use super::protocol::*;
use crate::error::FormatError;

/// Classify a raw transmission
///
/// # Arguments
///
/// * `raw` - Binary frame or text-mode line
///
/// # Returns
///
/// * `Result<Packet, FormatError>` - Classified packet
///
/// # Errors
///
/// Returns error if:
/// - Binary length is not 15, 18 or 25 bytes
/// - Text is not `"<id1>,<id2>,<base64>"` with decimal ids
/// - The base64 blob is invalid or does not decode to 16 bytes
pub fn classify<'a>(raw: RawTransmission<'a>) -> Result<Packet<'a>, FormatError> {
    let packet = match raw {
        RawTransmission::Binary(frame) => classify_binary(frame)?,
        RawTransmission::Text(line) => classify_text(line)?,
    };

    debug!("Classified transmission as {:?}", packet.variant());
    Ok(packet)
}

/// Classify a binary frame by its length
pub fn classify_binary(frame: &[u8]) -> Result<Packet<'_>, FormatError> {
    if let Ok(short) = <&[u8; SHORT_FRAME_SIZE]>::try_from(frame) {
        return Ok(Packet::PlaintextShort(short));
    }
    if let Ok(extended) = <&[u8; EXTENDED_FRAME_SIZE]>::try_from(frame) {
        return Ok(Packet::PlaintextExtended(extended));
    }
    if let Ok(encrypted) = <&[u8; ENCRYPTED_FRAME_SIZE]>::try_from(frame) {
        return Ok(Packet::EncryptedBinary(encrypted));
    }

    Err(FormatError::UnrecognizedLength(format!(
        "{} bytes (expected {}, {} or {})",
        frame.len(),
        SHORT_FRAME_SIZE,
        EXTENDED_FRAME_SIZE,
        ENCRYPTED_FRAME_SIZE
    )))
}

/// Classify a text-mode line `"<id1>,<id2>,<base64>"`
pub fn classify_text(line: &str) -> Result<Packet<'static>, FormatError> {
    let fields: Vec<&str> = line.trim().split(TEXT_FIELD_SEPARATOR).collect();
    let [id1, id2, blob] = fields.as_slice() else {
        return Err(FormatError::UnrecognizedLength(format!(
            "text line with {} fields (expected 3)",
            fields.len()
        )));
    };

    let id1 = parse_id(id1)?;
    let id2 = parse_id(id2)?;

    let decoded = STANDARD
        .decode(blob.trim())
        .map_err(|e| FormatError::Base64Invalid(e.to_string()))?;
    let block: [u8; BLOCK_SIZE] = decoded.as_slice().try_into().map_err(|_| {
        FormatError::Base64Invalid(format!(
            "decoded to {} bytes (expected {})",
            decoded.len(),
            BLOCK_SIZE
        ))
    })?;

    Ok(Packet::EncryptedText { id1, id2, block })
}

/// Parse a decimal device identifier
///
/// Firmware zero-pads ids (`%02lu,%03lu`), so leading zeros are accepted.
fn parse_id(field: &str) -> Result<u32, FormatError> {
    let field = field.trim();
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FormatError::UnrecognizedLength(format!(
            "text id {:?} is not a decimal number",
            field
        )));
    }

    field.parse::<u32>().map_err(|_| {
        FormatError::UnrecognizedLength(format!("text id {:?} does not fit 32 bits", field))
    })
}
