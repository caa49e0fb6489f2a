//! # Loko P2P Protocol Constants and Types
//!
//! Frame sizes, field offsets and the value types shared by the decoder and
//! encoder.

use serde::Serialize;

/// Short plaintext frame: ids + combined byte + lat + lon
pub const SHORT_FRAME_SIZE: usize = 15;

/// Extended plaintext frame: short frame + speed + altitude
pub const EXTENDED_FRAME_SIZE: usize = 18;

/// Encrypted binary frame: ids + combined byte + one AES block
pub const ENCRYPTED_FRAME_SIZE: usize = 25;

/// AES block size, also the size of every encrypted payload
pub const BLOCK_SIZE: usize = 16;

/// Offset of the combined version/voltage byte in every binary frame
pub const COMBINED_BYTE_OFFSET: usize = 8;

/// Offset of the ciphertext in the encrypted binary frame
pub const CIPHERTEXT_OFFSET: usize = 9;

/// Offset of the integrity byte inside a decrypted block
pub const INTEGRITY_OFFSET: usize = BLOCK_SIZE - 1;

/// Version nibble written by the firmware into short frames
pub const PACKET_VERSION_SHORT: u8 = 1;

/// Version nibble written into extended frames
pub const PACKET_VERSION_EXTENDED: u8 = PACKET_VERSION_SHORT + 1;

/// Version nibble written into the outer byte of encrypted frames
pub const PACKET_VERSION_ENCRYPTED: u8 = PACKET_VERSION_SHORT + 2;

/// Text-mode frames carry no version nibble
pub const PACKET_VERSION_TEXT: u8 = 0;

/// Separator between the fields of a text-mode line
pub const TEXT_FIELD_SEPARATOR: char = ',';

/// The four wire formats a tracker can transmit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PacketVariant {
    PlaintextShort,
    PlaintextExtended,
    EncryptedBinary,
    EncryptedText,
}

impl PacketVariant {
    /// Whether the variant carries an integrity byte
    pub fn is_encrypted(self) -> bool {
        matches!(self, Self::EncryptedBinary | Self::EncryptedText)
    }
}

/// A transmission as it came off the air
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawTransmission<'a> {
    /// Binary frame (15, 18 or 25 bytes)
    Binary(&'a [u8]),
    /// Text-mode line `"<id1>,<id2>,<base64>"`
    Text(&'a str),
}

/// A classified transmission.
///
/// Produced once by the classifier; each variant carries exactly the bytes
/// its decoder needs so that no decoder has to check lengths again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Packet<'a> {
    PlaintextShort(&'a [u8; SHORT_FRAME_SIZE]),
    PlaintextExtended(&'a [u8; EXTENDED_FRAME_SIZE]),
    EncryptedBinary(&'a [u8; ENCRYPTED_FRAME_SIZE]),
    EncryptedText {
        id1: u32,
        id2: u32,
        block: [u8; BLOCK_SIZE],
    },
}

impl Packet<'_> {
    /// Variant tag of this packet
    pub fn variant(&self) -> PacketVariant {
        match self {
            Packet::PlaintextShort(_) => PacketVariant::PlaintextShort,
            Packet::PlaintextExtended(_) => PacketVariant::PlaintextExtended,
            Packet::EncryptedBinary(_) => PacketVariant::EncryptedBinary,
            Packet::EncryptedText { .. } => PacketVariant::EncryptedText,
        }
    }
}

/// Decoded telemetry record
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DecodedTelemetry {
    /// Wire format the record was decoded from
    pub variant: PacketVariant,

    /// First device identifier
    pub id1: u32,

    /// Second device identifier
    pub id2: u32,

    /// Schema revision nibble (0-15)
    pub packet_version: u8,

    /// Battery voltage in volts
    pub battery_volts: f32,

    /// Latitude in degrees
    pub latitude: f64,

    /// Longitude in degrees
    pub longitude: f64,

    /// Altitude in meters (extended and encrypted binary frames only)
    pub altitude_m: Option<i16>,

    /// Ground speed in m/s (extended and encrypted binary frames only)
    pub speed_mps: Option<u8>,

    /// Checksum verified against the decrypted payload
    pub integrity_ok: bool,
}

/// A GNSS fix to be transmitted, as the firmware samples it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryFix {
    pub id1: u32,
    pub id2: u32,

    /// Latitude in degrees
    pub latitude: f64,

    /// Longitude in degrees
    pub longitude: f64,

    /// Battery voltage in volts
    pub battery_volts: f32,

    /// Ground speed in m/s
    pub speed_mps: u8,

    /// Altitude in meters
    pub altitude_m: i16,
}

/// Split a combined byte into (version, voltage nibble)
///
/// The version lives in the high nibble, the quantized voltage in the low one.
pub fn split_combined_byte(combined: u8) -> (u8, u8) {
    ((combined >> 4) & 0x0F, combined & 0x0F)
}

/// Pack a version and voltage nibble into one combined byte
pub fn combine_byte(version: u8, voltage_nibble: u8) -> u8 {
    ((version & 0x0F) << 4) | (voltage_nibble & 0x0F)
}
