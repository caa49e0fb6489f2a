//! # Error Types
//!
//! Custom error types for the Loko P2P codec using `thiserror`.
//!
//! Decode and encode failures are split by cause: the shape of the input
//! ([`FormatError`]), the block cipher ([`CryptoError`]) and the decrypted
//! payload's checksum ([`IntegrityError`]). [`LokoError`] wraps all of them
//! together with the I/O and configuration failures of the binary.

use thiserror::Error;

/// The input does not have the shape of any known frame, or a value cannot
/// be represented on the wire.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormatError {
    /// Length (binary) or shape (text) matches no known variant
    #[error("unrecognized transmission: {0}")]
    UnrecognizedLength(String),

    /// Battery voltage outside the 4-bit quantized range
    #[error("battery voltage {0:.3} V outside 2.7-4.2 V")]
    VoltageOutOfRange(f32),

    /// Coordinate does not fit a signed 24-bit fixed-point value
    #[error("coordinate {0} does not fit 24-bit fixed point")]
    CoordinateOutOfRange(f64),

    /// Text-mode blob is not base64 or not a single cipher block
    #[error("invalid base64 payload: {0}")]
    Base64Invalid(String),

    /// Hex-encoded frame could not be parsed
    #[error("invalid hex frame: {0}")]
    InvalidHex(String),
}

/// Block cipher failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// The cipher rejected the key length or block size
    #[error("AES-ECB operation failed: {0}")]
    DecryptFailed(String),

    /// An encrypted frame arrived but no key was supplied
    #[error("encrypted frame requires a P2P key")]
    MissingKey,
}

/// The decrypted payload failed its additive checksum.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    /// Wrong key or corrupted transmission
    #[error("checksum mismatch: computed 0x{expected:02X}, frame carries 0x{actual:02X} (wrong key or corrupted frame)")]
    ChecksumMismatch { expected: u8, actual: u8 },
}

/// Main error type for Loko P2P
#[derive(Debug, Error)]
pub enum LokoError {
    /// Frame shape errors
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// Cipher errors
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Checksum errors
    #[error("Integrity error: {0}")]
    Integrity(#[from] IntegrityError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Record serialisation errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Loko P2P
pub type Result<T> = std::result::Result<T, LokoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_mismatch_message() {
        let err = IntegrityError::ChecksumMismatch {
            expected: 0x75,
            actual: 0x10,
        };
        let msg = err.to_string();
        assert!(msg.contains("0x75"));
        assert!(msg.contains("0x10"));
    }

    #[test]
    fn test_wrapping_conversions() {
        let err: LokoError = FormatError::UnrecognizedLength("12 bytes".to_string()).into();
        assert!(matches!(err, LokoError::Format(FormatError::UnrecognizedLength(_))));

        let err: LokoError = CryptoError::MissingKey.into();
        assert!(matches!(err, LokoError::Crypto(CryptoError::MissingKey)));
    }
}
