//! # Loko P2P Library
//!
//! Packet codec for Loko LoRa peer-to-peer GPS trackers.
//!
//! This library decodes the telemetry frames trackers broadcast (short and
//! extended plaintext, AES-ECB encrypted binary, and base64 text mode) into
//! [`codec::protocol::DecodedTelemetry`] records, and encodes fixes back into
//! frames.

pub mod config;
pub mod error;
pub mod codec;
pub mod receiver;
pub mod telemetry;

pub use codec::cipher::P2pKey;
pub use codec::decoder::{decode, decode_hex, decode_line};
pub use codec::protocol::{DecodedTelemetry, PacketVariant, RawTransmission, TelemetryFix};
