//! # Loko P2P Codec Module
//!
//! Implementation of the peer-to-peer telemetry frames sent by Loko trackers.
//!
//! This module handles:
//! - Classifying transmissions by length (binary) or shape (text)
//! - 24-bit fixed-point coordinates and 4-bit quantized battery voltage
//! - AES-ECB decryption with a sum-mod-256 integrity check
//! - Encoding frames the way the firmware transmits them

pub mod protocol;
pub mod classifier;
pub mod geo;
pub mod voltage;
pub mod checksum;
pub mod cipher;
pub mod decoder;
pub mod encoder;
