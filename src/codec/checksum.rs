//! # Payload Integrity Byte
//!
//! Additive checksum carried in the last byte of every encrypted payload.
//!
//! **Algorithm**: sum of the 15 preceding bytes, modulo 256
//!
//! After decryption a mismatch almost always means the wrong key was used;
//! a random block passes with probability 1/256.

use super::protocol::{BLOCK_SIZE, INTEGRITY_OFFSET};
use crate::error::IntegrityError;

/// Sum bytes modulo 256
///
/// # Examples
///
/// ```
/// use loko_p2p::codec::checksum::sum_mod_256;
///
/// assert_eq!(sum_mod_256(&[0xFF, 0x02]), 0x01);
/// ```
pub fn sum_mod_256(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, &byte| acc.wrapping_add(byte))
}

/// Integrity value of a payload block (every byte but the last)
pub fn integrity_value(block: &[u8; BLOCK_SIZE]) -> u8 {
    sum_mod_256(&block[..INTEGRITY_OFFSET])
}

/// Write the integrity value into the last byte of a block
pub fn seal(block: &mut [u8; BLOCK_SIZE]) {
    block[INTEGRITY_OFFSET] = integrity_value(block);
}

/// Check a decrypted block's integrity byte
///
/// # Errors
///
/// Returns [`IntegrityError::ChecksumMismatch`] if the carried byte differs
/// from the computed sum.
pub fn verify(block: &[u8; BLOCK_SIZE]) -> Result<(), IntegrityError> {
    let expected = integrity_value(block);
    let actual = block[INTEGRITY_OFFSET];

    if expected != actual {
        return Err(IntegrityError::ChecksumMismatch { expected, actual });
    }

    Ok(())
}

/// Sum modulo 256 with a plain integer accumulator (for verification)
#[cfg(test)]
fn sum_mod_256_slow(data: &[u8]) -> u8 {
    (data.iter().map(|&b| b as u32).sum::<u32>() % 256) as u8
}
