//! # AES-ECB Payload Cipher
//!
//! Encrypted frames carry exactly one 16-byte block, so ECB reduces to a
//! single block operation. The key length picks AES-128, AES-192 or AES-256;
//! trackers ship with a 32-byte key.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes128, Aes192, Aes256};

use super::protocol::BLOCK_SIZE;
use crate::error::CryptoError;

/// Symmetric P2P key shared between a tracker and its receivers
///
/// The key schedule is expanded once; the raw key bytes are not retained.
#[derive(Clone)]
pub struct P2pKey {
    cipher: BlockCipher,
}

#[derive(Clone)]
enum BlockCipher {
    Aes128(Aes128),
    Aes192(Aes192),
    Aes256(Aes256),
}

impl std::fmt::Debug for P2pKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("P2pKey")
            .field("bits", &self.bits())
            .finish_non_exhaustive()
    }
}

impl P2pKey {
    /// Build a key from raw bytes
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::DecryptFailed`] unless the key is 16, 24 or 32
    /// bytes long.
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        let cipher = match key.len() {
            16 => Aes128::new_from_slice(key).map(BlockCipher::Aes128),
            24 => Aes192::new_from_slice(key).map(BlockCipher::Aes192),
            32 => Aes256::new_from_slice(key).map(BlockCipher::Aes256),
            len => {
                return Err(CryptoError::DecryptFailed(format!(
                    "key must be 16, 24 or 32 bytes, got {}",
                    len
                )))
            }
        }
        .map_err(|e| CryptoError::DecryptFailed(e.to_string()))?;

        Ok(Self { cipher })
    }

    /// Build a key from its hex form, as entered with `set p2p-key`
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::DecryptFailed`] if the string is not hex or the
    /// decoded key has an unsupported length.
    ///
    /// # Examples
    ///
    /// ```
    /// use loko_p2p::codec::cipher::P2pKey;
    ///
    /// let key = P2pKey::from_hex(&"00".repeat(32)).unwrap();
    /// assert_eq!(key.bits(), 256);
    /// ```
    pub fn from_hex(key_hex: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(key_hex.trim())
            .map_err(|e| CryptoError::DecryptFailed(format!("key is not hex: {}", e)))?;
        Self::new(&bytes)
    }

    /// Key size in bits
    pub fn bits(&self) -> usize {
        match self.cipher {
            BlockCipher::Aes128(_) => 128,
            BlockCipher::Aes192(_) => 192,
            BlockCipher::Aes256(_) => 256,
        }
    }

    /// Decrypt one block
    pub fn decrypt_block(&self, ciphertext: &[u8; BLOCK_SIZE]) -> [u8; BLOCK_SIZE] {
        let mut block = GenericArray::clone_from_slice(ciphertext);
        match &self.cipher {
            BlockCipher::Aes128(c) => c.decrypt_block(&mut block),
            BlockCipher::Aes192(c) => c.decrypt_block(&mut block),
            BlockCipher::Aes256(c) => c.decrypt_block(&mut block),
        }
        block_to_array(&block)
    }

    /// Encrypt one block
    pub fn encrypt_block(&self, plaintext: &[u8; BLOCK_SIZE]) -> [u8; BLOCK_SIZE] {
        let mut block = GenericArray::clone_from_slice(plaintext);
        match &self.cipher {
            BlockCipher::Aes128(c) => c.encrypt_block(&mut block),
            BlockCipher::Aes192(c) => c.encrypt_block(&mut block),
            BlockCipher::Aes256(c) => c.encrypt_block(&mut block),
        }
        block_to_array(&block)
    }
}

fn block_to_array(block: &[u8]) -> [u8; BLOCK_SIZE] {
    let mut out = [0u8; BLOCK_SIZE];
    out.copy_from_slice(block);
    out
}
