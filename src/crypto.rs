//! # Cryptographic Operations
//!
//! AES-256-GCM encryption of whole credentials files.
//!
//! ## Algorithm
//!
//! - **Cipher**: AES-256-GCM (Galois/Counter Mode)
//! - **Key size**: 256 bits (32 bytes), stored as 64 hex characters
//! - **Nonce size**: 96 bits (12 bytes), random per encryption
//! - **Authentication**: 16-byte GCM tag
//!
//! ## Encrypted Data Format
//!
//! ```text
//! base64(ciphertext)--base64(nonce)--base64(tag)
//! ```
//!
//! The standard base64 alphabet never contains `-`, so the `--` separator is
//! unambiguous. The result is a single printable line, which keeps a raw
//! ciphertext readable when a diff has to fall back to it.

use crate::error::{CredsError, Result};
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;

pub const KEY_SIZE: usize = 32; // 256 bits
pub const NONCE_SIZE: usize = 12; // 96 bits for GCM
pub const TAG_SIZE: usize = 16;

const SEPARATOR: &str = "--";

#[derive(Clone)]
pub struct CryptoKey {
    key: [u8; KEY_SIZE],
}

impl CryptoKey {
    /// Generate a new random key
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut key);
        Self { key }
    }

    /// Create a key from existing bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(CredsError::InvalidKeyFormat {
                expected: KEY_SIZE * 2,
            });
        }
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(bytes);
        Ok(Self { key })
    }

    /// Parse a hex-encoded key, ignoring surrounding whitespace
    pub fn from_hex(text: &str) -> Result<Self> {
        let bytes = hex::decode(text.trim()).map_err(|_| CredsError::InvalidKeyFormat {
            expected: KEY_SIZE * 2,
        })?;
        Self::from_bytes(&bytes)
    }

    /// Hex form, as written to key files
    pub fn to_hex(&self) -> String {
        hex::encode(self.key)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }

    fn cipher(&self) -> Result<Aes256Gcm> {
        Aes256Gcm::new_from_slice(&self.key).map_err(|_| CredsError::InvalidKeyFormat {
            expected: KEY_SIZE * 2,
        })
    }

    /// Encrypt data into the armored single-line format
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let cipher = self.cipher()?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let sealed = cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| CredsError::Other(format!("Encryption failed: {e}")))?;

        // aes-gcm appends the tag to the ciphertext
        let (data, tag) = sealed.split_at(sealed.len() - TAG_SIZE);

        let armored = [
            STANDARD.encode(data),
            STANDARD.encode(nonce_bytes),
            STANDARD.encode(tag),
        ]
        .join(SEPARATOR);

        Ok(armored.into_bytes())
    }

    /// Decrypt data produced by [`CryptoKey::encrypt`]
    pub fn decrypt(&self, content: &[u8]) -> Result<Vec<u8>> {
        let text = std::str::from_utf8(content)
            .map_err(|_| CredsError::Decrypt("Invalid encrypted data format".into()))?
            .trim();

        let parts: Vec<&str> = text.split(SEPARATOR).collect();
        let [data, nonce, tag] = parts.as_slice() else {
            return Err(CredsError::Decrypt("Invalid encrypted data format".into()));
        };

        let decode = |part: &str| {
            STANDARD
                .decode(part)
                .map_err(|e| CredsError::Decrypt(format!("Invalid base64: {e}")))
        };
        let mut sealed = decode(*data)?;
        let nonce_bytes = decode(*nonce)?;
        let tag = decode(*tag)?;

        if nonce_bytes.len() != NONCE_SIZE || tag.len() != TAG_SIZE {
            return Err(CredsError::Decrypt("Invalid nonce or tag length".into()));
        }
        sealed.extend_from_slice(&tag);

        self.cipher()?
            .decrypt(Nonce::from_slice(&nonce_bytes), sealed.as_slice())
            .map_err(|_| CredsError::Decrypt("Wrong key or corrupted data".into()))
    }
}
