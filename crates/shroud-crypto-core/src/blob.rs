//! Password-sealed blobs.
//!
//! This module provides:
//! - [`seal`]: encrypt bytes under a password with a fresh salt and IV
//! - [`open`]: re-derive the key from the embedded salt and decrypt
//! - [`EncryptedBlob`]: `salt || iv || ciphertext` container
//!
//! The password handed to these functions is already plaintext. Decoding
//! encoded passwords and the raw-password policy live in `shroud-secret`.

use crate::error::CryptoError;
use crate::kdf::{derive_key, SALT_LEN};
use crate::memory::SecretBuffer;
use crate::symmetric::{aes_cbc_decrypt, aes_cbc_encrypt, BLOCK_LEN, IV_LEN};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Offset of the ciphertext inside a serialized blob.
pub const HEADER_LEN: usize = SALT_LEN + IV_LEN;

/// Smallest valid serialized blob: header plus one padding block.
pub const MIN_BLOB_LEN: usize = HEADER_LEN + BLOCK_LEN;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Password-encrypted payload.
///
/// Wire format: `salt (32 bytes) || iv (16 bytes) || ciphertext (16·k bytes, k ≥ 1)`.
///
/// Salt and IV are random per [`seal`] call. There is no authentication
/// tag; see [`crate::symmetric`].
#[must_use = "encrypted data must be stored or transmitted"]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedBlob {
    /// PBKDF2 salt.
    pub salt: [u8; SALT_LEN],
    /// CBC initialisation vector.
    pub iv: [u8; IV_LEN],
    /// PKCS#7-padded AES-256-CBC output.
    pub ciphertext: Vec<u8>,
}

impl EncryptedBlob {
    /// Serialize to wire format: `salt || iv || ciphertext`.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN.saturating_add(self.ciphertext.len()));
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.iv);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Deserialize from wire format.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidBlob` if the input is shorter than 64
    /// bytes or the ciphertext is not a multiple of the AES block size.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() < MIN_BLOB_LEN {
            return Err(CryptoError::InvalidBlob(format!(
                "blob too short: {} bytes (minimum {MIN_BLOB_LEN})",
                bytes.len()
            )));
        }

        let (salt_bytes, rest) = bytes.split_at(SALT_LEN);
        let (iv_bytes, ciphertext) = rest.split_at(IV_LEN);

        if ciphertext.len() % BLOCK_LEN != 0 {
            return Err(CryptoError::InvalidBlob(format!(
                "ciphertext length {} is not a multiple of {BLOCK_LEN}",
                ciphertext.len()
            )));
        }

        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(salt_bytes);
        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(iv_bytes);

        Ok(Self {
            salt,
            iv,
            ciphertext: ciphertext.to_vec(),
        })
    }
}

// ---------------------------------------------------------------------------
// Core operations
// ---------------------------------------------------------------------------

/// Encrypt `data` under `password` with a random salt and IV from `OsRng`.
///
/// Two calls with identical inputs never produce the same blob.
///
/// # Errors
///
/// Returns `CryptoError::Encryption` if the CSPRNG fails.
pub fn seal(password: &str, data: &[u8]) -> Result<EncryptedBlob, CryptoError> {
    let mut salt = [0u8; SALT_LEN];
    let mut iv = [0u8; IV_LEN];
    OsRng
        .try_fill_bytes(&mut salt)
        .and_then(|()| OsRng.try_fill_bytes(&mut iv))
        .map_err(|e| CryptoError::Encryption(format!("CSPRNG fill failed: {e}")))?;
    seal_with(password, data, salt, iv)
}

/// Encrypt with caller-supplied salt and IV.
///
/// Only for known-answer tests and cross-implementation vectors. Reusing a
/// salt/IV pair across messages leaks plaintext equality.
///
/// # Errors
///
/// Propagates key-derivation and cipher errors.
pub fn seal_with(
    password: &str,
    data: &[u8],
    salt: [u8; SALT_LEN],
    iv: [u8; IV_LEN],
) -> Result<EncryptedBlob, CryptoError> {
    let key = derive_key(password, &salt)?;
    let ciphertext = aes_cbc_encrypt(&iv, key.expose(), data)?;
    Ok(EncryptedBlob {
        salt,
        iv,
        ciphertext,
    })
}

/// Decrypt `blob` under `password`.
///
/// # Errors
///
/// Returns `CryptoError::Decryption` on padding failure (usually a wrong
/// password). A wrong password can also, rarely, yield garbage instead.
pub fn open(password: &str, blob: &EncryptedBlob) -> Result<SecretBuffer, CryptoError> {
    let key = derive_key(password, &blob.salt)?;
    aes_cbc_decrypt(&blob.iv, key.expose(), &blob.ciphertext)
}

/// Parse and decrypt a serialized blob in one step.
///
/// # Errors
///
/// Returns `CryptoError::InvalidBlob` for layout violations, otherwise as
/// [`open`].
pub fn open_bytes(password: &str, bytes: &[u8]) -> Result<SecretBuffer, CryptoError> {
    let blob = EncryptedBlob::from_bytes(bytes)?;
    open(password, &blob)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
