//! AES-256-CBC with PKCS#7 padding.
//!
//! This layer has no MAC. A wrong key usually trips the padding check and
//! yields [`CryptoError::Decryption`], but tampered ciphertext can also
//! decrypt to garbage with valid-looking padding. Callers that need
//! integrity must add it above this module; the blob wire format does not
//! leave room for a tag.

use crate::error::CryptoError;
use crate::memory::SecretBuffer;
use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// AES block / IV length in bytes.
pub const IV_LEN: usize = 16;

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;

/// AES block length in bytes.
pub const BLOCK_LEN: usize = 16;

fn check_lengths(iv: &[u8], key: &[u8]) -> Result<(), CryptoError> {
    if iv.len() != IV_LEN {
        return Err(CryptoError::InvalidKeyMaterial(format!(
            "invalid iv length: {} bytes (expected {IV_LEN})",
            iv.len()
        )));
    }
    if key.len() != KEY_LEN {
        return Err(CryptoError::InvalidKeyMaterial(format!(
            "invalid key length: {} bytes (expected {KEY_LEN})",
            key.len()
        )));
    }
    Ok(())
}

/// Encrypt `plaintext` under `key` and `iv`.
///
/// The output length is always a positive multiple of 16; empty plaintext
/// produces one full padding block.
///
/// # Errors
///
/// Returns `CryptoError::InvalidKeyMaterial` if `iv` is not 16 bytes or
/// `key` is not 32 bytes.
pub fn aes_cbc_encrypt(iv: &[u8], key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    check_lengths(iv, key)?;
    let cipher = Aes256CbcEnc::new_from_slices(key, iv)
        .map_err(|_| CryptoError::Encryption("failed to create AES-256-CBC encryptor".into()))?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

/// Decrypt `ciphertext` under `key` and `iv`, stripping PKCS#7 padding.
///
/// # Errors
///
/// Returns `CryptoError::InvalidKeyMaterial` on bad `iv`/`key` lengths and
/// `CryptoError::Decryption` if the ciphertext is not block-aligned or the
/// padding is invalid.
pub fn aes_cbc_decrypt(
    iv: &[u8],
    key: &[u8],
    ciphertext: &[u8],
) -> Result<SecretBuffer, CryptoError> {
    check_lengths(iv, key)?;
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
        return Err(CryptoError::Decryption);
    }
    let cipher = Aes256CbcDec::new_from_slices(key, iv)
        .map_err(|_| CryptoError::Encryption("failed to create AES-256-CBC decryptor".into()))?;
    let plaintext = cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CryptoError::Decryption)?;
    Ok(SecretBuffer::from_vec(plaintext))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
