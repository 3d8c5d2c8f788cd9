//! PBKDF2-HMAC-SHA256 password stretching.
//!
//! The password is pre-hashed with SHA-256 before stretching. Every blob
//! ever written depends on this exact pipeline:
//!
//! ```text
//! key = PBKDF2-HMAC-SHA256(SHA256(utf8(password)), salt, 5000, 32)
//! ```

use std::num::NonZeroU32;

use crate::error::CryptoError;
use crate::hash::sha256;
use crate::memory::SecretBytes;
use ring::pbkdf2;
use zeroize::Zeroize;

/// Fixed PBKDF2 iteration count.
pub const PBKDF2_ITERATIONS: u32 = 5000;

/// Salt length in bytes. Exactly this length is accepted.
pub const SALT_LEN: usize = 32;

/// Derived key length in bytes (AES-256).
pub const DERIVED_KEY_LEN: usize = 32;

/// Derive the AES key for `password` and `salt`.
///
/// Empty passwords are accepted here; rejecting them is the caller's
/// policy.
///
/// # Errors
///
/// Returns `CryptoError::InvalidKeyMaterial` if `salt` is not exactly
/// 32 bytes.
pub fn derive_key(
    password: &str,
    salt: &[u8],
) -> Result<SecretBytes<DERIVED_KEY_LEN>, CryptoError> {
    if salt.len() != SALT_LEN {
        return Err(CryptoError::InvalidKeyMaterial(format!(
            "invalid salt length: {} bytes (expected {SALT_LEN})",
            salt.len()
        )));
    }

    let iterations = NonZeroU32::new(PBKDF2_ITERATIONS)
        .ok_or_else(|| CryptoError::KeyDerivation("iteration count must be non-zero".into()))?;

    let mut prehashed = sha256(password.as_bytes());
    let mut output = [0u8; DERIVED_KEY_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        salt,
        &prehashed,
        &mut output,
    );
    prehashed.zeroize();

    let key = SecretBytes::new(output);
    output.zeroize();
    Ok(key)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
