//! Sensitive-text schemes.
//!
//! An encoded token is `marker || payload`, where the marker is one of:
//!
//! ```text
//! aes: SENSITIVE_ENCODE::AE7EADC1-CDA0-45FA-A340-E93BEDDEA21E::<hex(EncryptedBlob)>
//! xor: SENSITIVE_ENCODE::AAAAAAAA-2E51-4DC6-A913-79EB1C62D09E::<hex(nonce || body || check)>
//! ```
//!
//! The markers are persisted inside stored secrets and must never change.
//! Only one scheme encodes at a time (see [`crate::SecretConfig::scheme`]);
//! both always decode.

use data_encoding::{HEXLOWER, HEXLOWER_PERMISSIVE};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use shroud_crypto_core::hash::{hmac_sha256, sha256};
use shroud_crypto_core::CryptoError;
use zeroize::Zeroize;

use crate::error::SecretError;

/// Marker for AES-encoded sensitive text.
pub const AES_MARKER: &str = "SENSITIVE_ENCODE::AE7EADC1-CDA0-45FA-A340-E93BEDDEA21E::";

/// Marker for XOR-encoded sensitive text.
pub const XOR_MARKER: &str = "SENSITIVE_ENCODE::AAAAAAAA-2E51-4DC6-A913-79EB1C62D09E::";

/// XOR nonce length in bytes.
pub const XOR_NONCE_LEN: usize = 4;

/// XOR check-tag length in bytes.
pub const XOR_CHECK_LEN: usize = 4;

// ---------------------------------------------------------------------------
// Scheme selector
// ---------------------------------------------------------------------------

/// Encoding scheme identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// PBKDF2 + AES-256-CBC blob under the encoding key.
    #[default]
    Aes,
    /// SHA-256 keystream XOR. Faster, weaker.
    Xor,
}

impl Scheme {
    /// Marker prefix written before the payload.
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Aes => AES_MARKER,
            Self::Xor => XOR_MARKER,
        }
    }

    /// Scheme whose marker prefixes `text`, if any.
    #[must_use]
    pub fn detect(text: &str) -> Option<Self> {
        [Self::Aes, Self::Xor]
            .into_iter()
            .find(|scheme| text.starts_with(scheme.marker()))
    }

    /// Stable string form for log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Aes => "aes",
            Self::Xor => "xor",
        }
    }
}

/// Returns `true` if `text` starts with a known marker.
///
/// Recognition only: a marker followed by garbage is still "encoded".
#[must_use]
pub fn is_encoded(text: &str) -> bool {
    Scheme::detect(text).is_some()
}

/// Require `text` to be encoded sensitive text.
///
/// # Errors
///
/// Returns `SecretError::MalformedInput` unless [`is_encoded`] holds.
pub fn ensure_encoded(text: &str) -> Result<(), SecretError> {
    if is_encoded(text) {
        Ok(())
    } else {
        Err(SecretError::MalformedInput("not encoded sensitive text".into()))
    }
}

/// [`ensure_encoded`] for values that may be absent. Absence is a caller
/// bug, not a plaintext value.
///
/// # Errors
///
/// Returns `SecretError::MalformedInput` for `None` or non-encoded text.
pub fn ensure_encoded_opt(text: Option<&str>) -> Result<(), SecretError> {
    text.map_or_else(
        || {
            Err(SecretError::MalformedInput(
                "sensitive text is missing".into(),
            ))
        },
        ensure_encoded,
    )
}

// ---------------------------------------------------------------------------
// Payload helpers
// ---------------------------------------------------------------------------

fn strip_marker(token: &str, scheme: Scheme) -> Result<Vec<u8>, SecretError> {
    let payload = token.strip_prefix(scheme.marker()).ok_or_else(|| {
        SecretError::MalformedInput(format!("not {} encoded text", scheme.as_str()))
    })?;
    HEXLOWER_PERMISSIVE
        .decode(payload.as_bytes())
        .map_err(|e| SecretError::MalformedInput(format!("invalid hex payload: {e}")))
}

fn into_utf8(bytes: Vec<u8>) -> Result<String, SecretError> {
    // Non-UTF-8 plaintext almost always means the key was wrong.
    String::from_utf8(bytes).map_err(|e| {
        let mut bytes = e.into_bytes();
        bytes.zeroize();
        SecretError::IncorrectCredential
    })
}

// ---------------------------------------------------------------------------
// AES
// ---------------------------------------------------------------------------

/// AES scheme framing: the encoding key is used as a password for
/// [`shroud_crypto_core::blob::seal`]. The blob itself is produced by
/// [`crate::SecretEngine`] so that the work can be delegated.
#[derive(Clone, Copy, Debug, Default)]
pub struct AesScheme;

impl AesScheme {
    /// Build a token from a serialized blob.
    #[must_use]
    pub fn wrap(blob_bytes: &[u8]) -> String {
        format!("{AES_MARKER}{}", HEXLOWER.encode(blob_bytes))
    }

    /// Serialized blob carried by a token.
    ///
    /// # Errors
    ///
    /// `MalformedInput` for a missing marker or non-hex payload.
    pub fn unwrap_payload(token: &str) -> Result<Vec<u8>, SecretError> {
        strip_marker(token, Scheme::Aes)
    }

    /// Decode the UTF-8 plaintext of a decrypted payload.
    ///
    /// # Errors
    ///
    /// `IncorrectCredential` if the bytes are not UTF-8.
    pub fn text_from_plaintext(plaintext: Vec<u8>) -> Result<String, SecretError> {
        into_utf8(plaintext)
    }
}

// ---------------------------------------------------------------------------
// XOR
// ---------------------------------------------------------------------------

/// XOR scheme.
///
/// Payload: `nonce(4) || (utf8(text) XOR keystream) || check(4)` where
/// block `i` of the keystream is `SHA256(utf8(key) || nonce || be32(i))`
/// and `check` is the first four bytes of
/// `HMAC-SHA256(utf8(key), nonce || utf8(text))`.
#[derive(Clone, Copy, Debug, Default)]
pub struct XorScheme;

impl XorScheme {
    /// Seal with a caller-chosen nonce. For vectors only.
    #[must_use]
    pub fn seal_with_nonce(text: &str, key: &str, nonce: [u8; XOR_NONCE_LEN]) -> String {
        let mut body = text.as_bytes().to_vec();
        apply_keystream(&mut body, key, &nonce);
        let check = check_tag(key, &nonce, text.as_bytes());

        let mut payload = Vec::with_capacity(
            XOR_NONCE_LEN
                .saturating_add(body.len())
                .saturating_add(XOR_CHECK_LEN),
        );
        payload.extend_from_slice(&nonce);
        payload.extend_from_slice(&body);
        payload.extend_from_slice(&check);
        format!("{XOR_MARKER}{}", HEXLOWER.encode(&payload))
    }

    /// Encode `text` under `key` with a fresh nonce, returning a full token.
    ///
    /// # Errors
    ///
    /// `Crypto` if the system RNG fails.
    pub fn seal(text: &str, key: &str) -> Result<String, SecretError> {
        let mut nonce = [0u8; XOR_NONCE_LEN];
        OsRng
            .try_fill_bytes(&mut nonce)
            .map_err(|e| CryptoError::Encryption(format!("CSPRNG fill failed: {e}")))?;
        Ok(Self::seal_with_nonce(text, key, nonce))
    }

    /// Decode a full token under `key`.
    ///
    /// # Errors
    ///
    /// `MalformedInput` for a missing marker, non-hex or short payload;
    /// `IncorrectCredential` if the check tag does not match.
    pub fn open(token: &str, key: &str) -> Result<String, SecretError> {
        let payload = strip_marker(token, Scheme::Xor)?;
        let min_len = XOR_NONCE_LEN.saturating_add(XOR_CHECK_LEN);
        if payload.len() < min_len {
            return Err(SecretError::MalformedInput(format!(
                "xor payload too short: {} bytes (minimum {min_len})",
                payload.len()
            )));
        }

        let (nonce, rest) = payload.split_at(XOR_NONCE_LEN);
        let body_len = rest.len().saturating_sub(XOR_CHECK_LEN);
        let (body, check) = rest.split_at(body_len);

        let mut plaintext = body.to_vec();
        apply_keystream(&mut plaintext, key, nonce);

        if !constant_time_eq(&check_tag(key, nonce, &plaintext), check) {
            plaintext.zeroize();
            return Err(SecretError::IncorrectCredential);
        }
        into_utf8(plaintext)
    }
}

fn apply_keystream(data: &mut [u8], key: &str, nonce: &[u8]) {
    let mut block_input =
        Vec::with_capacity(key.len().saturating_add(XOR_NONCE_LEN).saturating_add(4));
    for (chunk, counter) in data.chunks_mut(32).zip(0u32..) {
        block_input.clear();
        block_input.extend_from_slice(key.as_bytes());
        block_input.extend_from_slice(nonce);
        block_input.extend_from_slice(&counter.to_be_bytes());
        let mut block = sha256(&block_input);
        for (byte, k) in chunk.iter_mut().zip(block.iter()) {
            *byte ^= k;
        }
        block.zeroize();
    }
    block_input.zeroize();
}

fn check_tag(key: &str, nonce: &[u8], plaintext: &[u8]) -> [u8; XOR_CHECK_LEN] {
    let mut input = Vec::with_capacity(nonce.len().saturating_add(plaintext.len()));
    input.extend_from_slice(nonce);
    input.extend_from_slice(plaintext);
    let mac = hmac_sha256(key.as_bytes(), &input);
    input.zeroize();
    let mut tag = [0u8; XOR_CHECK_LEN];
    tag.copy_from_slice(&mac[..XOR_CHECK_LEN]);
    tag
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
