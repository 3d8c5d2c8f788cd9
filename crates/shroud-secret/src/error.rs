//! Error types for `shroud-secret`.

use shroud_crypto_core::CryptoError;
use thiserror::Error;

/// Errors surfaced by the password and sensitive-text codecs.
///
/// Nothing here is retried internally. `IncorrectCredential` is the only
/// variant a caller is expected to recover from (by prompting again).
#[derive(Debug, Error)]
pub enum SecretError {
    /// Wrong password or key, an empty password, or ciphertext that fails
    /// to decrypt. CBC has no tag, so wrong-key and corrupted-data cases
    /// are deliberately indistinguishable.
    #[error("incorrect password")]
    IncorrectCredential,

    /// A plaintext password reached a call site that requires it encoded.
    #[error("plaintext policy violation: {0}")]
    PlaintextPolicyViolation(String),

    /// The current execution role may not perform this call.
    #[error("privilege violation: {0}")]
    PrivilegeViolation(String),

    /// Input does not have the required shape (not encoded, bad hex, bad
    /// lengths).
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The encoding key is empty; the sandbox has not been provisioned.
    #[error("encoding key is not set, provision it from the sandbox with set_encoding_key()")]
    KeyNotProvisioned,

    /// The embedded execution context failed the delegated call.
    #[error("remote call failed: {0}")]
    Remote(String),

    /// Primitive failure that is not a credential problem (CSPRNG, KDF setup).
    #[error(transparent)]
    Crypto(CryptoError),
}

impl From<CryptoError> for SecretError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::Decryption | CryptoError::InvalidBlob(_) => Self::IncorrectCredential,
            CryptoError::InvalidKeyMaterial(msg) => Self::MalformedInput(msg),
            other => Self::Crypto(other),
        }
    }
}
