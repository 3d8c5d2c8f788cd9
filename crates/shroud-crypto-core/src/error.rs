//! Cryptographic error types for `shroud-crypto-core`.

use thiserror::Error;

/// Errors produced by cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// PBKDF2 key derivation failed.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Symmetric encryption failure (AES-256-CBC setup or CSPRNG).
    #[error("encryption error: {0}")]
    Encryption(String),

    /// Block-cipher decryption failed: bad padding or truncated ciphertext.
    ///
    /// CBC carries no authentication tag, so this cannot tell a wrong key
    /// apart from corrupted data.
    #[error("decryption failed: cipher or padding mismatch")]
    Decryption,

    /// Invalid key material (wrong salt, IV or key length).
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// Encrypted blob violates the `salt || iv || ciphertext` layout.
    #[error("invalid encrypted blob: {0}")]
    InvalidBlob(String),
}
