//! `shroud-crypto-core`: pure cryptographic primitives for SHROUD.
//!
//! No async and no global state. Everything here is a pure
//! function of its inputs except the CSPRNG draws in [`blob::seal`].

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod error;
pub mod memory;

pub mod hash;
pub mod kdf;
pub mod symmetric;

pub mod blob;

pub use blob::{open, open_bytes, seal, seal_with, EncryptedBlob, HEADER_LEN, MIN_BLOB_LEN};
pub use error::CryptoError;
pub use hash::{hash160, hmac_sha256, hmac_sha512, sha256, sha512};
pub use kdf::{derive_key, PBKDF2_ITERATIONS, SALT_LEN};
pub use memory::{SecretBuffer, SecretBytes};
pub use symmetric::{aes_cbc_decrypt, aes_cbc_encrypt, IV_LEN, KEY_LEN};
