//! Digest and MAC primitives.
//!
//! - [`sha256`] / [`sha512`]: plain digests
//! - [`hmac_sha256`] / [`hmac_sha512`]: keyed MACs
//! - [`hash160`]: `RIPEMD-160(SHA-256(data))`, the address fingerprint
//!
//! All functions are total: any input length, including zero, is valid
//! for both key and data.

use ring::{digest, hmac};
use ripemd::{Digest, Ripemd160};

/// SHA-256 output length in bytes.
pub const SHA256_LEN: usize = 32;

/// SHA-512 output length in bytes.
pub const SHA512_LEN: usize = 64;

/// `hash160` output length in bytes.
pub const HASH160_LEN: usize = 20;

/// SHA-256 digest of `data`.
#[must_use]
pub fn sha256(data: &[u8]) -> [u8; SHA256_LEN] {
    let mut out = [0u8; SHA256_LEN];
    out.copy_from_slice(digest::digest(&digest::SHA256, data).as_ref());
    out
}

/// SHA-512 digest of `data`.
#[must_use]
pub fn sha512(data: &[u8]) -> [u8; SHA512_LEN] {
    let mut out = [0u8; SHA512_LEN];
    out.copy_from_slice(digest::digest(&digest::SHA512, data).as_ref());
    out
}

/// HMAC-SHA256 of `data` under `key`.
#[must_use]
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; SHA256_LEN] {
    let key = hmac::Key::new(hmac::HMAC_SHA256, key);
    let mut out = [0u8; SHA256_LEN];
    out.copy_from_slice(hmac::sign(&key, data).as_ref());
    out
}

/// HMAC-SHA512 of `data` under `key`.
#[must_use]
pub fn hmac_sha512(key: &[u8], data: &[u8]) -> [u8; SHA512_LEN] {
    let key = hmac::Key::new(hmac::HMAC_SHA512, key);
    let mut out = [0u8; SHA512_LEN];
    out.copy_from_slice(hmac::sign(&key, data).as_ref());
    out
}

/// `RIPEMD-160(SHA-256(data))`.
#[must_use]
pub fn hash160(data: &[u8]) -> [u8; HASH160_LEN] {
    let mut out = [0u8; HASH160_LEN];
    out.copy_from_slice(&Ripemd160::digest(sha256(data)));
    out
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
