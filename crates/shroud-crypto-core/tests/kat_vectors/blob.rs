//! Full blob vector with fixed salt and IV, as produced by earlier
//! releases for `("password123", "Hello AES256")`.

use super::hex;
use shroud_crypto_core::blob::{open_bytes, seal_with, EncryptedBlob};

const SALT: &str = "94b51c8f77aa44bdf1a6071872cd89aae44fba848cf8a50c28280a9b79a56b24";
const IV: &str = "d3ebac3b568ef4e5369441a40eee4a24";
const BLOB: &str = concat!(
    "94b51c8f77aa44bdf1a6071872cd89aae44fba848cf8a50c28280a9b79a56b24",
    "d3ebac3b568ef4e5369441a40eee4a24",
    "760e01ae58b7a5dd08e376e573928c69"
);

#[test]
fn seal_with_fixed_salt_and_iv() {
    let salt: [u8; 32] = hex(SALT).try_into().unwrap();
    let iv: [u8; 16] = hex(IV).try_into().unwrap();
    let blob = seal_with("password123", b"Hello AES256", salt, iv).unwrap();
    assert_eq!(blob.to_bytes(), hex(BLOB));
}

#[test]
fn stored_blob_still_opens() {
    let pt = open_bytes("password123", &hex(BLOB)).unwrap();
    assert_eq!(pt.expose(), b"Hello AES256");
}

#[test]
fn stored_blob_layout() {
    let blob = EncryptedBlob::from_bytes(&hex(BLOB)).unwrap();
    assert_eq!(blob.salt.to_vec(), hex(SALT));
    assert_eq!(blob.iv.to_vec(), hex(IV));
    assert_eq!(blob.ciphertext.len(), 16);
}
