//! PBKDF2-HMAC-SHA256 over `SHA256(password)`, 5000 iterations.

use super::hex;
use shroud_crypto_core::kdf::{derive_key, SALT_LEN};

const SALT: [u8; SALT_LEN] = [0xAA; SALT_LEN];

#[test]
fn derive_key_test_password() {
    let key = derive_key("test-password", &SALT).unwrap();
    assert_eq!(
        key.expose().to_vec(),
        hex("285fd91f4f18ce460cc6ae4f87bdf4bb3f44a2531c4ef749866d5893d9262af9")
    );
}

#[test]
fn derive_key_empty_password() {
    let key = derive_key("", &SALT).unwrap();
    assert_eq!(
        key.expose().to_vec(),
        hex("0402d67f0a86d5ed5d77897ef4f943b83bac1eb4ffcebff1869e8b60a0583f63")
    );
}
