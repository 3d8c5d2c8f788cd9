//! SHA-256, SHA-512, HMAC and hash160 reference vectors over `"test-data"`.

use super::hex;
use shroud_crypto_core::hash::{hash160, hmac_sha256, hmac_sha512, sha256, sha512};

const DATA: &[u8] = b"test-data";
const KEY: &[u8] = b"test-key";

#[test]
fn sha256_test_data() {
    assert_eq!(
        sha256(DATA).to_vec(),
        hex("a186000422feab857329c684e9fe91412b1a5db084100b37a98cfc95b62aa867")
    );
}

#[test]
fn sha512_test_data() {
    assert_eq!(
        sha512(DATA).to_vec(),
        hex(concat!(
            "b85170060de23d2e06623e25b91078b88927237b6c7d5ed077b9898cb876b717",
            "1dfa57f13cc0355aca35993b850218cf0b69d116772e23cd5d5b96be3048e9fc"
        ))
    );
}

#[test]
fn hmac_sha256_test_key() {
    assert_eq!(
        hmac_sha256(KEY, DATA).to_vec(),
        hex("21a286fd6fd9f52676007c66d0f883db46d06158c266d33fb537c23bc618e567")
    );
}

#[test]
fn hmac_sha512_test_key() {
    assert_eq!(
        hmac_sha512(KEY, DATA).to_vec(),
        hex(concat!(
            "080e166f475f1c5d61f26b94d45a0cd822729a525e3a3865b87cdf58a36f039e",
            "a1948735aab3ad5027d553ad06487fb57d3a9034d2861300297d6cebf838f5bf"
        ))
    );
}

#[test]
fn hmac_sha256_empty_key_and_data() {
    assert_eq!(
        hmac_sha256(b"", b"").to_vec(),
        hex("b613679a0814d9ec772f95d778c35fc5ff1697c493715653c6c712144292c5ad")
    );
}

#[test]
fn hash160_test_data() {
    assert_eq!(
        hash160(DATA).to_vec(),
        hex("a54bc3b936756940bc8c80713f3ebb0efa870eed")
    );
}

#[test]
fn hash160_empty() {
    assert_eq!(
        hash160(b"").to_vec(),
        hex("b472a266d0bd89c13706a4132ccfb16f7c3b9fcb")
    );
}
