//! AES-256-CBC/PKCS#7 vectors with IV = 16×`0x01`, key = 32×`0x02`.

use super::hex;
use shroud_crypto_core::symmetric::{aes_cbc_decrypt, aes_cbc_encrypt, IV_LEN, KEY_LEN};

const IV: [u8; IV_LEN] = [0x01; IV_LEN];
const KEY: [u8; KEY_LEN] = [0x02; KEY_LEN];

#[test]
fn hello_world_ciphertext() {
    let ct = aes_cbc_encrypt(&IV, &KEY, b"Hello, World!").unwrap();
    assert_eq!(ct, hex("a5cdb34ec29d8e812352b773c33dcb4f"));
    let pt = aes_cbc_decrypt(&IV, &KEY, &ct).unwrap();
    assert_eq!(pt.expose(), b"Hello, World!");
}

#[test]
fn empty_plaintext_is_one_padding_block() {
    let ct = aes_cbc_encrypt(&IV, &KEY, b"").unwrap();
    assert_eq!(ct, hex("b5f01654075424cc2962da6a15b90616"));
}
