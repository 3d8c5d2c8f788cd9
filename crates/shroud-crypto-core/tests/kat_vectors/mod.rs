mod aes_cbc;
mod blob;
mod digests;
mod pbkdf2;

/// Decode a lowercase hex literal.
pub fn hex(s: &str) -> Vec<u8> {
    data_encoding::HEXLOWER.decode(s.as_bytes()).unwrap()
}
