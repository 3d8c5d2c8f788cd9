//! `shroud-secret`: password codec, sensitive-text codec and encoding-key
//! management on top of `shroud-crypto-core`.
//!
//! Start from [`SecretEngine`]:
//!
//! ```no_run
//! # async fn demo() -> Result<(), shroud_secret::SecretError> {
//! use shroud_secret::{SecretConfig, SecretEngine};
//!
//! let engine = SecretEngine::new(SecretConfig::default());
//! let encoded = engine.encode_password("hunter2", None).await?;
//! let blob = engine.encrypt(&encoded, b"wallet seed").await?;
//! let plain = engine.decrypt(&encoded, &blob).await?;
//! assert_eq!(plain.expose(), b"wallet seed");
//! # Ok(())
//! # }
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod key;
pub mod role;
pub mod scheme;

pub use config::SecretConfig;
pub use engine::{DataEncoding, SecretEngine};
pub use error::SecretError;
pub use gateway::{
    DelegationStrategy, EmbeddedProxy, Gateway, LocalOnly, RemoteMethod, RemoteRequest,
    RemoteTransport,
};
pub use key::{is_encoding_key, KeyContext, ENCODE_KEY_PREFIX};
pub use role::{BuildMode, ExecutionRole, RawPasswordPolicy};
pub use scheme::{
    ensure_encoded, ensure_encoded_opt, is_encoded, AesScheme, Scheme, XorScheme, AES_MARKER,
    XOR_MARKER,
};
pub use shroud_crypto_core::{EncryptedBlob, SecretBuffer};
