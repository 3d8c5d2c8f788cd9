//! Password encryption and sensitive-text encoding facade.
//!
//! [`SecretEngine`] owns the configuration, the process [`KeyContext`] and
//! the delegation [`Gateway`]. It is cheap to clone and safe to share across
//! tasks.
//!
//! # Passwords
//!
//! Every password-accepting call takes either a plaintext password or an
//! encoded one (see [`crate::scheme`]). Encoded passwords are decoded with the
//! encoding key before use; plaintext passwords are refused outside test
//! builds unless the call explicitly allows them.

use std::sync::{Arc, Once};

use data_encoding::{BASE64, HEXLOWER, HEXLOWER_PERMISSIVE};
use futures::executor;
use futures::future::{BoxFuture, FutureExt};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use shroud_crypto_core::{blob, EncryptedBlob, SecretBuffer};

use crate::config::SecretConfig;
use crate::error::SecretError;
use crate::gateway::{DelegationStrategy, Gateway, LocalOnly, RemoteMethod, RemoteRequest};
use crate::key::{is_encoding_key, KeyContext};
use crate::role::{BuildMode, ExecutionRole, RawPasswordPolicy};
use crate::scheme::{AesScheme, Scheme, XorScheme};

// ---------------------------------------------------------------------------
// String encodings
// ---------------------------------------------------------------------------

/// Text encoding of byte payloads in the string helpers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataEncoding {
    #[default]
    Hex,
    Base64,
    Utf8,
}

impl DataEncoding {
    /// Parse `data` into bytes.
    ///
    /// # Errors
    ///
    /// Returns `SecretError::MalformedInput` if `data` is not valid for this
    /// encoding.
    pub fn decode(self, data: &str) -> Result<Vec<u8>, SecretError> {
        match self {
            Self::Hex => HEXLOWER_PERMISSIVE
                .decode(data.as_bytes())
                .map_err(|e| SecretError::MalformedInput(format!("invalid hex data: {e}"))),
            Self::Base64 => BASE64
                .decode(data.as_bytes())
                .map_err(|e| SecretError::MalformedInput(format!("invalid base64 data: {e}"))),
            Self::Utf8 => Ok(data.as_bytes().to_vec()),
        }
    }

    /// Render `bytes` in this encoding.
    ///
    /// # Errors
    ///
    /// Returns `SecretError::MalformedInput` for non-UTF-8 bytes under
    /// [`DataEncoding::Utf8`].
    pub fn encode(self, bytes: &[u8]) -> Result<String, SecretError> {
        match self {
            Self::Hex => Ok(HEXLOWER.encode(bytes)),
            Self::Base64 => Ok(BASE64.encode(bytes)),
            Self::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|_| {
                SecretError::MalformedInput("decrypted data is not valid utf-8".into())
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Whether AES work for one call may be offered to the gateway's strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Route {
    Delegable,
    Local,
}

impl Route {
    const fn may_delegate(self) -> bool {
        matches!(self, Self::Delegable)
    }
}

struct Inner {
    config: SecretConfig,
    keys: Arc<KeyContext>,
    gateway: Gateway,
}

/// Entry point for password encryption and sensitive-text encoding.
#[derive(Clone)]
pub struct SecretEngine {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SecretEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretEngine")
            .field("role", &self.inner.config.role)
            .field("build_mode", &self.inner.config.build_mode)
            .field("scheme", &self.inner.config.scheme)
            .field("gateway", &self.inner.gateway)
            .finish_non_exhaustive()
    }
}

impl SecretEngine {
    /// Engine with a fresh key context and no delegation.
    #[must_use]
    pub fn new(config: SecretConfig) -> Self {
        Self::with_strategy(config, Arc::new(LocalOnly))
    }

    /// Engine delegating through `strategy` when `config` allows it.
    #[must_use]
    pub fn with_strategy(config: SecretConfig, strategy: Arc<dyn DelegationStrategy>) -> Self {
        let keys = Arc::new(KeyContext::new(config.role));
        Self::with_parts(config, keys, strategy)
    }

    /// Engine sharing an existing key context.
    ///
    /// The role is taken from `keys`; `config.role` is overwritten to match.
    #[must_use]
    pub fn with_parts(
        mut config: SecretConfig,
        keys: Arc<KeyContext>,
        strategy: Arc<dyn DelegationStrategy>,
    ) -> Self {
        config.role = keys.role();
        let gateway = Gateway::new(&config, strategy);
        tracing::debug!(
            role = config.role.as_str(),
            scheme = config.scheme.as_str(),
            delegating = gateway.is_delegating(),
            "secret engine created"
        );
        Self {
            inner: Arc::new(Inner {
                config,
                keys,
                gateway,
            }),
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &SecretConfig {
        &self.inner.config
    }

    /// Shared key context.
    #[must_use]
    pub fn key_context(&self) -> &Arc<KeyContext> {
        &self.inner.keys
    }

    fn role(&self) -> ExecutionRole {
        self.inner.config.role
    }

    // -- Encoding key ------------------------------------------------------

    /// Read the encoding key.
    ///
    /// # Errors
    ///
    /// `PrivilegeViolation` in the untrusted role.
    pub fn encoding_key(&self) -> Result<SecretString, SecretError> {
        self.inner.keys.get()
    }

    /// Provision the encoding key. Sandbox only.
    ///
    /// # Errors
    ///
    /// `PrivilegeViolation` outside the sandbox.
    pub fn set_encoding_key(&self, key: SecretString) -> Result<(), SecretError> {
        self.inner.keys.set(key)
    }

    // -- Blob encryption ---------------------------------------------------

    /// Encrypt `data` under `password` into a fresh blob.
    ///
    /// # Errors
    ///
    /// - `IncorrectCredential` for an empty password
    /// - `PlaintextPolicyViolation` for a plaintext password outside test builds
    /// - `Remote` if the embedded context failed the call
    pub async fn encrypt(&self, password: &str, data: &[u8]) -> Result<EncryptedBlob, SecretError> {
        self.encrypt_with(password, data, false).await
    }

    /// [`Self::encrypt`] with an explicit raw-password override.
    ///
    /// # Errors
    ///
    /// As [`Self::encrypt`].
    pub async fn encrypt_with(
        &self,
        password: &str,
        data: &[u8],
        allow_raw_password: bool,
    ) -> Result<EncryptedBlob, SecretError> {
        self.encrypt_on(password, data, allow_raw_password, Route::Delegable)
            .await
    }

    /// Decrypt `blob` under `password`.
    ///
    /// # Errors
    ///
    /// - `IncorrectCredential` for an empty or wrong password
    /// - `PlaintextPolicyViolation` for a plaintext password outside test builds
    /// - `Remote` if the embedded context failed the call
    pub async fn decrypt(
        &self,
        password: &str,
        blob: &EncryptedBlob,
    ) -> Result<SecretBuffer, SecretError> {
        self.decrypt_with(password, blob, false).await
    }

    /// [`Self::decrypt`] with an explicit raw-password override.
    ///
    /// # Errors
    ///
    /// As [`Self::decrypt`].
    pub async fn decrypt_with(
        &self,
        password: &str,
        blob: &EncryptedBlob,
        allow_raw_password: bool,
    ) -> Result<SecretBuffer, SecretError> {
        self.decrypt_on(password, blob, allow_raw_password, Route::Delegable)
            .await
    }

    /// Encrypt `data` (in `data_encoding`) and return the blob as hex.
    ///
    /// # Errors
    ///
    /// `MalformedInput` if `data` does not parse, otherwise as
    /// [`Self::encrypt`].
    pub async fn encrypt_string(
        &self,
        password: &str,
        data: &str,
        data_encoding: DataEncoding,
    ) -> Result<String, SecretError> {
        let bytes = data_encoding.decode(data)?;
        let blob = self.encrypt(password, &bytes).await?;
        Ok(HEXLOWER.encode(&blob.to_bytes()))
    }

    /// Decrypt a blob given in `data_encoding` and render the plaintext in
    /// `result_encoding`.
    ///
    /// # Errors
    ///
    /// `MalformedInput` if `data` does not parse or the result is not UTF-8
    /// under [`DataEncoding::Utf8`], otherwise as [`Self::decrypt`].
    pub async fn decrypt_string(
        &self,
        password: &str,
        data: &str,
        data_encoding: DataEncoding,
        result_encoding: DataEncoding,
    ) -> Result<String, SecretError> {
        let bytes = data_encoding.decode(data)?;
        let blob = EncryptedBlob::from_bytes(&bytes)?;
        let plaintext = self.decrypt(password, &blob).await?;
        result_encoding.encode(plaintext.expose())
    }

    async fn encrypt_on(
        &self,
        password: &str,
        data: &[u8],
        allow_raw: bool,
        route: Route,
    ) -> Result<EncryptedBlob, SecretError> {
        let bytes = self
            .run_aes(RemoteMethod::Encrypt, password, data, allow_raw, route)
            .await?;
        EncryptedBlob::from_bytes(&bytes)
            .map_err(|e| SecretError::Remote(format!("malformed blob returned: {e}")))
    }

    async fn decrypt_on(
        &self,
        password: &str,
        blob: &EncryptedBlob,
        allow_raw: bool,
        route: Route,
    ) -> Result<SecretBuffer, SecretError> {
        let data = blob.to_bytes();
        let plaintext = self
            .run_aes(RemoteMethod::Decrypt, password, &data, allow_raw, route)
            .await?;
        Ok(SecretBuffer::from_vec(plaintext))
    }

    async fn run_aes(
        &self,
        method: RemoteMethod,
        password: &str,
        data: &[u8],
        allow_raw: bool,
        route: Route,
    ) -> Result<Vec<u8>, SecretError> {
        if password.is_empty() {
            return Err(SecretError::IncorrectCredential);
        }
        self.inner
            .gateway
            .dispatch(
                route.may_delegate(),
                || RemoteRequest::new(method, password, data, allow_raw),
                || self.run_aes_local(method, password, data, allow_raw),
            )
            .await
    }

    async fn run_aes_local(
        &self,
        method: RemoteMethod,
        password: &str,
        data: &[u8],
        allow_raw: bool,
    ) -> Result<Vec<u8>, SecretError> {
        let decoded = self
            .decode_password_on(password, None, allow_raw, Route::Local)
            .await?;
        let decoded = decoded.expose_secret();
        if decoded.is_empty() {
            return Err(SecretError::IncorrectCredential);
        }
        match method {
            RemoteMethod::Encrypt => {
                let sealed = blob::seal(decoded, data)?;
                tracing::debug!(data_len = data.len(), "encrypted locally");
                Ok(sealed.to_bytes())
            }
            RemoteMethod::Decrypt => {
                let plaintext = blob::open_bytes(decoded, data)?;
                tracing::debug!(blob_len = data.len(), "decrypted locally");
                Ok(plaintext.to_vec())
            }
        }
    }

    // -- Sensitive text ----------------------------------------------------

    /// Encode `text` under the encoding key (or `key`, if given).
    ///
    /// Already-encoded text is returned unchanged.
    ///
    /// # Errors
    ///
    /// - `PrivilegeViolation` in the untrusted role without `key`
    /// - `KeyNotProvisioned` if the resolved key is empty
    /// - in development builds, the decode error of already-encoded text
    ///   that does not decode under the key
    pub async fn encode_sensitive_text(
        &self,
        text: &str,
        key: Option<&str>,
    ) -> Result<String, SecretError> {
        self.encode_text(text, key, Route::Delegable).await
    }

    /// Decode `token` under the encoding key (or `key`, if given).
    ///
    /// Text without a known marker is returned unchanged.
    ///
    /// # Errors
    ///
    /// - `PrivilegeViolation` in the untrusted role without `key`
    /// - `KeyNotProvisioned` if the resolved key is empty
    /// - `MalformedInput` for a payload that is not hex
    /// - `IncorrectCredential` for a wrong key or corrupted payload
    pub async fn decode_sensitive_text(
        &self,
        token: &str,
        key: Option<&str>,
    ) -> Result<String, SecretError> {
        self.decode_text(token, key, Route::Delegable).await
    }

    async fn encode_text(
        &self,
        text: &str,
        key: Option<&str>,
        route: Route,
    ) -> Result<String, SecretError> {
        let key = self.inner.keys.resolve(key)?;
        if let Some(token) = self.already_encoded(text, &key).await? {
            return Ok(token);
        }
        let key = key.expose_secret();
        let token = match self.inner.config.scheme {
            Scheme::Aes => {
                let bytes = self
                    .run_aes(RemoteMethod::Encrypt, key, text.as_bytes(), true, route)
                    .await?;
                AesScheme::wrap(&bytes)
            }
            Scheme::Xor => XorScheme::seal(text, key)?,
        };
        tracing::debug!(scheme = self.inner.config.scheme.as_str(), "sensitive text encoded");
        Ok(token)
    }

    async fn decode_text(
        &self,
        token: &str,
        key: Option<&str>,
        route: Route,
    ) -> Result<String, SecretError> {
        let key = self.inner.keys.resolve(key)?;
        let key = key.expose_secret();
        match Scheme::detect(token) {
            None => {
                tracing::debug!("text carries no marker; returned unchanged");
                Ok(token.to_owned())
            }
            Some(Scheme::Aes) => {
                let payload = AesScheme::unwrap_payload(token)?;
                let plaintext = self
                    .run_aes(RemoteMethod::Decrypt, key, &payload, true, route)
                    .await?;
                AesScheme::text_from_plaintext(plaintext)
            }
            Some(Scheme::Xor) => XorScheme::open(token, key),
        }
    }

    /// `Some(text)` if `text` is already encoded. Development builds that run
    /// the codec locally verify it decodes under `key` first.
    async fn already_encoded(
        &self,
        text: &str,
        key: &SecretString,
    ) -> Result<Option<String>, SecretError> {
        if !crate::scheme::is_encoded(text) {
            return Ok(None);
        }
        if self.inner.config.build_mode == BuildMode::Development
            && self.role() != ExecutionRole::Untrusted
            && !self.inner.gateway.is_delegating()
        {
            self.decode_text(text, Some(key.expose_secret()), Route::Local)
                .await?;
        }
        Ok(Some(text.to_owned()))
    }

    // -- Passwords ---------------------------------------------------------

    /// Encode a password for transport. Same as
    /// [`Self::encode_sensitive_text`].
    ///
    /// # Errors
    ///
    /// As [`Self::encode_sensitive_text`].
    pub async fn encode_password(
        &self,
        password: &str,
        key: Option<&str>,
    ) -> Result<String, SecretError> {
        self.encode_sensitive_text(password, key).await
    }

    /// Recover the plaintext password from `password`.
    ///
    /// An encoding key passed in place of a password is returned unchanged
    /// (recognized by prefix only).
    ///
    /// # Errors
    ///
    /// - `PrivilegeViolation` when decoding in the untrusted role
    /// - `PlaintextPolicyViolation` for a non-empty plaintext password when
    ///   the policy rejects it and `allow_raw_password` is false
    /// - decode errors from [`Self::decode_sensitive_text`]
    pub async fn decode_password(
        &self,
        password: &str,
        key: Option<&str>,
        allow_raw_password: bool,
    ) -> Result<SecretString, SecretError> {
        self.decode_password_on(password, key, allow_raw_password, Route::Delegable)
            .await
    }

    // Boxed: local AES decodes its password through here, which closes a
    // cycle in the future types.
    fn decode_password_on<'a>(
        &'a self,
        password: &'a str,
        key: Option<&'a str>,
        allow_raw_password: bool,
        route: Route,
    ) -> BoxFuture<'a, Result<SecretString, SecretError>> {
        async move {
            if is_encoding_key(password) {
                return Ok(SecretString::from(password.to_owned()));
            }
            if crate::scheme::is_encoded(password) {
                self.ensure_may_decode_password()?;
                let decoded = self.decode_text(password, key, route).await?;
                return Ok(SecretString::from(decoded));
            }
            self.check_raw_password(password, allow_raw_password)?;
            Ok(SecretString::from(password.to_owned()))
        }
        .boxed()
    }

    fn ensure_may_decode_password(&self) -> Result<(), SecretError> {
        match self.role() {
            ExecutionRole::Untrusted => Err(SecretError::PrivilegeViolation(
                "decode_password can not be called from the UI".into(),
            )),
            ExecutionRole::Privileged | ExecutionRole::Sandbox => Ok(()),
        }
    }

    fn check_raw_password(
        &self,
        password: &str,
        allow_raw_password: bool,
    ) -> Result<(), SecretError> {
        match self.inner.config.raw_password_policy() {
            RawPasswordPolicy::Reject if !password.is_empty() && !allow_raw_password => {
                tracing::error!(
                    "raw password rejected; encode it where it enters the call stack"
                );
                Err(SecretError::PlaintextPolicyViolation(
                    "passing a raw password is not allowed".into(),
                ))
            }
            RawPasswordPolicy::Reject | RawPasswordPolicy::Allow => Ok(()),
        }
    }

    // -- Deprecated blocking variants --------------------------------------
    //
    // Each drives the async implementation on the local route, which never
    // awaits anything that can pend.

    /// Blocking [`Self::encrypt`]. Always runs locally.
    ///
    /// # Errors
    ///
    /// As [`Self::encrypt`], minus `Remote`.
    #[deprecated(note = "use `encrypt`")]
    pub fn encrypt_blocking(
        &self,
        password: &str,
        data: &[u8],
    ) -> Result<EncryptedBlob, SecretError> {
        static WARNED: Once = Once::new();
        warn_deprecated(&WARNED, "encrypt_blocking", "encrypt");
        executor::block_on(self.encrypt_on(password, data, false, Route::Local))
    }

    /// Blocking [`Self::decrypt`]. Always runs locally.
    ///
    /// # Errors
    ///
    /// As [`Self::decrypt`], minus `Remote`.
    #[deprecated(note = "use `decrypt`")]
    pub fn decrypt_blocking(
        &self,
        password: &str,
        blob: &EncryptedBlob,
    ) -> Result<SecretBuffer, SecretError> {
        static WARNED: Once = Once::new();
        warn_deprecated(&WARNED, "decrypt_blocking", "decrypt");
        executor::block_on(self.decrypt_on(password, blob, false, Route::Local))
    }

    /// Blocking [`Self::encode_sensitive_text`]. Always runs locally.
    ///
    /// # Errors
    ///
    /// As [`Self::encode_sensitive_text`].
    #[deprecated(note = "use `encode_sensitive_text`")]
    pub fn encode_sensitive_text_blocking(
        &self,
        text: &str,
        key: Option<&str>,
    ) -> Result<String, SecretError> {
        static WARNED: Once = Once::new();
        warn_deprecated(&WARNED, "encode_sensitive_text_blocking", "encode_sensitive_text");
        executor::block_on(self.encode_text(text, key, Route::Local))
    }

    /// Blocking [`Self::decode_sensitive_text`]. Always runs locally.
    ///
    /// # Errors
    ///
    /// As [`Self::decode_sensitive_text`].
    #[deprecated(note = "use `decode_sensitive_text`")]
    pub fn decode_sensitive_text_blocking(
        &self,
        token: &str,
        key: Option<&str>,
    ) -> Result<String, SecretError> {
        static WARNED: Once = Once::new();
        warn_deprecated(&WARNED, "decode_sensitive_text_blocking", "decode_sensitive_text");
        executor::block_on(self.decode_text(token, key, Route::Local))
    }

    /// Blocking [`Self::decode_password`]. Always runs locally.
    ///
    /// # Errors
    ///
    /// As [`Self::decode_password`].
    #[deprecated(note = "use `decode_password`")]
    pub fn decode_password_blocking(
        &self,
        password: &str,
        key: Option<&str>,
        allow_raw_password: bool,
    ) -> Result<SecretString, SecretError> {
        static WARNED: Once = Once::new();
        warn_deprecated(&WARNED, "decode_password_blocking", "decode_password");
        let decoded = self.decode_password_on(password, key, allow_raw_password, Route::Local);
        executor::block_on(decoded)
    }
}

fn warn_deprecated(once: &'static Once, function: &'static str, replacement: &'static str) {
    once.call_once(|| {
        tracing::warn!(function, replacement, "deprecated blocking call");
    });
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
