//! Delegation of AES work to an embedded execution context.
//!
//! Some runtimes (mobile shells) forward `encrypt`/`decrypt` to an embedded
//! web context that owns the crypto. The [`Gateway`] decides once, at
//! construction, whether this runtime delegates at all; the
//! [`DelegationStrategy`] decides per call whether the remote side is usable.
//!
//! Wire shape of a delegated call:
//!
//! ```json
//! { "module": "secret", "method": "decryptAsync",
//!   "params": { "password": "...", "data": "<hex>", "allowRawPassword": true } }
//! ```
//!
//! The response is the hex of the resulting bytes.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use data_encoding::{HEXLOWER, HEXLOWER_PERMISSIVE};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::config::SecretConfig;
use crate::error::SecretError;
use crate::role::{BuildMode, ExecutionRole};

/// Module name every delegated call is addressed to.
pub const REMOTE_MODULE: &str = "secret";

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Remote method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteMethod {
    #[serde(rename = "encryptAsync")]
    Encrypt,
    #[serde(rename = "decryptAsync")]
    Decrypt,
}

/// Parameters of a delegated call. The password is forwarded as given
/// (possibly still encoded); the remote side decodes it.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteParams {
    password: String,
    data: String,
    allow_raw_password: bool,
}

impl RemoteParams {
    /// Password or encoding key as passed by the caller.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Hex of the input bytes.
    #[must_use]
    pub fn data_hex(&self) -> &str {
        &self.data
    }

    /// Whether the caller allowed a plaintext password.
    #[must_use]
    pub const fn allow_raw_password(&self) -> bool {
        self.allow_raw_password
    }
}

impl Drop for RemoteParams {
    fn drop(&mut self) {
        self.password.zeroize();
        self.data.zeroize();
    }
}

impl fmt::Debug for RemoteParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteParams")
            .field("password", &"***")
            .field("data_len", &self.data.len())
            .field("allow_raw_password", &self.allow_raw_password)
            .finish()
    }
}

/// One delegated call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteRequest {
    module: String,
    method: RemoteMethod,
    params: RemoteParams,
}

impl RemoteRequest {
    /// `encryptAsync` request.
    #[must_use]
    pub fn encrypt(password: &str, data: &[u8], allow_raw_password: bool) -> Self {
        Self::new(RemoteMethod::Encrypt, password, data, allow_raw_password)
    }

    /// `decryptAsync` request.
    #[must_use]
    pub fn decrypt(password: &str, data: &[u8], allow_raw_password: bool) -> Self {
        Self::new(RemoteMethod::Decrypt, password, data, allow_raw_password)
    }

    /// Request for `method`; `data` is hex-encoded on the wire.
    #[must_use]
    pub fn new(
        method: RemoteMethod,
        password: &str,
        data: &[u8],
        allow_raw_password: bool,
    ) -> Self {
        Self {
            module: REMOTE_MODULE.to_owned(),
            method,
            params: RemoteParams {
                password: password.to_owned(),
                data: HEXLOWER.encode(data),
                allow_raw_password,
            },
        }
    }

    /// Target module.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Remote method.
    #[must_use]
    pub const fn method(&self) -> RemoteMethod {
        self.method
    }

    /// Call parameters.
    #[must_use]
    pub const fn params(&self) -> &RemoteParams {
        &self.params
    }
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Per-call delegation decision.
#[async_trait]
pub trait DelegationStrategy: Send + Sync {
    /// Attempt the call remotely.
    ///
    /// `None` means "run it locally"; `Some` is the remote outcome and is
    /// returned to the caller as-is.
    async fn try_remote(&self, request: &RemoteRequest) -> Option<Result<String, SecretError>>;
}

/// Never delegates.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalOnly;

#[async_trait]
impl DelegationStrategy for LocalOnly {
    async fn try_remote(&self, _request: &RemoteRequest) -> Option<Result<String, SecretError>> {
        None
    }
}

/// Channel to the embedded context.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    /// Whether the embedded context has finished loading.
    fn is_ready(&self) -> bool;

    /// Resolves once the embedded context is ready.
    async fn wait_ready(&self);

    /// Send one request; the result is the hex of the output bytes.
    ///
    /// # Errors
    ///
    /// Whatever the remote side reports. Surfaced to the caller unchanged.
    async fn call(&self, request: &RemoteRequest) -> Result<String, SecretError>;
}

/// Delegates to an embedded context through a [`RemoteTransport`].
///
/// Once the embedded context is known to have failed to initialize
/// ([`Self::mark_failed`]) every call falls back to the local path.
pub struct EmbeddedProxy<T> {
    transport: T,
    failed: AtomicBool,
    ready_timeout: Duration,
}

impl<T: RemoteTransport> EmbeddedProxy<T> {
    /// Proxy waiting at most `ready_timeout` for readiness.
    #[must_use]
    pub const fn new(transport: T, ready_timeout: Duration) -> Self {
        Self {
            transport,
            failed: AtomicBool::new(false),
            ready_timeout,
        }
    }

    /// Proxy using the readiness timeout from `config`.
    #[must_use]
    pub const fn from_config(transport: T, config: &SecretConfig) -> Self {
        Self::new(transport, config.remote_ready_timeout())
    }

    /// Record that the embedded context failed to initialize.
    pub fn mark_failed(&self) {
        if !self.failed.swap(true, Ordering::AcqRel) {
            tracing::warn!("embedded context failed to initialize; using local crypto");
        }
    }

    /// Whether [`Self::mark_failed`] has been called.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    /// Underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }
}

#[async_trait]
impl<T: RemoteTransport> DelegationStrategy for EmbeddedProxy<T> {
    async fn try_remote(&self, request: &RemoteRequest) -> Option<Result<String, SecretError>> {
        if self.is_failed() {
            tracing::debug!(method = ?request.method(), "embedded context failed; local fallback");
            return None;
        }
        if !self.transport.is_ready()
            && tokio::time::timeout(self.ready_timeout, self.transport.wait_ready())
                .await
                .is_err()
        {
            return Some(Err(SecretError::Remote(format!(
                "embedded context not ready after {} ms",
                self.ready_timeout.as_millis()
            ))));
        }
        tracing::debug!(method = ?request.method(), "delegating to embedded context");
        Some(self.transport.call(request).await)
    }
}

impl<T> fmt::Debug for EmbeddedProxy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddedProxy")
            .field("failed", &self.failed.load(Ordering::Relaxed))
            .field("ready_timeout", &self.ready_timeout)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

/// Routes AES work to the strategy or the local implementation.
#[derive(Clone)]
pub struct Gateway {
    strategy: Arc<dyn DelegationStrategy>,
    delegating: bool,
}

impl Gateway {
    /// Gateway for `config`. Delegation only happens when the config asks
    /// for it, the role is not the sandbox (which *is* the embedded context)
    /// and the build is not a test build.
    #[must_use]
    pub fn new(config: &SecretConfig, strategy: Arc<dyn DelegationStrategy>) -> Self {
        let delegating = config.delegate_to_embedded
            && config.role != ExecutionRole::Sandbox
            && config.build_mode != BuildMode::Test;
        Self {
            strategy,
            delegating,
        }
    }

    /// Whether calls are offered to the strategy at all.
    #[must_use]
    pub const fn is_delegating(&self) -> bool {
        self.delegating
    }

    /// Run one call. `request` is only built when this gateway delegates
    /// and the caller allows it (`remote_allowed`).
    ///
    /// # Errors
    ///
    /// The remote error if the strategy handled the call, `Remote` if the
    /// remote response is not hex, otherwise the local error.
    pub async fn dispatch<R, L, F>(
        &self,
        remote_allowed: bool,
        request: R,
        local: L,
    ) -> Result<Vec<u8>, SecretError>
    where
        R: FnOnce() -> RemoteRequest,
        L: FnOnce() -> F,
        F: Future<Output = Result<Vec<u8>, SecretError>>,
    {
        if remote_allowed && self.delegating {
            let request = request();
            if let Some(outcome) = self.strategy.try_remote(&request).await {
                let mut hex = outcome?;
                let decoded = HEXLOWER_PERMISSIVE.decode(hex.as_bytes()).map_err(|e| {
                    SecretError::Remote(format!("invalid hex in remote response: {e}"))
                });
                hex.zeroize();
                return decoded;
            }
        }
        local().await
    }
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway")
            .field("delegating", &self.delegating)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct MockTransport {
        ready: bool,
        calls: AtomicUsize,
        response: Result<String, String>,
    }

    impl MockTransport {
        fn ready(response: &str) -> Self {
            Self {
                ready: true,
                calls: AtomicUsize::new(0),
                response: Ok(response.to_owned()),
            }
        }

        fn never_ready() -> Self {
            Self {
                ready: false,
                calls: AtomicUsize::new(0),
                response: Ok(String::new()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RemoteTransport for MockTransport {
        fn is_ready(&self) -> bool {
            self.ready
        }

        async fn wait_ready(&self) {
            std::future::pending::<()>().await;
        }

        async fn call(&self, _request: &RemoteRequest) -> Result<String, SecretError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone().map_err(SecretError::Remote)
        }
    }

    fn delegating_config() -> SecretConfig {
        SecretConfig {
            delegate_to_embedded: true,
            ..SecretConfig::default()
        }
    }

    fn local_bytes() -> std::future::Ready<Result<Vec<u8>, SecretError>> {
        std::future::ready(Ok(vec![0x10, 0x20]))
    }

    #[test]
    fn request_serializes_to_wire_shape() {
        let request = RemoteRequest::decrypt("pw", &[0x00, 0xff], true);
        insta::assert_json_snapshot!(request, @r###"
        {
          "module": "secret",
          "method": "decryptAsync",
          "params": {
            "password": "pw",
            "data": "00ff",
            "allowRawPassword": true
          }
        }
        "###);
    }

    #[test]
    fn request_debug_masks_password() {
        let request = RemoteRequest::encrypt("hunter2", b"abc", false);
        let debug = format!("{request:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("Encrypt"));
    }

    #[test]
    fn eligibility_follows_config_role_and_mode() {
        let strategy: Arc<dyn DelegationStrategy> = Arc::new(LocalOnly);
        assert!(!Gateway::new(&SecretConfig::default(), strategy.clone()).is_delegating());
        assert!(Gateway::new(&delegating_config(), strategy.clone()).is_delegating());

        let sandbox = SecretConfig {
            role: ExecutionRole::Sandbox,
            ..delegating_config()
        };
        assert!(!Gateway::new(&sandbox, strategy.clone()).is_delegating());

        let test_mode = SecretConfig {
            build_mode: BuildMode::Test,
            ..delegating_config()
        };
        assert!(!Gateway::new(&test_mode, strategy).is_delegating());
    }

    #[tokio::test]
    async fn local_only_runs_local_path() {
        let gateway = Gateway::new(&delegating_config(), Arc::new(LocalOnly));
        let out = gateway
            .dispatch(true, || RemoteRequest::encrypt("pw", b"x", false), local_bytes)
            .await
            .unwrap();
        assert_eq!(out, vec![0x10, 0x20]);
    }

    #[tokio::test]
    async fn healthy_proxy_result_is_returned() {
        let proxy = Arc::new(EmbeddedProxy::new(
            MockTransport::ready("abcd"),
            Duration::from_millis(50),
        ));
        let gateway = Gateway::new(&delegating_config(), proxy.clone());
        let out = gateway
            .dispatch(true, || RemoteRequest::encrypt("pw", b"x", false), local_bytes)
            .await
            .unwrap();
        assert_eq!(out, vec![0xab, 0xcd]);
        assert_eq!(proxy.transport().calls(), 1);
    }

    #[tokio::test]
    async fn failed_proxy_falls_back_to_local() {
        let proxy = Arc::new(EmbeddedProxy::new(
            MockTransport::ready("abcd"),
            Duration::from_millis(50),
        ));
        proxy.mark_failed();
        assert!(proxy.is_failed());
        let gateway = Gateway::new(&delegating_config(), proxy.clone());
        let out = gateway
            .dispatch(true, || RemoteRequest::decrypt("pw", b"x", false), local_bytes)
            .await
            .unwrap();
        assert_eq!(out, vec![0x10, 0x20]);
        assert_eq!(proxy.transport().calls(), 0);
    }

    #[tokio::test]
    async fn not_ready_proxy_times_out() {
        let proxy = Arc::new(EmbeddedProxy::new(
            MockTransport::never_ready(),
            Duration::from_millis(20),
        ));
        let gateway = Gateway::new(&delegating_config(), proxy.clone());
        let err = gateway
            .dispatch(true, || RemoteRequest::decrypt("pw", b"x", false), local_bytes)
            .await
            .expect_err("not ready");
        assert!(matches!(err, SecretError::Remote(ref m) if m.contains("not ready after 20 ms")));
        assert_eq!(proxy.transport().calls(), 0);
    }

    #[tokio::test]
    async fn remote_error_is_surfaced() {
        let transport = MockTransport {
            ready: true,
            calls: AtomicUsize::new(0),
            response: Err("boom".to_owned()),
        };
        let gateway = Gateway::new(
            &delegating_config(),
            Arc::new(EmbeddedProxy::new(transport, Duration::from_millis(50))),
        );
        let err = gateway
            .dispatch(true, || RemoteRequest::decrypt("pw", b"x", false), local_bytes)
            .await
            .expect_err("remote failure");
        assert!(matches!(err, SecretError::Remote(ref m) if m == "boom"));
    }

    #[tokio::test]
    async fn non_hex_remote_response_is_a_remote_error() {
        let gateway = Gateway::new(
            &delegating_config(),
            Arc::new(EmbeddedProxy::new(
                MockTransport::ready("not-hex"),
                Duration::from_millis(50),
            )),
        );
        let err = gateway
            .dispatch(true, || RemoteRequest::decrypt("pw", b"x", false), local_bytes)
            .await
            .expect_err("bad hex");
        assert!(matches!(err, SecretError::Remote(_)));
    }

    #[tokio::test]
    async fn ineligible_gateway_never_builds_request() {
        let gateway = Gateway::new(&SecretConfig::default(), Arc::new(LocalOnly));
        let out = gateway
            .dispatch(true, || panic!("request must not be built"), local_bytes)
            .await
            .unwrap();
        assert_eq!(out.len(), 2);
    }

    #[tokio::test]
    async fn local_route_skips_healthy_proxy() {
        let proxy = Arc::new(EmbeddedProxy::new(
            MockTransport::ready("abcd"),
            Duration::from_millis(50),
        ));
        let gateway = Gateway::new(&delegating_config(), proxy.clone());
        assert!(gateway.is_delegating());
        let out = gateway
            .dispatch(false, || panic!("request must not be built"), local_bytes)
            .await
            .unwrap();
        assert_eq!(out, vec![0x10, 0x20]);
        assert_eq!(proxy.transport().calls(), 0);
    }
}
