#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects, deprecated)]

//! Cross-process scenarios: background, UI and sandbox engines working on
//! the same secrets.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use shroud_secret::{
    ensure_encoded, BuildMode, ExecutionRole, KeyContext, LocalOnly, SecretConfig, SecretEngine,
    SecretError, AES_MARKER, ENCODE_KEY_PREFIX,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn background() -> SecretEngine {
    SecretEngine::new(SecretConfig::default())
}

fn ui() -> SecretEngine {
    SecretEngine::new(SecretConfig::for_role(ExecutionRole::Untrusted))
}

fn sandbox() -> SecretEngine {
    SecretEngine::new(SecretConfig::for_role(ExecutionRole::Sandbox))
}

#[tokio::test]
async fn ui_encodes_password_background_unlocks() {
    init_tracing();
    let bg = background();
    let key = bg.encoding_key().unwrap();

    // UI fetches the key over IPC and encodes the typed password.
    let ui = ui();
    let encoded = ui
        .encode_password("correct horse", Some(key.expose_secret()))
        .await
        .unwrap();
    ensure_encoded(&encoded).unwrap();

    let blob = bg.encrypt(&encoded, b"mnemonic").await.unwrap();
    let plain = bg.decrypt(&encoded, &blob).await.unwrap();
    assert_eq!(plain.expose(), b"mnemonic");
}

#[tokio::test]
async fn ui_cannot_read_or_set_key() {
    let ui = ui();
    assert!(matches!(ui.encoding_key(), Err(SecretError::PrivilegeViolation(_))));
    assert!(matches!(
        ui.set_encoding_key(SecretString::from("k".to_owned())),
        Err(SecretError::PrivilegeViolation(_))
    ));
}

#[tokio::test]
async fn ui_decode_without_key_is_rejected() {
    let ui = ui();
    let token = background().encode_sensitive_text("x", None).await.unwrap();
    assert!(matches!(
        ui.decode_sensitive_text(&token, None).await,
        Err(SecretError::PrivilegeViolation(_))
    ));
}

#[tokio::test]
async fn background_cannot_set_key() {
    let err = background()
        .set_encoding_key(SecretString::from("k".to_owned()))
        .expect_err("privileged");
    assert!(matches!(err, SecretError::PrivilegeViolation(ref m) if m.contains("sandbox")));
}

#[tokio::test]
async fn sandbox_decodes_background_tokens_once_provisioned() {
    init_tracing();
    let bg = background();
    let token = bg.encode_sensitive_text("shared", None).await.unwrap();

    let sb = sandbox();
    assert!(matches!(
        sb.decode_sensitive_text(&token, None).await,
        Err(SecretError::KeyNotProvisioned)
    ));

    let key = bg.encoding_key().unwrap();
    sb.set_encoding_key(SecretString::from(key.expose_secret().to_owned()))
        .unwrap();
    assert_eq!(sb.decode_sensitive_text(&token, None).await.unwrap(), "shared");
}

#[tokio::test]
async fn tokens_from_another_process_key_are_rejected() {
    let token = background().encode_sensitive_text("x", None).await.unwrap();
    let other = background();
    assert!(matches!(
        other.decode_sensitive_text(&token, None).await,
        Err(SecretError::IncorrectCredential)
    ));
}

#[tokio::test]
async fn encoding_key_shape() {
    let key = background().encoding_key().unwrap();
    let suffix = key.expose_secret().strip_prefix(ENCODE_KEY_PREFIX).unwrap();
    assert!(uuid::Uuid::parse_str(suffix).is_ok());
}

#[tokio::test]
async fn shared_key_context_across_engines() {
    let keys = Arc::new(KeyContext::new(ExecutionRole::Privileged));
    let a = SecretEngine::with_parts(SecretConfig::default(), keys.clone(), Arc::new(LocalOnly));
    let b = SecretEngine::with_parts(
        SecretConfig {
            // Overwritten by the shared context.
            role: ExecutionRole::Sandbox,
            ..SecretConfig::default()
        },
        keys,
        Arc::new(LocalOnly),
    );
    assert_eq!(b.config().role, ExecutionRole::Privileged);
    let token = a.encode_sensitive_text("x", None).await.unwrap();
    assert_eq!(b.decode_sensitive_text(&token, None).await.unwrap(), "x");
}

#[tokio::test]
async fn blocking_and_async_variants_agree() {
    let engine = SecretEngine::new(SecretConfig {
        build_mode: BuildMode::Test,
        ..SecretConfig::default()
    });

    let async_token = engine.encode_sensitive_text("same", None).await.unwrap();
    let blocking_token = engine.encode_sensitive_text_blocking("same", None).unwrap();
    assert!(blocking_token.starts_with(AES_MARKER));
    assert_eq!(
        engine.decode_sensitive_text_blocking(&async_token, None).unwrap(),
        "same"
    );
    assert_eq!(
        engine.decode_sensitive_text(&blocking_token, None).await.unwrap(),
        "same"
    );

    let blob = engine.encrypt_blocking("pw", b"data").unwrap();
    assert_eq!(engine.decrypt("pw", &blob).await.unwrap().expose(), b"data");
    let blob = engine.encrypt("pw", b"data").await.unwrap();
    assert_eq!(engine.decrypt_blocking("pw", &blob).unwrap().expose(), b"data");

    let encoded = engine.encode_password("pw", None).await.unwrap();
    let via_async = engine.decode_password(&encoded, None, false).await.unwrap();
    let via_blocking = engine.decode_password_blocking(&encoded, None, false).unwrap();
    assert_eq!(via_async.expose_secret(), via_blocking.expose_secret());
}

#[tokio::test]
async fn blocking_variants_keep_policy_errors() {
    let engine = background();
    assert!(matches!(
        engine.encrypt_blocking("raw", b"x"),
        Err(SecretError::PlaintextPolicyViolation(_))
    ));
    assert!(matches!(
        engine.encrypt_blocking("", b"x"),
        Err(SecretError::IncorrectCredential)
    ));
}
