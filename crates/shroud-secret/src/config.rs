//! Engine configuration.
//!
//! Non-sensitive, so it may live in a plain JSON file next to the app
//! data. All fields have defaults; a missing or corrupt file yields the
//! defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SecretError;
use crate::role::{BuildMode, ExecutionRole, RawPasswordPolicy};
use crate::scheme::Scheme;

/// Default wait for the embedded context to report ready.
pub const DEFAULT_REMOTE_READY_TIMEOUT_MS: u64 = 5_000;

/// Configuration injected into [`crate::SecretEngine`] at construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecretConfig {
    /// Role of the current process.
    #[serde(default)]
    pub role: ExecutionRole,

    /// Build mode; drives the raw-password policy and dev self-check.
    #[serde(default)]
    pub build_mode: BuildMode,

    /// Scheme used for new encodings. Both decoders stay available.
    #[serde(default)]
    pub scheme: Scheme,

    /// Whether this runtime forwards crypto to an embedded context first.
    #[serde(default)]
    pub delegate_to_embedded: bool,

    /// Milliseconds to wait for the embedded context to become ready.
    #[serde(default = "default_remote_ready_timeout_ms")]
    pub remote_ready_timeout_ms: u64,
}

impl Default for SecretConfig {
    fn default() -> Self {
        Self {
            role: ExecutionRole::default(),
            build_mode: BuildMode::default(),
            scheme: Scheme::default(),
            delegate_to_embedded: false,
            remote_ready_timeout_ms: default_remote_ready_timeout_ms(),
        }
    }
}

const fn default_remote_ready_timeout_ms() -> u64 {
    DEFAULT_REMOTE_READY_TIMEOUT_MS
}

impl SecretConfig {
    /// Config for a given role with every other field defaulted.
    #[must_use]
    pub fn for_role(role: ExecutionRole) -> Self {
        Self {
            role,
            ..Self::default()
        }
    }

    /// Load from a JSON file, falling back to defaults when the file is
    /// missing or unparsable.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        fs::read_to_string(path).map_or_else(
            |_| Self::default(),
            |contents| serde_json::from_str(&contents).unwrap_or_default(),
        )
    }

    /// Strict parse from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns `SecretError::MalformedInput` if the JSON is invalid.
    pub fn from_json(json: &str) -> Result<Self, SecretError> {
        serde_json::from_str(json)
            .map_err(|e| SecretError::MalformedInput(format!("invalid config: {e}")))
    }

    /// Raw-password policy implied by the build mode.
    #[must_use]
    pub const fn raw_password_policy(&self) -> RawPasswordPolicy {
        self.build_mode.raw_password_policy()
    }

    /// Readiness timeout as a `Duration`.
    #[must_use]
    pub const fn remote_ready_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_ready_timeout_ms)
    }
}

// ── Tests ──────────────────────────────────────────────────────────
