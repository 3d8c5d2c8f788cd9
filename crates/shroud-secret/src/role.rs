//! Execution roles and build modes.
//!
//! Every privilege decision in this crate is an exhaustive `match` over
//! [`ExecutionRole`].

use serde::{Deserialize, Serialize};

/// Process context a call site runs in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExecutionRole {
    /// Background process holding the encoding key.
    #[default]
    Privileged,
    /// UI process. Never reads or sets the encoding key and must pass keys
    /// explicitly.
    Untrusted,
    /// Embedded web sandbox. Starts without a key until the privileged
    /// process provisions one.
    Sandbox,
}

impl ExecutionRole {
    /// Stable string form for log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Privileged => "privileged",
            Self::Untrusted => "untrusted",
            Self::Sandbox => "sandbox",
        }
    }
}

/// Build flavour the process was started in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BuildMode {
    /// Release build.
    #[default]
    Production,
    /// Developer build: enables the re-encode self-check.
    Development,
    /// Test harness: raw passwords allowed, no delegation.
    Test,
}

/// Whether plaintext passwords may reach password-accepting entry points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RawPasswordPolicy {
    /// Plaintext passwords fail unless the caller explicitly allows them.
    Reject,
    /// Plaintext passwords pass through.
    Allow,
}

impl BuildMode {
    /// Raw-password policy for this mode.
    #[must_use]
    pub const fn raw_password_policy(self) -> RawPasswordPolicy {
        match self {
            Self::Production | Self::Development => RawPasswordPolicy::Reject,
            Self::Test => RawPasswordPolicy::Allow,
        }
    }
}
