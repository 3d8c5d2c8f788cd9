//! The process encoding key.
//!
//! One [`KeyContext`] exists per process and is shared as
//! `Arc<KeyContext>`. Its role is fixed at construction, so every access
//! check is a single match on that role instead of ambient flags.
//!
//! | Role        | Initial key                     | `get` | `set` |
//! |-------------|---------------------------------|-------|-------|
//! | Privileged  | `ENCODE_KEY::…::<uuid>`         | yes   | no    |
//! | Untrusted   | `ENCODE_KEY::…::<uuid>` (unused)| no    | no    |
//! | Sandbox     | empty until provisioned         | yes   | yes   |

use std::sync::{PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

use crate::error::SecretError;
use crate::role::ExecutionRole;

/// Prefix shared by every generated encoding key.
///
/// `decode_password` relies on it to recognise a key passed where a
/// password is expected.
pub const ENCODE_KEY_PREFIX: &str = "ENCODE_KEY::755174C1-6480-401A-8C3D-84ADB2E0C376::";

/// Holder of the encoding key for one process.
#[derive(Debug)]
pub struct KeyContext {
    role: ExecutionRole,
    key: RwLock<SecretString>,
}

impl KeyContext {
    /// Create the context for `role`, generating a fresh key unless the
    /// role is [`ExecutionRole::Sandbox`].
    #[must_use]
    pub fn new(role: ExecutionRole) -> Self {
        let initial = match role {
            ExecutionRole::Privileged | ExecutionRole::Untrusted => generate_key(),
            ExecutionRole::Sandbox => String::new(),
        };
        tracing::debug!(
            role = role.as_str(),
            provisioned = !initial.is_empty(),
            "encoding key context created"
        );
        Self {
            role,
            key: RwLock::new(SecretString::from(initial)),
        }
    }

    /// Role this context was created for.
    #[must_use]
    pub const fn role(&self) -> ExecutionRole {
        self.role
    }

    /// Read the encoding key.
    ///
    /// In the sandbox this may be empty until [`Self::set`] has run.
    ///
    /// # Errors
    ///
    /// Returns `SecretError::PrivilegeViolation` in the untrusted role.
    pub fn get(&self) -> Result<SecretString, SecretError> {
        match self.role {
            ExecutionRole::Untrusted => Err(SecretError::PrivilegeViolation(
                "the encoding key can not be read from the UI; call through the background proxy"
                    .into(),
            )),
            ExecutionRole::Privileged | ExecutionRole::Sandbox => Ok(self.current()),
        }
    }

    /// Overwrite the encoding key. Sandbox only; no versioning.
    ///
    /// # Errors
    ///
    /// Returns `SecretError::PrivilegeViolation` outside the sandbox.
    pub fn set(&self, key: SecretString) -> Result<(), SecretError> {
        match self.role {
            ExecutionRole::Untrusted => Err(SecretError::PrivilegeViolation(
                "the encoding key can not be set from the UI".into(),
            )),
            ExecutionRole::Privileged => Err(SecretError::PrivilegeViolation(
                "only the sandbox may set the encoding key".into(),
            )),
            ExecutionRole::Sandbox => {
                let provisioned = !key.expose_secret().is_empty();
                *self.key.write().unwrap_or_else(PoisonError::into_inner) = key;
                tracing::info!(provisioned, "sandbox encoding key replaced");
                Ok(())
            }
        }
    }

    /// Pick the key for one encode/decode call.
    ///
    /// An explicit non-empty key wins. The untrusted role must always pass
    /// one because it cannot read the process key.
    ///
    /// # Errors
    ///
    /// - `SecretError::PrivilegeViolation`: untrusted role without a key
    /// - `SecretError::KeyNotProvisioned`: resolved key is empty
    pub fn resolve(&self, explicit: Option<&str>) -> Result<SecretString, SecretError> {
        let explicit = explicit.filter(|k| !k.is_empty());
        let key = match (self.role, explicit) {
            (_, Some(k)) => SecretString::from(k.to_owned()),
            (ExecutionRole::Untrusted, None) => {
                return Err(SecretError::PrivilegeViolation(
                    "pass the key fetched from the background process; the UI has no encoding key"
                        .into(),
                ))
            }
            (ExecutionRole::Privileged | ExecutionRole::Sandbox, None) => self.current(),
        };
        if key.expose_secret().is_empty() {
            return Err(SecretError::KeyNotProvisioned);
        }
        Ok(key)
    }

    fn current(&self) -> SecretString {
        let guard = self.key.read().unwrap_or_else(PoisonError::into_inner);
        SecretString::from(guard.expose_secret().to_owned())
    }
}

/// Returns `true` if `value` has the shape of a generated encoding key.
#[must_use]
pub fn is_encoding_key(value: &str) -> bool {
    value.starts_with(ENCODE_KEY_PREFIX)
}

fn generate_key() -> String {
    format!("{ENCODE_KEY_PREFIX}{}", Uuid::new_v4())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
