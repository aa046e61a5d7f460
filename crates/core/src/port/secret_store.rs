// Secret Store Port (Interface)
// Named credentials for remote hosts

use crate::domain::Credential;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SecretStoreError {
    #[error("Invalid secret name: {0}")]
    InvalidName(String),

    /// The platform credential store rejected or failed the operation
    #[error("Secret store backend error: {0}")]
    Backend(String),

    #[error("Stored secret is corrupt: {0}")]
    Corrupt(String),
}

/// Pluggable secret provider
///
/// `get` returns the stored credential itself; implementations never fall
/// back to prompting.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Store `credential` under `name`, replacing any previous value
    async fn put(&self, name: &str, credential: &Credential) -> Result<(), SecretStoreError>;

    /// Stored credential for `name`, if any
    async fn get(&self, name: &str) -> Result<Option<Credential>, SecretStoreError>;

    /// Remove `name`. Returns `true` if something was removed.
    async fn delete(&self, name: &str) -> Result<bool, SecretStoreError>;

    /// Names of all stored credentials, sorted
    async fn list(&self) -> Result<Vec<String>, SecretStoreError>;
}

/// Validate a secret name (non-blank, no control characters)
pub fn validate_secret_name(name: &str) -> Result<(), SecretStoreError> {
    if name.trim().is_empty() || name.chars().any(char::is_control) {
        return Err(SecretStoreError::InvalidName(format!("{:?}", name)));
    }
    Ok(())
}
