// Credential passed through to the remote-execution collaborator

use serde::{Deserialize, Serialize};
use std::fmt;

/// Username/password pair for a remote host
///
/// `Debug` redacts the password so credentials never reach the logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password() {
        let cred = Credential::new("CORP\\svc-gpo", "hunter2");
        let debug = format!("{:?}", cred);
        assert!(debug.contains("svc-gpo"));
        assert!(!debug.contains("hunter2"));
    }
}
