// Remote Execution Port (Interface)
// One round trip per retrieval: the whole selector plan goes out, flat records come back.

use crate::domain::{Credential, FlatPolicyRecord, SelectorPlan};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Host to query and the credential to query it with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    pub host: String,
    pub credential: Option<Credential>,
}

impl RemoteTarget {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            credential: None,
        }
    }

    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }
}

/// Request payload shipped to the remote host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteQueryRequest {
    pub plan: SelectorPlan,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

/// Kind of a per-selector failure reported by the remote side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteSelectorErrorKind {
    NotFound,
    Failed,
}

/// Per-selector failure reported by the remote side (non-fatal)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSelectorError {
    pub selector: String,
    pub kind: RemoteSelectorErrorKind,
    pub message: String,
}

/// Response payload returned by the remote host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteQueryResponse {
    #[serde(default)]
    pub records: Vec<FlatPolicyRecord>,
    #[serde(default)]
    pub errors: Vec<RemoteSelectorError>,
}

/// Remote round-trip errors. All of them are fatal for the invocation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Cannot reach remote host '{host}': {message}")]
    TransportUnreachable { host: String, message: String },

    #[error("Access denied on remote host '{host}': {message}")]
    AccessDenied { host: String, message: String },

    #[error("Remote query on '{host}' failed: {message}")]
    Failed { host: String, message: String },
}

impl RemoteError {
    pub fn host(&self) -> &str {
        match self {
            RemoteError::TransportUnreachable { host, .. }
            | RemoteError::AccessDenied { host, .. }
            | RemoteError::Failed { host, .. } => host,
        }
    }
}

/// Remote execution trait
///
/// Implementations:
/// - PowerShellRemoting: Invoke-Command against the target host
/// - MockRemoteExecutionPort (mockall): unit tests
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteExecutionPort: Send + Sync {
    /// Run `request` on `target.host` under `target.credential`
    ///
    /// # Errors
    /// - RemoteError::TransportUnreachable if the host cannot be contacted
    /// - RemoteError::AccessDenied on authorization failure
    /// - RemoteError::Failed otherwise
    async fn execute(
        &self,
        target: &RemoteTarget,
        request: &RemoteQueryRequest,
    ) -> Result<RemoteQueryResponse, RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_shape() {
        let request = RemoteQueryRequest {
            plan: SelectorPlan::Wildcard(vec!["PROD-*".to_string()]),
            domain: Some("corp.example.com".to_string()),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "plan": {"kind": "wildcard", "selectors": ["PROD-*"]},
                "domain": "corp.example.com"
            })
        );
    }

    #[test]
    fn test_response_tolerates_missing_errors() {
        let response: RemoteQueryResponse =
            serde_json::from_str(r#"{"records":[{"displayName":"A","id":null}]}"#).unwrap();
        assert_eq!(response.records.len(), 1);
        assert!(response.errors.is_empty());
    }

    #[test]
    fn test_remote_error_host() {
        let err = RemoteError::AccessDenied {
            host: "dc01".to_string(),
            message: "Access is denied".to_string(),
        };
        assert_eq!(err.host(), "dc01");
        assert!(err.to_string().contains("dc01"));
    }
}
