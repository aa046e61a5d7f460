// PowerShell remoting-backed RemoteExecutionPort (Invoke-Command)

use async_trait::async_trait;
use gpoctl_core::domain::Credential;
use gpoctl_core::port::{
    RemoteError, RemoteExecutionPort, RemoteQueryRequest, RemoteQueryResponse, RemoteTarget,
};
use serde::Serialize;
use tracing::{error, info};

use crate::powershell::{RunError, ScriptRunner};
use crate::scripts;

/// Stdin payload for the remoting script. Carries the credential, so it is
/// never logged and never placed on the command line.
#[derive(Serialize)]
struct RemoteInvocation<'a> {
    host: &'a str,
    credential: Option<&'a Credential>,
    query: &'a RemoteQueryRequest,
}

/// Runs the selector plan on a remote host through WinRM
pub struct PowerShellRemoting {
    runner: ScriptRunner,
}

impl PowerShellRemoting {
    pub fn new(runner: ScriptRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl RemoteExecutionPort for PowerShellRemoting {
    async fn execute(
        &self,
        target: &RemoteTarget,
        request: &RemoteQueryRequest,
    ) -> Result<RemoteQueryResponse, RemoteError> {
        let invocation = RemoteInvocation {
            host: &target.host,
            credential: target.credential.as_ref(),
            query: request,
        };

        let response: RemoteQueryResponse = self
            .runner
            .run(scripts::REMOTE_QUERY, &invocation)
            .await
            .map_err(|e| {
                let err = map_run_error(&target.host, e);
                error!(host = %target.host, error = %err, "Remote invocation failed");
                err
            })?;

        info!(
            host = %target.host,
            records = response.records.len(),
            errors = response.errors.len(),
            "Remote invocation returned"
        );
        Ok(response)
    }
}

fn map_run_error(host: &str, error: RunError) -> RemoteError {
    let host = host.to_string();
    match error {
        RunError::Fault(fault) => match fault.kind.as_str() {
            "transport" => RemoteError::TransportUnreachable {
                host,
                message: fault.message,
            },
            "access_denied" => RemoteError::AccessDenied {
                host,
                message: fault.message,
            },
            _ => RemoteError::Failed {
                host,
                message: fault.message,
            },
        },
        RunError::Timeout(_) => RemoteError::TransportUnreachable {
            host,
            message: error.to_string(),
        },
        other => RemoteError::Failed {
            host,
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::powershell::ScriptFault;
    use gpoctl_core::domain::SelectorPlan;

    fn fault(kind: &str) -> RunError {
        RunError::Fault(ScriptFault {
            kind: kind.to_string(),
            message: "WinRM said no".to_string(),
        })
    }

    #[test]
    fn test_error_mapping() {
        assert!(matches!(
            map_run_error("dc01", fault("transport")),
            RemoteError::TransportUnreachable { .. }
        ));
        assert!(matches!(
            map_run_error("dc01", fault("access_denied")),
            RemoteError::AccessDenied { .. }
        ));
        assert!(matches!(
            map_run_error("dc01", fault("failed")),
            RemoteError::Failed { .. }
        ));
        assert!(matches!(
            map_run_error("dc01", RunError::Timeout(60)),
            RemoteError::TransportUnreachable { .. }
        ));
        assert_eq!(map_run_error("dc01", fault("odd")).host(), "dc01");
    }

    #[test]
    fn test_invocation_payload_shape() {
        let credential = Credential::new("CORP\\admin", "pw");
        let query = RemoteQueryRequest {
            plan: SelectorPlan::All,
            domain: None,
        };
        let invocation = RemoteInvocation {
            host: "dc01",
            credential: Some(&credential),
            query: &query,
        };

        let json = serde_json::to_value(&invocation).unwrap();
        assert_eq!(json["host"], "dc01");
        assert_eq!(json["credential"]["username"], "CORP\\admin");
        assert_eq!(json["query"]["plan"]["kind"], "all");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_decodes_response() {
        use std::time::Duration;

        let runner = ScriptRunner::custom(
            "sh",
            vec![
                "-c".to_string(),
                r#"cat >/dev/null; echo '{"result":{"records":[{"displayName":"PROD-A","id":"00000000-0000-0000-0000-00000000000a"}],"errors":[{"selector":"X","kind":"not_found","message":"GPO not found: X"}]}}'"#.to_string(),
            ],
            Duration::from_secs(5),
        );
        let remoting = PowerShellRemoting::new(runner);
        let request = RemoteQueryRequest {
            plan: SelectorPlan::Exact(vec!["PROD-A".into(), "X".into()]),
            domain: None,
        };

        let response = remoting
            .execute(&RemoteTarget::new("dc01"), &request)
            .await
            .unwrap();

        assert_eq!(response.records.len(), 1);
        assert_eq!(response.errors[0].selector, "X");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_surfaces_transport_fault() {
        use std::time::Duration;

        let runner = ScriptRunner::custom(
            "sh",
            vec![
                "-c".to_string(),
                r#"cat >/dev/null; echo '{"error":{"kind":"transport","message":"WinRM cannot complete the operation"}}'"#.to_string(),
            ],
            Duration::from_secs(5),
        );
        let remoting = PowerShellRemoting::new(runner);
        let request = RemoteQueryRequest {
            plan: SelectorPlan::All,
            domain: None,
        };

        let result = remoting.execute(&RemoteTarget::new("dc99"), &request).await;
        assert!(matches!(
            result,
            Err(RemoteError::TransportUnreachable { ref host, .. }) if host == "dc99"
        ));
    }
}
