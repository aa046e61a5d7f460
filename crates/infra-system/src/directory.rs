// PowerShell-backed DirectoryQueryPort (Get-GPO on this machine)

use async_trait::async_trait;
use gpoctl_core::domain::RawPolicyRecord;
use gpoctl_core::port::{DirectoryError, DirectoryQueryPort};
use serde::Serialize;
use tracing::{info, warn};

use crate::powershell::{RunError, ScriptRunner};
use crate::scripts;

#[derive(Serialize)]
struct LocalQuery<'a> {
    name: Option<&'a str>,
    domain: Option<&'a str>,
}

/// Queries the GroupPolicy module on the local machine
pub struct PowerShellDirectory {
    runner: ScriptRunner,
}

impl PowerShellDirectory {
    pub fn new(runner: ScriptRunner) -> Self {
        Self { runner }
    }

    async fn query(&self, query: LocalQuery<'_>) -> Result<Vec<RawPolicyRecord>, DirectoryError> {
        let records: Vec<RawPolicyRecord> = self
            .runner
            .run(scripts::LOCAL_QUERY, &query)
            .await
            .map_err(|e| {
                let err = map_run_error(query.name, e);
                warn!(name = ?query.name, domain = ?query.domain, error = %err, "Directory query failed");
                err
            })?;

        info!(
            name = ?query.name,
            domain = ?query.domain,
            count = records.len(),
            "Directory query returned"
        );
        Ok(records)
    }
}

#[async_trait]
impl DirectoryQueryPort for PowerShellDirectory {
    async fn query_all(&self, domain: Option<&str>) -> Result<Vec<RawPolicyRecord>, DirectoryError> {
        self.query(LocalQuery { name: None, domain }).await
    }

    async fn query_by_exact_name(
        &self,
        name: &str,
        domain: Option<&str>,
    ) -> Result<Vec<RawPolicyRecord>, DirectoryError> {
        let records = self
            .query(LocalQuery {
                name: Some(name),
                domain,
            })
            .await?;
        if records.is_empty() {
            return Err(DirectoryError::IdentityNotFound(name.to_string()));
        }
        Ok(records)
    }
}

fn map_run_error(name: Option<&str>, error: RunError) -> DirectoryError {
    match error {
        RunError::Fault(fault) => match fault.kind.as_str() {
            "not_found" => DirectoryError::IdentityNotFound(name.unwrap_or("*").to_string()),
            "unavailable" => DirectoryError::Unavailable(fault.message),
            _ => DirectoryError::Failed(fault.message),
        },
        RunError::Spawn(_) => DirectoryError::Unavailable(error.to_string()),
        other => DirectoryError::Failed(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::powershell::ScriptFault;

    fn fault(kind: &str) -> RunError {
        RunError::Fault(ScriptFault {
            kind: kind.to_string(),
            message: format!("{} happened", kind),
        })
    }

    #[test]
    fn test_error_mapping() {
        assert_eq!(
            map_run_error(Some("GPO-9"), fault("not_found")),
            DirectoryError::IdentityNotFound("GPO-9".to_string())
        );
        assert!(matches!(
            map_run_error(None, fault("unavailable")),
            DirectoryError::Unavailable(_)
        ));
        assert!(matches!(
            map_run_error(None, fault("failed")),
            DirectoryError::Failed(_)
        ));
        assert!(matches!(
            map_run_error(None, RunError::Spawn("not found".into())),
            DirectoryError::Unavailable(_)
        ));
        assert!(matches!(
            map_run_error(None, RunError::Timeout(30)),
            DirectoryError::Failed(_)
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_query_decodes_raw_records() {
        use std::time::Duration;

        // Stand-in interpreter: ignores the PowerShell script, emits a canned envelope
        let runner = ScriptRunner::custom(
            "sh",
            vec![
                "-c".to_string(),
                r#"cat >/dev/null; echo '{"result":[{"DisplayName":"GPO-1","Id":"00000000-0000-0000-0000-000000000001","GpoStatus":"AllSettingsDisabled"}]}'"#.to_string(),
            ],
            Duration::from_secs(5),
        );
        let directory = PowerShellDirectory::new(runner);

        let records = directory.query_by_exact_name("GPO-1", None).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].gpo_status.as_deref(), Some("AllSettingsDisabled"));
        assert!(records[0].owner.is_none());
    }
}
