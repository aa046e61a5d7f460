// Directory Query Port (Interface)
// Implemented by the directory collaborator (PowerShell GroupPolicy module in production)

use crate::domain::RawPolicyRecord;
use async_trait::async_trait;
use thiserror::Error;

/// Directory query errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// No GPO matches the requested name
    #[error("GPO not found: {0}")]
    IdentityNotFound(String),

    /// The directory could not be reached at all
    #[error("Directory unavailable: {0}")]
    Unavailable(String),

    #[error("Directory query failed: {0}")]
    Failed(String),
}

/// Directory query trait
///
/// Implementations:
/// - PowerShellDirectory: runs Get-GPO on the local machine
/// - mocks::InMemoryDirectory: fixed record set for tests
#[async_trait]
pub trait DirectoryQueryPort: Send + Sync {
    /// Fetch every policy record in `domain` (or the caller's domain)
    ///
    /// Zero results is `Ok(vec![])`, never an error.
    ///
    /// # Errors
    /// - DirectoryError::Unavailable if the directory cannot be reached
    async fn query_all(&self, domain: Option<&str>)
        -> Result<Vec<RawPolicyRecord>, DirectoryError>;

    /// Fetch the policy records whose display name is exactly `name`
    ///
    /// # Errors
    /// - DirectoryError::IdentityNotFound if nothing matches
    /// - DirectoryError::Failed / Unavailable on other faults
    async fn query_by_exact_name(
        &self,
        name: &str,
        domain: Option<&str>,
    ) -> Result<Vec<RawPolicyRecord>, DirectoryError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory directory with a fixed record set
    ///
    /// Name lookups are case-insensitive, like the directory itself.
    #[derive(Default)]
    pub struct InMemoryDirectory {
        records: Vec<RawPolicyRecord>,
        failures: Mutex<HashMap<String, DirectoryError>>,
        unavailable: Mutex<Option<String>>,
        query_all_calls: AtomicUsize,
        exact_calls: AtomicUsize,
    }

    impl InMemoryDirectory {
        pub fn new(records: Vec<RawPolicyRecord>) -> Self {
            Self {
                records,
                ..Default::default()
            }
        }

        /// Directory holding one well-formed record per name, ids derived
        /// deterministically from the position
        pub fn with_names(domain: &str, names: &[&str]) -> Self {
            let records = names
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    raw_record(name, &format!("00000000-0000-0000-0000-{:012}", i + 1), domain)
                })
                .collect();
            Self::new(records)
        }

        /// Make the exact-name lookup for `name` fail with `error`
        pub fn fail_on(&self, name: &str, error: DirectoryError) {
            self.failures
                .lock()
                .unwrap()
                .insert(name.to_lowercase(), error);
        }

        /// Make every query fail with DirectoryError::Unavailable
        pub fn set_unavailable(&self, message: impl Into<String>) {
            *self.unavailable.lock().unwrap() = Some(message.into());
        }

        pub fn query_all_calls(&self) -> usize {
            self.query_all_calls.load(Ordering::SeqCst)
        }

        pub fn exact_calls(&self) -> usize {
            self.exact_calls.load(Ordering::SeqCst)
        }

        fn check_available(&self) -> Result<(), DirectoryError> {
            match self.unavailable.lock().unwrap().as_ref() {
                Some(message) => Err(DirectoryError::Unavailable(message.clone())),
                None => Ok(()),
            }
        }

        fn in_domain<'a>(
            &'a self,
            domain: Option<&'a str>,
        ) -> impl Iterator<Item = &'a RawPolicyRecord> {
            self.records.iter().filter(move |r| match domain {
                Some(d) => r
                    .domain_name
                    .as_deref()
                    .map_or(true, |rd| rd.eq_ignore_ascii_case(d)),
                None => true,
            })
        }
    }

    #[async_trait]
    impl DirectoryQueryPort for InMemoryDirectory {
        async fn query_all(
            &self,
            domain: Option<&str>,
        ) -> Result<Vec<RawPolicyRecord>, DirectoryError> {
            self.query_all_calls.fetch_add(1, Ordering::SeqCst);
            self.check_available()?;
            Ok(self.in_domain(domain).cloned().collect())
        }

        async fn query_by_exact_name(
            &self,
            name: &str,
            domain: Option<&str>,
        ) -> Result<Vec<RawPolicyRecord>, DirectoryError> {
            self.exact_calls.fetch_add(1, Ordering::SeqCst);
            self.check_available()?;

            if let Some(error) = self.failures.lock().unwrap().get(&name.to_lowercase()) {
                return Err(error.clone());
            }

            let matches: Vec<RawPolicyRecord> = self
                .in_domain(domain)
                .filter(|r| {
                    r.display_name
                        .as_deref()
                        .is_some_and(|n| n.to_lowercase() == name.to_lowercase())
                })
                .cloned()
                .collect();

            if matches.is_empty() {
                return Err(DirectoryError::IdentityNotFound(name.to_string()));
            }
            Ok(matches)
        }
    }

    /// Well-formed raw record for fixtures
    pub fn raw_record(name: &str, id: &str, domain: &str) -> RawPolicyRecord {
        RawPolicyRecord {
            display_name: Some(name.to_string()),
            id: Some(id.to_string()),
            domain_name: Some(domain.to_string()),
            creation_time: Some("2024-01-01T00:00:00Z".to_string()),
            modification_time: Some("2024-06-01T00:00:00Z".to_string()),
            owner: Some("CORP\\Domain Admins".to_string()),
            description: None,
            gpo_status: Some("AllSettingsEnabled".to_string()),
        }
    }
}
