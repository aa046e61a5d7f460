// GPO Retrieval Service
// classify -> dispatch (local|remote) -> normalize -> dedup -> return

pub mod request;

pub use request::{ExecutionMode, RetrievalError, RetrievalOutcome, RetrievalRequest};

use crate::domain::{glob_matches, FlatPolicyRecord, PolicyRecord, RawPolicyRecord, SelectorPlan};
use crate::error::{AppError, Result};
use crate::port::{
    DirectoryError, DirectoryQueryPort, RemoteExecutionPort, RemoteQueryRequest,
    RemoteSelectorErrorKind, RemoteTarget,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Selector reported when an "all records" query fails
const ALL_SELECTOR: &str = "*";

/// Resolves selectors into PolicyRecords, locally or on a remote host
///
/// Stateless: every call owns its own working collections. Selectors are
/// processed sequentially in caller order.
pub struct RetrievalEngine {
    directory: Arc<dyn DirectoryQueryPort>,
    remote: Option<Arc<dyn RemoteExecutionPort>>,
}

impl RetrievalEngine {
    pub fn new(
        directory: Arc<dyn DirectoryQueryPort>,
        remote: Arc<dyn RemoteExecutionPort>,
    ) -> Self {
        Self {
            directory,
            remote: Some(remote),
        }
    }

    /// Engine without a remote executor; remote requests fail with
    /// `AppError::Config`
    pub fn local_only(directory: Arc<dyn DirectoryQueryPort>) -> Self {
        Self {
            directory,
            remote: None,
        }
    }

    /// Resolve `request` into a deduplicated, ordered record list
    ///
    /// Per-selector and per-record failures are collected in
    /// `RetrievalOutcome::errors` and never abort the batch.
    ///
    /// # Errors
    /// - AppError::Remote if the remote round trip itself fails
    ///   (unreachable host, access denied, generic remote fault)
    /// - AppError::Config if a remote request is made without a remote executor
    pub async fn retrieve(&self, request: RetrievalRequest) -> Result<RetrievalOutcome> {
        let plan = SelectorPlan::classify(&request.selectors);
        let domain = request.domain.as_deref();

        info!(
            mode = %request.mode,
            strategy = plan.kind(),
            selectors = plan.selectors().len(),
            domain = ?domain,
            "Retrieving GPOs"
        );

        let mut collector = Collector::default();
        match &request.mode {
            ExecutionMode::Local => self.retrieve_local(&plan, domain, &mut collector).await,
            ExecutionMode::Remote(target) => {
                self.retrieve_remote(target, plan, domain, &mut collector)
                    .await?
            }
        }

        let outcome = collector.finish();
        info!(
            records = outcome.records.len(),
            errors = outcome.errors.len(),
            "GPO retrieval completed"
        );
        Ok(outcome)
    }

    async fn retrieve_local(
        &self,
        plan: &SelectorPlan,
        domain: Option<&str>,
        collector: &mut Collector,
    ) {
        match plan {
            SelectorPlan::All => match self.directory.query_all(domain).await {
                Ok(raws) => raws.iter().for_each(|raw| collector.accept_raw(raw)),
                Err(e) => collector.report(query_error(ALL_SELECTOR, e)),
            },
            SelectorPlan::Exact(names) => {
                for name in names {
                    debug!(selector = %name, "Exact-name lookup");
                    match self.directory.query_by_exact_name(name, domain).await {
                        Ok(raws) => raws.iter().for_each(|raw| collector.accept_raw(raw)),
                        Err(e) => collector.report(query_error(name, e)),
                    }
                }
            }
            SelectorPlan::Wildcard(patterns) => {
                // One full fetch serves every pattern
                let raws = match self.directory.query_all(domain).await {
                    Ok(raws) => raws,
                    Err(e) => {
                        for pattern in patterns {
                            collector.report(query_error(pattern, e.clone()));
                        }
                        return;
                    }
                };

                // Identity is checked only for matched records; each
                // malformed record is reported once
                let mut malformed = HashSet::new();
                for pattern in patterns {
                    let mut matched = 0usize;
                    for (index, raw) in raws.iter().enumerate() {
                        let name = raw.display_name.as_deref().unwrap_or_default();
                        if !glob_matches(pattern, name) {
                            continue;
                        }
                        matched += 1;
                        match raw.identity() {
                            Ok(id) => collector.add(id, || PolicyRecord::from_raw(raw)),
                            Err(e) => {
                                if malformed.insert(index) {
                                    collector.report(RetrievalError::RecordConstruction {
                                        message: e.to_string(),
                                    });
                                }
                            }
                        }
                    }
                    debug!(pattern = %pattern, matched, "Wildcard pattern applied");
                }
            }
        }
    }

    async fn retrieve_remote(
        &self,
        target: &RemoteTarget,
        plan: SelectorPlan,
        domain: Option<&str>,
        collector: &mut Collector,
    ) -> Result<()> {
        let remote = self.remote.as_ref().ok_or_else(|| {
            AppError::Config(format!(
                "No remote executor configured for host '{}'",
                target.host
            ))
        })?;

        let request = RemoteQueryRequest {
            plan,
            domain: domain.map(str::to_string),
        };

        info!(
            host = %target.host,
            authenticated = target.credential.is_some(),
            "Executing remote GPO query"
        );

        let response = remote.execute(target, &request).await.map_err(|e| {
            error!(host = %target.host, error = %e, "Remote GPO query failed");
            e
        })?;

        for flat in &response.records {
            collector.accept_flat(flat);
        }
        for remote_error in response.errors {
            collector.report(match remote_error.kind {
                RemoteSelectorErrorKind::NotFound => RetrievalError::IdentityNotFound {
                    selector: remote_error.selector,
                },
                RemoteSelectorErrorKind::Failed => RetrievalError::QueryFailed {
                    selector: remote_error.selector,
                    message: remote_error.message,
                },
            });
        }

        Ok(())
    }
}

fn query_error(selector: &str, error: DirectoryError) -> RetrievalError {
    match error {
        DirectoryError::IdentityNotFound(_) => RetrievalError::IdentityNotFound {
            selector: selector.to_string(),
        },
        other => RetrievalError::QueryFailed {
            selector: selector.to_string(),
            message: other.to_string(),
        },
    }
}

/// Per-call accumulator: ordered records, id dedup set, error list
#[derive(Default)]
struct Collector {
    seen: HashSet<Uuid>,
    records: Vec<PolicyRecord>,
    errors: Vec<RetrievalError>,
}

impl Collector {
    fn accept_raw(&mut self, raw: &RawPolicyRecord) {
        match raw.identity() {
            Ok(id) => self.add(id, || PolicyRecord::from_raw(raw)),
            Err(e) => self.report(RetrievalError::RecordConstruction {
                message: e.to_string(),
            }),
        }
    }

    fn accept_flat(&mut self, flat: &FlatPolicyRecord) {
        match flat.identity() {
            Ok(id) => self.add(id, || PolicyRecord::from_flat(flat)),
            Err(e) => self.report(RetrievalError::RecordConstruction {
                message: e.to_string(),
            }),
        }
    }

    /// Add the record built by `build` unless `id` was already collected
    fn add(&mut self, id: Uuid, build: impl FnOnce() -> PolicyRecord) {
        if self.seen.insert(id) {
            self.records.push(build());
        }
    }

    fn report(&mut self, error: RetrievalError) {
        warn!(error = %error, "GPO retrieval item failed");
        self.errors.push(error);
    }

    fn finish(self) -> RetrievalOutcome {
        RetrievalOutcome {
            records: self.records,
            errors: self.errors,
        }
    }
}
