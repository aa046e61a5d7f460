//! Loopback remote executor shared by the remote retrieval tests

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use gpoctl_core::domain::{glob_matches, FlatPolicyRecord, RawPolicyRecord, SelectorPlan};
use gpoctl_core::port::directory_query::mocks::InMemoryDirectory;
use gpoctl_core::port::{
    DirectoryError, DirectoryQueryPort, RemoteError, RemoteExecutionPort, RemoteQueryRequest,
    RemoteQueryResponse, RemoteSelectorError, RemoteSelectorErrorKind, RemoteTarget,
};

/// Remote executor that runs the selector plan against an in-memory
/// directory the way the remote script does
///
/// Records are shipped in flat form without validation and deduplicated by
/// their id text, so malformed records reach the caller untouched.
pub struct LoopbackRemote {
    directory: Arc<InMemoryDirectory>,
    fault: Mutex<Option<RemoteError>>,
    requests: Mutex<Vec<RemoteQueryRequest>>,
    calls: AtomicUsize,
}

impl LoopbackRemote {
    pub fn new(directory: Arc<InMemoryDirectory>) -> Self {
        Self {
            directory,
            fault: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail every call with `error`
    pub fn set_fault(&self, error: RemoteError) {
        *self.fault.lock().unwrap() = Some(error);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RemoteQueryRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[derive(Default)]
struct Shipment {
    seen: HashSet<String>,
    records: Vec<FlatPolicyRecord>,
    errors: Vec<RemoteSelectorError>,
}

impl Shipment {
    fn add(&mut self, raw: &RawPolicyRecord) {
        if self.seen.insert(raw.id.clone().unwrap_or_default()) {
            self.records.push(FlatPolicyRecord::from_raw(raw));
        }
    }

    fn fail(&mut self, selector: &str, error: DirectoryError) {
        let kind = match error {
            DirectoryError::IdentityNotFound(_) => RemoteSelectorErrorKind::NotFound,
            _ => RemoteSelectorErrorKind::Failed,
        };
        self.errors.push(RemoteSelectorError {
            selector: selector.to_string(),
            kind,
            message: error.to_string(),
        });
    }
}

#[async_trait]
impl RemoteExecutionPort for LoopbackRemote {
    async fn execute(
        &self,
        _target: &RemoteTarget,
        request: &RemoteQueryRequest,
    ) -> Result<RemoteQueryResponse, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        if let Some(fault) = self.fault.lock().unwrap().clone() {
            return Err(fault);
        }

        let domain = request.domain.as_deref();
        let mut shipment = Shipment::default();
        match &request.plan {
            SelectorPlan::All => match self.directory.query_all(domain).await {
                Ok(raws) => raws.iter().for_each(|raw| shipment.add(raw)),
                Err(e) => shipment.fail("*", e),
            },
            SelectorPlan::Exact(names) => {
                for name in names {
                    match self.directory.query_by_exact_name(name, domain).await {
                        Ok(raws) => raws.iter().for_each(|raw| shipment.add(raw)),
                        Err(e) => shipment.fail(name, e),
                    }
                }
            }
            SelectorPlan::Wildcard(patterns) => match self.directory.query_all(domain).await {
                Ok(raws) => {
                    for pattern in patterns {
                        raws.iter()
                            .filter(|raw| {
                                glob_matches(pattern, raw.display_name.as_deref().unwrap_or_default())
                            })
                            .for_each(|raw| shipment.add(raw));
                    }
                }
                Err(e) => {
                    for pattern in patterns {
                        shipment.fail(pattern, e.clone());
                    }
                }
            },
        }

        Ok(RemoteQueryResponse {
            records: shipment.records,
            errors: shipment.errors,
        })
    }
}
