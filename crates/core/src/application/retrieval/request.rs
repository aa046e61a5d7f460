// Retrieval request/outcome types

use crate::domain::PolicyRecord;
use crate::port::RemoteTarget;
use std::fmt;
use thiserror::Error;

/// Where a retrieval runs
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Query the directory from this machine
    #[default]
    Local,
    /// Ship the query to a remote host in one round trip
    Remote(RemoteTarget),
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Local => write!(f, "local"),
            ExecutionMode::Remote(target) => write!(f, "remote:{}", target.host),
        }
    }
}

/// Retrieval request
#[derive(Debug, Clone, Default)]
pub struct RetrievalRequest {
    /// Display names, possibly containing `*` / `?` globs. Empty means all.
    pub selectors: Vec<String>,
    pub domain: Option<String>,
    pub mode: ExecutionMode,
}

impl RetrievalRequest {
    pub fn local<S: Into<String>>(selectors: impl IntoIterator<Item = S>) -> Self {
        Self {
            selectors: selectors.into_iter().map(Into::into).collect(),
            domain: None,
            mode: ExecutionMode::Local,
        }
    }

    pub fn remote<S: Into<String>>(
        target: RemoteTarget,
        selectors: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            selectors: selectors.into_iter().map(Into::into).collect(),
            domain: None,
            mode: ExecutionMode::Remote(target),
        }
    }

    pub fn in_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }
}

/// Non-fatal, per-item retrieval failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetrievalError {
    #[error("GPO not found: {selector}")]
    IdentityNotFound { selector: String },

    #[error("Failed to retrieve GPO '{selector}': {message}")]
    QueryFailed { selector: String, message: String },

    #[error("Failed to create GPO object: {message}")]
    RecordConstruction { message: String },
}

impl RetrievalError {
    /// Selector the failure belongs to; `None` for per-record failures
    pub fn selector(&self) -> Option<&str> {
        match self {
            RetrievalError::IdentityNotFound { selector }
            | RetrievalError::QueryFailed { selector, .. } => Some(selector),
            RetrievalError::RecordConstruction { .. } => None,
        }
    }
}

/// Records found plus the per-item errors accumulated along the way
#[derive(Debug, Clone, Default)]
pub struct RetrievalOutcome {
    pub records: Vec<PolicyRecord>,
    pub errors: Vec<RetrievalError>,
}

impl RetrievalOutcome {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
