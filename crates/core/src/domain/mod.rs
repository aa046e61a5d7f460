// Domain Layer - Pure business logic and entities

pub mod credential;
pub mod error;
pub mod link_set;
pub mod policy;
pub mod report;
pub mod selector;
pub mod upstream;

// Re-exports
pub use credential::Credential;
pub use error::DomainError;
pub use link_set::LinkSet;
pub use policy::{PolicyRecord, PolicyRecordView};
pub use report::PolicyReport;
pub use selector::{glob_matches, is_wildcard, SelectorPlan};
pub use upstream::{FlatPolicyRecord, RawPolicyRecord, GPO_STATUS_DISABLED};
