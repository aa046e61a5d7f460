// Port Layer - Interfaces for external dependencies

pub mod directory_query;
pub mod remote_execution;
pub mod secret_store;

// Re-exports
pub use directory_query::{DirectoryError, DirectoryQueryPort};
pub use remote_execution::{
    RemoteError, RemoteExecutionPort, RemoteQueryRequest, RemoteQueryResponse,
    RemoteSelectorError, RemoteSelectorErrorKind, RemoteTarget,
};
pub use secret_store::{validate_secret_name, SecretStore, SecretStoreError};
