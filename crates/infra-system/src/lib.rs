// gpoctl Infrastructure - System Adapters
// Implements: DirectoryQueryPort, RemoteExecutionPort, SecretStore

pub mod directory;
pub mod powershell;
pub mod remoting;
pub mod scripts;
pub mod secret_store;

pub use directory::PowerShellDirectory;
pub use powershell::{RunError, ScriptFault, ScriptRunner, DEFAULT_TIMEOUT_SECS};
pub use remoting::PowerShellRemoting;
pub use secret_store::{
    KeyringBackend, KeyringSecretStore, MemorySecretStore, OsKeyring, DEFAULT_KEYRING_SERVICE,
};
