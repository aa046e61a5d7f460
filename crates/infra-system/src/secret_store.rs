// SecretStore adapters: in-memory and OS keyring
// reason: keyring for the platform credential store (Credential Manager,
// Keychain, Secret Service); secrecy keeps payloads out of Debug output

use async_trait::async_trait;
use gpoctl_core::domain::Credential;
use gpoctl_core::port::{validate_secret_name, SecretStore, SecretStoreError};
use secrecy::{ExposeSecret, SecretString};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Keyring service name used when none is configured
pub const DEFAULT_KEYRING_SERVICE: &str = "gpoctl";

/// Account holding the JSON list of stored names (names only, no secrets)
const INDEX_ACCOUNT: &str = ".gpoctl-index";

/// Process-local store, used by tests and one-shot sessions
#[derive(Default)]
pub struct MemorySecretStore {
    entries: Mutex<BTreeMap<String, Credential>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn put(&self, name: &str, credential: &Credential) -> Result<(), SecretStoreError> {
        validate_secret_name(name)?;
        self.entries
            .lock()
            .await
            .insert(name.to_string(), credential.clone());
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<Credential>, SecretStoreError> {
        validate_secret_name(name)?;
        Ok(self.entries.lock().await.get(name).cloned())
    }

    async fn delete(&self, name: &str) -> Result<bool, SecretStoreError> {
        validate_secret_name(name)?;
        Ok(self.entries.lock().await.remove(name).is_some())
    }

    async fn list(&self) -> Result<Vec<String>, SecretStoreError> {
        Ok(self.entries.lock().await.keys().cloned().collect())
    }
}

/// Blocking access to a platform credential store, keyed by service/account
pub trait KeyringBackend: Send + Sync + 'static {
    fn read(&self, service: &str, account: &str) -> Result<Option<SecretString>, SecretStoreError>;

    fn write(
        &self,
        service: &str,
        account: &str,
        secret: &SecretString,
    ) -> Result<(), SecretStoreError>;

    /// Returns `true` if an entry existed
    fn remove(&self, service: &str, account: &str) -> Result<bool, SecretStoreError>;
}

/// The operating system's credential store via `keyring`
#[derive(Debug, Default, Clone, Copy)]
pub struct OsKeyring;

impl OsKeyring {
    fn entry(service: &str, account: &str) -> Result<keyring::Entry, SecretStoreError> {
        keyring::Entry::new(service, account).map_err(backend_error)
    }
}

fn backend_error(error: keyring::Error) -> SecretStoreError {
    SecretStoreError::Backend(error.to_string())
}

impl KeyringBackend for OsKeyring {
    fn read(&self, service: &str, account: &str) -> Result<Option<SecretString>, SecretStoreError> {
        match Self::entry(service, account)?.get_password() {
            Ok(secret) => Ok(Some(SecretString::from(secret))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(backend_error(e)),
        }
    }

    fn write(
        &self,
        service: &str,
        account: &str,
        secret: &SecretString,
    ) -> Result<(), SecretStoreError> {
        Self::entry(service, account)?
            .set_password(secret.expose_secret())
            .map_err(backend_error)
    }

    fn remove(&self, service: &str, account: &str) -> Result<bool, SecretStoreError> {
        match Self::entry(service, account)?.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(backend_error(e)),
        }
    }
}

/// Credentials kept in the platform keyring, one entry per name
///
/// Each entry holds the credential as JSON. A separate index entry lists the
/// stored names so `list` works on backends that cannot enumerate. Keyring
/// calls run on the blocking pool; writers are serialized by `lock`.
pub struct KeyringSecretStore<B: KeyringBackend = OsKeyring> {
    service: String,
    backend: Arc<B>,
    lock: Mutex<()>,
}

impl KeyringSecretStore<OsKeyring> {
    pub fn new(service: impl Into<String>) -> Self {
        Self::with_backend(service, OsKeyring)
    }
}

impl<B: KeyringBackend> KeyringSecretStore<B> {
    pub fn with_backend(service: impl Into<String>, backend: B) -> Self {
        Self {
            service: service.into(),
            backend: Arc::new(backend),
            lock: Mutex::new(()),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, SecretStoreError>
    where
        T: Send + 'static,
        F: FnOnce(&B, &str) -> Result<T, SecretStoreError> + Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        let service = self.service.clone();
        tokio::task::spawn_blocking(move || op(&backend, &service))
            .await
            .map_err(|e| SecretStoreError::Backend(format!("keyring task failed: {}", e)))?
    }
}

fn validate_entry_name(name: &str) -> Result<(), SecretStoreError> {
    validate_secret_name(name)?;
    if name == INDEX_ACCOUNT {
        return Err(SecretStoreError::InvalidName(format!("{:?} is reserved", name)));
    }
    Ok(())
}

fn read_index<B: KeyringBackend>(
    backend: &B,
    service: &str,
) -> Result<BTreeSet<String>, SecretStoreError> {
    match backend.read(service, INDEX_ACCOUNT)? {
        Some(secret) => serde_json::from_str(secret.expose_secret())
            .map_err(|e| SecretStoreError::Corrupt(format!("name index: {}", e))),
        None => Ok(BTreeSet::new()),
    }
}

fn write_index<B: KeyringBackend>(
    backend: &B,
    service: &str,
    names: &BTreeSet<String>,
) -> Result<(), SecretStoreError> {
    if names.is_empty() {
        backend.remove(service, INDEX_ACCOUNT)?;
        return Ok(());
    }
    let json =
        serde_json::to_string(names).map_err(|e| SecretStoreError::Corrupt(e.to_string()))?;
    backend.write(service, INDEX_ACCOUNT, &SecretString::from(json))
}

#[async_trait]
impl<B: KeyringBackend> SecretStore for KeyringSecretStore<B> {
    async fn put(&self, name: &str, credential: &Credential) -> Result<(), SecretStoreError> {
        validate_entry_name(name)?;
        let payload = SecretString::from(
            serde_json::to_string(credential)
                .map_err(|e| SecretStoreError::Corrupt(e.to_string()))?,
        );

        let _guard = self.lock.lock().await;
        let account = name.to_string();
        self.blocking(move |backend, service| {
            backend.write(service, &account, &payload)?;
            let mut names = read_index(backend, service)?;
            if names.insert(account) {
                write_index(backend, service, &names)?;
            }
            Ok(())
        })
        .await?;

        info!(name = %name, username = %credential.username, service = %self.service, "Credential stored");
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<Credential>, SecretStoreError> {
        validate_entry_name(name)?;
        let account = name.to_string();
        let secret = self
            .blocking(move |backend, service| backend.read(service, &account))
            .await?;

        debug!(name = %name, found = secret.is_some(), "Credential lookup");
        secret
            .map(|secret| {
                serde_json::from_str(secret.expose_secret())
                    .map_err(|e| SecretStoreError::Corrupt(format!("entry {:?}: {}", name, e)))
            })
            .transpose()
    }

    async fn delete(&self, name: &str) -> Result<bool, SecretStoreError> {
        validate_entry_name(name)?;
        let _guard = self.lock.lock().await;
        let account = name.to_string();
        let removed = self
            .blocking(move |backend, service| {
                let removed = backend.remove(service, &account)?;
                let mut names = read_index(backend, service)?;
                if names.remove(&account) {
                    write_index(backend, service, &names)?;
                }
                Ok(removed)
            })
            .await?;

        if removed {
            info!(name = %name, service = %self.service, "Credential removed");
        }
        Ok(removed)
    }

    async fn list(&self) -> Result<Vec<String>, SecretStoreError> {
        let names = self.blocking(|backend, service| read_index(backend, service)).await?;
        Ok(names.into_iter().collect())
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;

    /// Keyring stand-in holding entries in process memory
    #[derive(Default)]
    pub struct InMemoryKeyring {
        entries: std::sync::Mutex<HashMap<(String, String), String>>,
        locked: std::sync::Mutex<Option<String>>,
    }

    impl InMemoryKeyring {
        pub fn new() -> Self {
            Self::default()
        }

        /// Fail every call with `SecretStoreError::Backend`, like a locked keyring
        pub fn set_locked(&self, message: impl Into<String>) {
            *self.locked.lock().unwrap() = Some(message.into());
        }

        /// Raw stored text for `service`/`account`
        pub fn raw(&self, service: &str, account: &str) -> Option<String> {
            self.entries
                .lock()
                .unwrap()
                .get(&(service.to_string(), account.to_string()))
                .cloned()
        }

        /// Overwrite an entry with arbitrary text
        pub fn insert_raw(&self, service: &str, account: &str, text: &str) {
            self.entries
                .lock()
                .unwrap()
                .insert((service.to_string(), account.to_string()), text.to_string());
        }

        fn check_unlocked(&self) -> Result<(), SecretStoreError> {
            match self.locked.lock().unwrap().as_ref() {
                Some(message) => Err(SecretStoreError::Backend(message.clone())),
                None => Ok(()),
            }
        }
    }

    impl KeyringBackend for InMemoryKeyring {
        fn read(
            &self,
            service: &str,
            account: &str,
        ) -> Result<Option<SecretString>, SecretStoreError> {
            self.check_unlocked()?;
            Ok(self.raw(service, account).map(SecretString::from))
        }

        fn write(
            &self,
            service: &str,
            account: &str,
            secret: &SecretString,
        ) -> Result<(), SecretStoreError> {
            self.check_unlocked()?;
            self.insert_raw(service, account, secret.expose_secret());
            Ok(())
        }

        fn remove(&self, service: &str, account: &str) -> Result<bool, SecretStoreError> {
            self.check_unlocked()?;
            Ok(self
                .entries
                .lock()
                .unwrap()
                .remove(&(service.to_string(), account.to_string()))
                .is_some())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::InMemoryKeyring;
    use super::*;

    const SERVICE: &str = "gpoctl-test";

    fn keyring_store() -> KeyringSecretStore<InMemoryKeyring> {
        KeyringSecretStore::with_backend(SERVICE, InMemoryKeyring::new())
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemorySecretStore::new();
        store
            .put("dc01", &Credential::new("CORP\\admin", "pw"))
            .await
            .unwrap();

        let cred = store.get("dc01").await.unwrap().unwrap();
        assert_eq!(cred.username, "CORP\\admin");
        assert!(store.get("dc02").await.unwrap().is_none());

        assert!(store.delete("dc01").await.unwrap());
        assert!(!store.delete("dc01").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_store_rejects_blank_name() {
        let store = MemorySecretStore::new();
        let result = store.put(" ", &Credential::new("u", "p")).await;
        assert!(matches!(result, Err(SecretStoreError::InvalidName(_))));
    }

    #[tokio::test]
    async fn test_keyring_store_roundtrip_and_index() {
        let store = keyring_store();
        store.put("b-host", &Credential::new("u2", "p2")).await.unwrap();
        store.put("a-host", &Credential::new("u1", "p1")).await.unwrap();
        store.put("a-host", &Credential::new("u1", "p1b")).await.unwrap();

        assert_eq!(store.list().await.unwrap(), vec!["a-host", "b-host"]);
        assert_eq!(
            store.get("a-host").await.unwrap(),
            Some(Credential::new("u1", "p1b"))
        );

        assert!(store.delete("b-host").await.unwrap());
        assert!(!store.delete("b-host").await.unwrap());
        assert_eq!(store.list().await.unwrap(), vec!["a-host"]);
    }

    #[tokio::test]
    async fn test_keyring_entries_per_name_index_without_secrets() {
        let store = keyring_store();
        store
            .put("dc01", &Credential::new("CORP\\admin", "hunter2"))
            .await
            .unwrap();

        let entry = store.backend().raw(SERVICE, "dc01").unwrap();
        let parsed: Credential = serde_json::from_str(&entry).unwrap();
        assert_eq!(parsed.password, "hunter2");

        let index = store.backend().raw(SERVICE, INDEX_ACCOUNT).unwrap();
        assert_eq!(index, r#"["dc01"]"#);
        assert!(!index.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_keyring_index_removed_when_empty() {
        let store = keyring_store();
        store.put("dc01", &Credential::new("u", "p")).await.unwrap();
        store.delete("dc01").await.unwrap();

        assert!(store.backend().raw(SERVICE, INDEX_ACCOUNT).is_none());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_keyring_reserved_name_rejected() {
        let store = keyring_store();
        let result = store.put(INDEX_ACCOUNT, &Credential::new("u", "p")).await;
        assert!(matches!(result, Err(SecretStoreError::InvalidName(_))));
    }

    #[tokio::test]
    async fn test_keyring_corrupt_entry() {
        let store = keyring_store();
        store.backend().insert_raw(SERVICE, "dc01", "{not json");

        assert!(matches!(
            store.get("dc01").await,
            Err(SecretStoreError::Corrupt(_))
        ));
    }

    #[tokio::test]
    async fn test_keyring_backend_failure_surfaces() {
        let store = keyring_store();
        store.backend().set_locked("keyring is locked");

        let result = store.put("dc01", &Credential::new("u", "p")).await;
        assert!(matches!(result, Err(SecretStoreError::Backend(ref m)) if m == "keyring is locked"));
        assert!(matches!(store.list().await, Err(SecretStoreError::Backend(_))));
    }
}
