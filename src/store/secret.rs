//! Password storage.
//!
//! Passwords never touch the profile file. They live in the OS keychain under
//! a configurable service name, keyed by profile and username.

use crate::error::{DbError, DbResult};
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

/// Composite key of a stored password.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretKey {
    pub profile: String,
    pub username: Option<String>,
}

impl SecretKey {
    pub fn new(profile: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
            username: Some(username.into()),
        }
    }

    /// Key for a profile whose username is unknown.
    pub fn profile_only(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
            username: None,
        }
    }
}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.username {
            Some(username) => write!(f, "{}:{}", self.profile, username),
            None => f.write_str(&self.profile),
        }
    }
}

/// Store / retrieve / delete a password. Calls block.
pub trait SecretStore: Send + Sync {
    fn get(&self, key: &SecretKey) -> DbResult<Option<String>>;

    fn set(&self, key: &SecretKey, password: &str) -> DbResult<()>;

    /// Returns `false` when there was nothing to delete.
    fn delete(&self, key: &SecretKey) -> DbResult<bool>;
}

/// Secret store backed by the platform keychain via `keyring`.
#[derive(Debug, Clone)]
pub struct KeyringSecretStore {
    service: String,
}

impl KeyringSecretStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(&self, key: &SecretKey) -> DbResult<keyring::Entry> {
        keyring::Entry::new(&self.service, &key.to_string()).map_err(keyring_error)
    }
}

impl SecretStore for KeyringSecretStore {
    fn get(&self, key: &SecretKey) -> DbResult<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(password) => Ok(Some(password)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(keyring_error(e)),
        }
    }

    fn set(&self, key: &SecretKey, password: &str) -> DbResult<()> {
        self.entry(key)?
            .set_password(password)
            .map_err(keyring_error)
    }

    fn delete(&self, key: &SecretKey) -> DbResult<bool> {
        match self.entry(key)?.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(keyring_error(e)),
        }
    }
}

fn keyring_error(err: keyring::Error) -> DbError {
    DbError::secret_store(err.to_string())
}

/// Process-local secret store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SecretStore for MemorySecretStore {
    fn get(&self, key: &SecretKey) -> DbResult<Option<String>> {
        Ok(self.lock().get(&key.to_string()).cloned())
    }

    fn set(&self, key: &SecretKey, password: &str) -> DbResult<()> {
        self.lock().insert(key.to_string(), password.to_string());
        Ok(())
    }

    fn delete(&self, key: &SecretKey) -> DbResult<bool> {
        Ok(self.lock().remove(&key.to_string()).is_some())
    }
}
