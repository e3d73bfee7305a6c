use ::keyring::Entry;
use tracing::debug;

use super::{KeyValueStore, StoreError, StoreResult};

/// Keychain service name used when none is given
pub const DEFAULT_SERVICE_NAME: &str = "chirp";

/// Stores each key as a separate OS keychain entry.
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self::with_service(DEFAULT_SERVICE_NAME)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> StoreResult<Entry> {
        Ok(Entry::new(&self.service, key)?)
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for KeyringStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(::keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes the entry, then reads it back through a fresh handle.
    /// A keychain that only keeps values per handle (keyring's mock
    /// backend on unsupported platforms) is reported as `NotPersisted`.
    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entry(key)?.set_password(value)?;
        match self.get(key)? {
            Some(stored) if stored == value => {
                debug!(service = %self.service, key, "Stored keychain entry");
                Ok(())
            }
            _ => Err(StoreError::NotPersisted(format!(
                "keychain service '{}' did not keep '{}'",
                self.service, key
            ))),
        }
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(::keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
