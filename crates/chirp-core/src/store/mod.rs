//! Pluggable key-value persistence for session state.
//!
//! The session manager never talks to disk or the keychain directly. It is
//! handed a `KeyValueStore` and reads/writes plain string keys through it:
//! - `MemoryStore`: process-local, nothing survives a restart
//! - `FileStore`: JSON file in the cache directory
//! - `KeyringStore`: OS keychain, one entry per key
//! - `EncryptedStore`: seals values of any other store with a passphrase

pub mod encrypted;
pub mod file;
pub mod keyring;
pub mod memory;

use thiserror::Error;

pub use self::encrypted::EncryptedStore;
pub use self::file::FileStore;
pub use self::keyring::KeyringStore;
pub use self::memory::MemoryStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt store contents: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keychain(#[from] ::keyring::Error),

    #[error("Encryption error: {0}")]
    Crypto(String),

    #[error("Value was not persisted: {0}")]
    NotPersisted(String),

    #[error("Store lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// String key-value persistence capability.
///
/// Removing a key that does not exist is not an error.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    fn remove(&self, key: &str) -> StoreResult<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        (**self).remove(key)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        (**self).remove(key)
    }
}
