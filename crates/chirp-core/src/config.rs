//! Client configuration management.
//!
//! This module handles loading and saving the client configuration, which
//! includes the API base URL, where the session is persisted, the request
//! timeout and the last used login.
//!
//! Configuration is stored at `~/.config/chirp/config.json`. Environment
//! variables (`CHIRP_API_URL`, `CHIRP_STORAGE`, `CHIRP_TIMEOUT_SECS`) take
//! precedence over the file.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::store::{EncryptedStore, FileStore, KeyValueStore, KeyringStore, MemoryStore};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "chirp";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// File holding sealed values when `storage = "encrypted"`
const ENCRYPTED_SESSION_FILE: &str = "session.enc.json";

/// Default backend: the development server
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where the session token is persisted between runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    File,
    Keyring,
    Encrypted,
    Memory,
}

impl FromStr for StorageKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(StorageKind::File),
            "keyring" | "keychain" => Ok(StorageKind::Keyring),
            "encrypted" => Ok(StorageKind::Encrypted),
            "memory" => Ok(StorageKind::Memory),
            other => Err(anyhow::anyhow!("Unknown storage kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub storage: StorageKind,
    pub request_timeout_secs: u64,
    pub last_username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            storage: StorageKind::default(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            last_username: None,
        }
    }
}

impl Config {
    /// Load from the default location, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load from the default location only
    pub fn load_file() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// `load`). Invalid values are logged and ignored.
    pub fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = var("CHIRP_API_URL").filter(|u| !u.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        if let Some(storage) = var("CHIRP_STORAGE") {
            match storage.parse() {
                Ok(kind) => self.storage = kind,
                Err(e) => warn!(error = %e, "Ignoring CHIRP_STORAGE"),
            }
        }
        if let Some(timeout) = var("CHIRP_TIMEOUT_SECS") {
            match timeout.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.request_timeout_secs = secs,
                _ => warn!(value = %timeout, "Ignoring invalid CHIRP_TIMEOUT_SECS"),
            }
        }
    }

    /// Base URL without a trailing slash
    pub fn api_base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Build the session store selected by `storage`.
    /// `passphrase` is required for the encrypted store.
    pub fn open_store(
        &self,
        cache_dir: &Path,
        passphrase: Option<&str>,
    ) -> Result<Box<dyn KeyValueStore>> {
        let store: Box<dyn KeyValueStore> = match self.storage {
            StorageKind::File => Box::new(FileStore::new(cache_dir)),
            StorageKind::Keyring => Box::new(KeyringStore::new()),
            StorageKind::Memory => Box::new(MemoryStore::new()),
            StorageKind::Encrypted => {
                let passphrase = passphrase
                    .filter(|p| !p.is_empty())
                    .ok_or_else(|| {
                        anyhow::anyhow!(
                            "Encrypted storage requires a passphrase (--passphrase or CHIRP_PASSPHRASE)"
                        )
                    })?;
                let inner = FileStore::at_path(cache_dir.join(ENCRYPTED_SESSION_FILE));
                Box::new(
                    EncryptedStore::new(inner, passphrase)
                        .context("Failed to open encrypted session store")?,
                )
            }
        };
        Ok(store)
    }
}
