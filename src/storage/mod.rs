//! Key/value persistence seam.
//!
//! Stands in for the host's local storage: raw string values under flat keys,
//! no versioning, no migration.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use thiserror::Error;

/// Storage key for the serialized theme configuration.
pub const THEME_CONFIG_KEY: &str = "theme-config";
/// Storage key for the raw compact ID token.
pub const ID_TOKEN_KEY: &str = "auth0.id_token";
/// Storage key for the raw encrypted-token remnant.
pub const JWE_TOKEN_KEY: &str = "auth0.jwe_token";
/// Storage key for the pre-redirect return target.
pub const RETURN_TO_KEY: &str = "auth0.return_to";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for StorageError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

/// Storage abstraction for persisted session/theme state.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// File-backed store: one file per key under a base directory.
///
/// # Example
/// ```no_run
/// use wicket::storage::{FileStore, KeyValueStore};
///
/// let store = FileStore::new_default();
/// store.set("theme-config", "{\"mode\":\"dark\"}")?;
/// # Ok::<(), wicket::storage::StorageError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn new_default() -> Self {
        Self {
            base_dir: default_wicket_dir(),
        }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(normalize_key(key))
    }

    fn ensure_parent(path: &Path) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.key_path(key)) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::Io(err.to_string())),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.key_path(key);
        Self::ensure_parent(&path)?;
        fs::write(&path, value)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::Io(err.to_string())),
        }
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.read().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values.write().unwrap().remove(key);
        Ok(())
    }
}

fn default_wicket_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".wicket"))
        .unwrap_or_else(|| PathBuf::from(".wicket"))
}

/// Map a storage key to a safe file name.
fn normalize_key(key: &str) -> String {
    let trimmed = key.trim();
    let mut out = String::with_capacity(trimmed.len());
    for ch in trimmed.chars() {
        let lower = ch.to_ascii_lowercase();
        if lower.is_ascii_alphanumeric() || lower == '-' || lower == '.' {
            out.push(lower);
        } else {
            out.push('-');
        }
    }
    if out.trim_matches(|c| c == '-' || c == '.').is_empty() {
        "default".to_string()
    } else {
        out
    }
}
