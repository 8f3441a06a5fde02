//! Key-Value Persistence
//!
//! A string-keyed document store modelled on the device storage the
//! mobile client persists to. Values are opaque strings (the callers
//! store JSON). Writes replace the whole value for a key.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

/// Key-value store errors
#[derive(Debug, Error)]
pub enum KvError {
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage lock poisoned")]
    Poisoned,
}

/// Key-value store trait
#[trait_variant::make(KeyValueStore: Send)]
pub trait LocalKeyValueStore {
    /// Read the value for `key`, `None` when absent
    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    /// Replace the value for `key`
    async fn set(&self, key: &str, value: &str) -> Result<(), KvError>;

    /// Remove `key`; removing an absent key is not an error
    async fn remove(&self, key: &str) -> Result<(), KvError>;
}

// ============================================================================
// File-backed store
// ============================================================================

/// One file per key under a data directory
///
/// Writes go to a temporary sibling first and are renamed into place, so
/// a crash mid-write leaves either the old or the new document.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `_` escapes the separators a key may contain, so distinct keys
    /// never share a file
    fn path_for(&self, key: &str) -> Result<PathBuf, KvError> {
        if key.is_empty() || key.len() > 128 || key.starts_with('.') {
            return Err(KvError::InvalidKey(key.to_string()));
        }
        let mut file_name = String::with_capacity(key.len() + 8);
        for c in key.chars() {
            match c {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '.' => file_name.push(c),
                '_' => file_name.push_str("__"),
                ':' => file_name.push_str("_c"),
                '/' => file_name.push_str("_s"),
                '@' => file_name.push_str("_a"),
                _ => return Err(KvError::InvalidKey(key.to_string())),
            }
        }
        Ok(self.dir.join(format!("{file_name}.json")))
    }
}

impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, value.as_bytes()).await?;
        tokio::fs::rename(&tmp_path, &path).await?;

        tracing::trace!(key, bytes = value.len(), "Stored value");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), KvError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Process-local store
///
/// Clones share the same entries, which lets tests simulate an app restart
/// by building new components over a clone.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw value without going through the async API
    pub fn insert_raw(&self, key: &str, value: &str) -> Result<(), KvError> {
        let mut entries = self.entries.lock().map_err(|_| KvError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let entries = self.entries.lock().map_err(|_| KvError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        let mut entries = self.entries.lock().map_err(|_| KvError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), KvError> {
        let mut entries = self.entries.lock().map_err(|_| KvError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}
