//! Durable key/value slots the cart is persisted into.
//!
//! [`KeyValueStore`] mirrors the browser's local storage: string keys, string
//! values, synchronous access. Two backends ship with the crate: an in-memory
//! map (optionally with a byte quota) and a directory of files.

use std::collections::HashMap;
use std::fmt::Debug;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded { needed: usize, quota: usize },
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
    #[error("storage lock poisoned")]
    Poisoned,
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Slot names usable as file names: ASCII letters, digits, `_`, `-` and `.`,
/// not starting with a dot.
pub fn is_valid_slot_name(key: &str) -> bool {
    !key.is_empty() && !key.starts_with('.') && key.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

pub trait KeyValueStore: Send + Sync + Debug {
    /// `Ok(None)` when nothing was ever written under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Succeeds when the key is already absent.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: RwLock<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Caps the total size of keys plus values, like a browser origin quota.
    pub fn with_quota(quota: usize) -> Self { Self { slots: RwLock::default(), quota: Some(quota) } }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let slots = self.slots.read().map_err(|_| StorageError::Poisoned)?;
        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut slots = self.slots.write().map_err(|_| StorageError::Poisoned)?;
        if let Some(quota) = self.quota {
            let others: usize = slots.iter().filter(|(k, _)| k.as_str() != key).map(|(k, v)| k.len() + v.len()).sum();
            let needed = others + key.len() + value.len();
            if needed > quota { return Err(StorageError::QuotaExceeded { needed, quota }); }
        }
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.slots.write().map_err(|_| StorageError::Poisoned)?.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per slot under a directory. Writes go to a temp file
/// in the same directory and are renamed over the slot.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path { &self.dir }

    fn slot_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        if !is_valid_slot_name(key) { return Err(StorageError::InvalidKey(key.to_string())); }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.slot_path(key)?) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.slot_path(key)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| StorageError::Io(e.error))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.slot_path(key)?) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("cart").unwrap(), None);
        store.set("cart", "[]").unwrap();
        assert_eq!(store.get("cart").unwrap().as_deref(), Some("[]"));
        store.remove("cart").unwrap();
        store.remove("cart").unwrap();
        assert_eq!(store.get("cart").unwrap(), None);
    }

    #[test]
    fn test_memory_quota() {
        let store = MemoryStore::with_quota(10);
        store.set("k", "12345").unwrap();
        store.set("k", "123456789").unwrap();
        let err = store.set("k", "1234567890").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { needed: 11, quota: 10 }));
        assert_eq!(store.get("k").unwrap().as_deref(), Some("123456789"));
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("slots")).unwrap();
        assert_eq!(store.get("luxe_cart_v1").unwrap(), None);
        store.set("luxe_cart_v1", "[1]").unwrap();
        store.set("luxe_cart_v1", "[2]").unwrap();
        assert_eq!(store.get("luxe_cart_v1").unwrap().as_deref(), Some("[2]"));
        assert!(store.dir().join("luxe_cart_v1.json").exists());
        store.remove("luxe_cart_v1").unwrap();
        assert_eq!(store.get("luxe_cart_v1").unwrap(), None);
    }

    #[test]
    fn test_file_store_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert!(matches!(store.set("../escape", "x"), Err(StorageError::InvalidKey(_))));
        assert!(matches!(store.get(""), Err(StorageError::InvalidKey(_))));
    }
}
