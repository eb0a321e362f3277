//!
//! schooladmin client storage
//! --------------------------
//! Key -> JSON-string storage used by the console for state that must survive a
//! restart (the persisted identity, the theme flag) and for ephemeral
//! session-scoped values (the path to restore after login).
//!
//! Two implementations are provided:
//! - `MemoryStorage`: process-local map, used for session-scoped storage and tests.
//! - `FileStorage`: a single JSON document on disk. Every mutation rewrites the
//!   document through a temp file and an atomic rename, so readers never see a
//!   half-written file.
//!
//! Values that fail to parse are logged and treated as absent.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

mod file;
pub mod theme;

pub use file::FileStorage;
pub use theme::ThemeStore;

/// Durable key holding the current identity.
pub const CURRENT_USER_KEY: &str = "currentUser";
/// Durable key holding the theme preference.
pub const DARK_MODE_KEY: &str = "darkMode";
/// Session-scoped key holding the navigation path to restore after login.
pub const REDIRECT_URL_KEY: &str = "redirectUrl";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io failure at {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
    #[error("storage document is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl From<StorageError> for crate::error::AppError {
    fn from(err: StorageError) -> Self {
        crate::error::AppError::Storage { code: "storage_error".into(), message: err.to_string() }
    }
}

pub trait ClientStorage: Send + Sync {
    fn set_raw(&self, key: &str, json: String) -> Result<(), StorageError>;
    fn get_raw(&self, key: &str) -> Option<String>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
    fn has(&self, key: &str) -> bool { self.get_raw(key).is_some() }
}

pub type SharedStorage = Arc<dyn ClientStorage>;

/// Serialize and store a value under `key`.
pub fn set_json<T: Serialize + ?Sized>(storage: &dyn ClientStorage, key: &str, value: &T) -> Result<(), StorageError> {
    let json = serde_json::to_string(value)?;
    storage.set_raw(key, json)
}

/// Read and parse `key`. Missing or unparseable values read as `None`.
pub fn get_json<T: DeserializeOwned>(storage: &dyn ClientStorage, key: &str) -> Option<T> {
    let raw = storage.get_raw(key)?;
    match serde_json::from_str::<T>(&raw) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(target: "storage", "ignoring unreadable value for key '{}': {}", key, e);
            None
        }
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    map: RwLock<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self { Self::default() }
    pub fn shared() -> SharedStorage { Arc::new(Self::new()) }
    pub fn len(&self) -> usize { self.map.read().len() }
    pub fn is_empty(&self) -> bool { self.map.read().is_empty() }
}

impl ClientStorage for MemoryStorage {
    fn set_raw(&self, key: &str, json: String) -> Result<(), StorageError> {
        self.map.write().insert(key.to_string(), json);
        Ok(())
    }

    fn get_raw(&self, key: &str) -> Option<String> { self.map.read().get(key).cloned() }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.map.write().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.map.write().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Pref { dark: bool, lang: String }

    #[test]
    fn memory_set_get_remove_clear() {
        let s = MemoryStorage::new();
        set_json(&s, "pref", &Pref { dark: true, lang: "en".into() }).unwrap();
        assert!(s.has("pref"));
        let back: Pref = get_json(&s, "pref").unwrap();
        assert_eq!(back, Pref { dark: true, lang: "en".into() });
        s.remove("pref").unwrap();
        assert!(!s.has("pref"));
        set_json(&s, "a", &1).unwrap();
        set_json(&s, "b", &2).unwrap();
        s.clear().unwrap();
        assert!(s.is_empty());
    }

    #[test]
    fn unparseable_value_reads_as_absent() {
        let s = MemoryStorage::new();
        s.set_raw("pref", "{not json".into()).unwrap();
        assert!(s.has("pref"));
        assert!(get_json::<Pref>(&s, "pref").is_none());
    }
}
