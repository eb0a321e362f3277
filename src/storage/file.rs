use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::{ClientStorage, StorageError};

const DOCUMENT_NAME: &str = "client_storage.json";

/// Durable client storage backed by one JSON document.
///
/// The in-memory map is only updated after the document has been replaced on
/// disk, so a failed write leaves both copies untouched. Writers are serialized
/// by the mutex; the last writer wins.
pub struct FileStorage {
    path: PathBuf,
    map: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open (or create) the storage document under `dir`.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, StorageError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| StorageError::Io { path: dir.display().to_string(), source: e })?;
        let path = dir.join(DOCUMENT_NAME);
        let map = match fs::read(&path) {
            Ok(bytes) if !bytes.is_empty() => match serde_json::from_slice::<BTreeMap<String, String>>(&bytes) {
                Ok(m) => m,
                Err(e) => {
                    // Start fresh rather than refusing to boot the console
                    warn!(target: "storage", "discarding unreadable storage document '{}': {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Ok(_) => BTreeMap::new(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StorageError::Io { path: path.display().to_string(), source: e }),
        };
        debug!(target: "storage", "opened '{}' with {} keys", path.display(), map.len());
        Ok(Self { path, map: Mutex::new(map) })
    }

    pub fn path(&self) -> &Path { &self.path }

    fn persist(&self, doc: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &bytes).map_err(|e| StorageError::Io { path: tmp.display().to_string(), source: e })?;
        fs::rename(&tmp, &self.path).map_err(|e| StorageError::Io { path: self.path.display().to_string(), source: e })?;
        Ok(())
    }

    fn mutate<F: FnOnce(&mut BTreeMap<String, String>)>(&self, f: F) -> Result<(), StorageError> {
        let mut guard = self.map.lock();
        let mut next = guard.clone();
        f(&mut next);
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }
}

impl ClientStorage for FileStorage {
    fn set_raw(&self, key: &str, json: String) -> Result<(), StorageError> {
        self.mutate(|m| { m.insert(key.to_string(), json); })
    }

    fn get_raw(&self, key: &str) -> Option<String> { self.map.lock().get(key).cloned() }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.mutate(|m| { m.remove(key); })
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.mutate(|m| m.clear())
    }
}
