use tokio::sync::watch;
use tracing::{debug, warn};

use super::{get_json, set_json, SharedStorage, DARK_MODE_KEY};

/// Dark-mode preference persisted in durable client storage.
pub struct ThemeStore {
    storage: SharedStorage,
    tx: watch::Sender<bool>,
}

impl ThemeStore {
    pub fn new(storage: SharedStorage) -> Self {
        let dark = get_json::<bool>(storage.as_ref(), DARK_MODE_KEY).unwrap_or(false);
        let (tx, _rx) = watch::channel(dark);
        Self { storage, tx }
    }

    pub fn is_dark_mode(&self) -> bool { *self.tx.borrow() }

    pub fn set_dark_mode(&self, dark: bool) {
        if let Err(e) = set_json(self.storage.as_ref(), DARK_MODE_KEY, &dark) {
            warn!(target: "storage", "failed to persist theme preference: {}", e);
        }
        self.tx.send_replace(dark);
        debug!(target: "storage", dark_mode = dark, "theme updated");
    }

    pub fn toggle(&self) -> bool {
        let next = !self.is_dark_mode();
        self.set_dark_mode(next);
        next
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> { self.tx.subscribe() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn toggle_persists_and_restores() {
        let storage = MemoryStorage::shared();
        let theme = ThemeStore::new(storage.clone());
        assert!(!theme.is_dark_mode());
        let rx = theme.subscribe();
        assert!(theme.toggle());
        assert!(*rx.borrow());
        let again = ThemeStore::new(storage);
        assert!(again.is_dark_mode());
    }
}
