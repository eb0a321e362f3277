use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::routing::{Navigator, RouteName};
use crate::storage::{get_json, set_json, SharedStorage, CURRENT_USER_KEY};
use crate::tprintln;

use super::principal::Identity;
use super::provider::IdentityProvider;

/// Holds the single current identity.
///
/// Durable storage is written before anything is published, so a restart
/// mid-session reconstructs the same identity. Commits (storage write +
/// publish) are serialized by `commit_lock`; when two logins race, the last
/// commit wins in both storage and the published value.
pub struct SessionStore {
    storage: SharedStorage,
    navigator: Arc<Navigator>,
    tx: watch::Sender<Option<Identity>>,
    commit_lock: Mutex<()>,
}

impl SessionStore {
    /// Restore whatever identity durable storage holds.
    pub fn new(storage: SharedStorage, navigator: Arc<Navigator>) -> Self {
        let restored = get_json::<Identity>(storage.as_ref(), CURRENT_USER_KEY);
        if let Some(ident) = &restored {
            info!(target: "auth", "restored session for {} ({})", ident.email, ident.role);
        }
        let (tx, _rx) = watch::channel(restored);
        Self { storage, navigator, tx, commit_lock: Mutex::new(()) }
    }

    pub fn current(&self) -> Option<Identity> { self.tx.borrow().clone() }

    pub fn is_authenticated(&self) -> bool { self.tx.borrow().is_some() }

    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> { self.tx.subscribe() }

    /// Check credentials against the identity collection and make the match current.
    pub async fn login(&self, provider: &dyn IdentityProvider, email: &str, credential: &str) -> AppResult<Identity> {
        let record = provider.find_by_credentials(email, credential).await?;
        let Some(record) = record else {
            info!(target: "auth", "login rejected for {}", email);
            return Err(AppError::invalid_credentials("invalid_credentials", "no identity matches the given credentials"));
        };
        let ident = Identity::from_record(&record, Utc::now());
        self.commit(Some(ident.clone()))?;
        info!(target: "auth", "login user={} role={} sid={}", ident.email, ident.role, ident.session_id);
        Ok(ident)
    }

    /// Clear the identity and go to the public entry route.
    pub fn logout(&self) {
        let was = self.current().map(|i| i.email);
        if let Err(e) = self.commit(None) {
            // The published value is still cleared so the console behaves as logged out
            warn!(target: "auth", "failed to clear persisted identity: {}", e);
            self.tx.send_replace(None);
        }
        tprintln!("session.logout user={:?}", was);
        info!(target: "auth", "logout user={:?}", was);
        self.navigator.force_route(RouteName::Login);
    }

    /// Replace the current identity's display details after a profile edit.
    pub fn refresh(&self, display_name: &str, email: &str) -> AppResult<Option<Identity>> {
        let Some(mut ident) = self.current() else { return Ok(None); };
        ident.display_name = display_name.to_string();
        ident.email = email.to_string();
        self.commit(Some(ident.clone()))?;
        Ok(Some(ident))
    }

    fn commit(&self, next: Option<Identity>) -> AppResult<()> {
        let _g = self.commit_lock.lock();
        match &next {
            Some(ident) => set_json(self.storage.as_ref(), CURRENT_USER_KEY, ident)?,
            None => self.storage.remove(CURRENT_USER_KEY)?,
        }
        self.tx.send_replace(next);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{IdentityRecord, Permission, Role, StaticIdentityProvider};
    use crate::routing::Location;
    use crate::storage::{ClientStorage, MemoryStorage};

    fn provider() -> StaticIdentityProvider {
        StaticIdentityProvider::new(vec![(
            IdentityRecord {
                id: 1,
                email: "admin@school.pk".into(),
                name: "Admin".into(),
                role: Role::Admin,
                permissions: [Permission::Read, Permission::Write, Permission::Delete].into_iter().collect(),
            },
            "admin123".into(),
        )])
    }

    #[tokio::test]
    async fn login_persists_before_publishing() {
        let storage = MemoryStorage::shared();
        let nav = Arc::new(Navigator::default());
        let store = SessionStore::new(storage.clone(), nav);
        let mut rx = store.subscribe();
        let ident = store.login(&provider(), "admin@school.pk", "admin123").await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_ref().map(|i| i.id), Some(1));
        assert!(storage.has(CURRENT_USER_KEY));
        assert_eq!(ident.display_name, "Admin");

        // a fresh store over the same storage restores the identity
        let again = SessionStore::new(storage, Arc::new(Navigator::default()));
        assert_eq!(again.current().map(|i| i.session_id), Some(ident.session_id));
    }

    #[tokio::test]
    async fn bad_credentials_publish_nothing() {
        let storage = MemoryStorage::shared();
        let store = SessionStore::new(storage.clone(), Arc::new(Navigator::default()));
        let rx = store.subscribe();
        let err = store.login(&provider(), "admin@school.pk", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials { .. }));
        assert!(!rx.has_changed().unwrap());
        assert!(!store.is_authenticated());
        assert!(!storage.has(CURRENT_USER_KEY));
    }

    #[tokio::test]
    async fn logout_clears_and_navigates_to_login() {
        let storage = MemoryStorage::shared();
        let nav = Arc::new(Navigator::new(Location::parse("/dashboard")));
        let store = SessionStore::new(storage.clone(), nav.clone());
        store.login(&provider(), "admin@school.pk", "admin123").await.unwrap();
        store.logout();
        assert!(!store.is_authenticated());
        assert!(store.current().is_none());
        assert!(!storage.has(CURRENT_USER_KEY));
        assert_eq!(nav.current().path, "/login");
    }
}
