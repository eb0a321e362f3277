//!
//! console
//! -------
//! Composition root for one console instance. Owns every store and hands out
//! references; nothing in the crate reaches for a global. Screen-level
//! operations (login, CRUD with action gates and notifications, fee
//! collection, attendance marking, account settings) live here.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::json;
use tracing::{info, warn};

use crate::collections::{apply_payment, AttendanceRecord, AttendanceStatus, Collection, FeeRecord, Record, Student};
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::identity::validation::{validate_login, validate_password_change, validate_signup, SignupForm};
use crate::identity::{can, Action, Identity, IdentityProvider, IdentityRecord, RemoteIdentityProvider, SessionStore};
use crate::notifications::{NewNotification, NotificationStore, Severity};
use crate::pipeline::{HttpTransport, LoadingTracker, Pipeline, Transport};
use crate::routing::{AccessNotice, Location, NavigationOutcome, Navigator, RouteName, RouteTable, Router};
use crate::storage::{FileStorage, MemoryStorage, SharedStorage, ThemeStore};

pub struct Console {
    config: AppConfig,
    navigator: Arc<Navigator>,
    session: Arc<SessionStore>,
    router: Router,
    loading: Arc<LoadingTracker>,
    pipeline: Arc<Pipeline>,
    provider: Arc<dyn IdentityProvider>,
    notifications: Arc<NotificationStore>,
    theme: ThemeStore,
    notice: Mutex<Option<AccessNotice>>,
}

impl Console {
    /// Wire a console over the given durable storage and transport, using the remote identity collection.
    pub fn new(config: AppConfig, storage: SharedStorage, transport: Arc<dyn Transport>) -> Self {
        Self::build(config, storage, transport, None)
    }

    /// As `new`, with a caller-supplied identity provider.
    pub fn with_provider(
        config: AppConfig,
        storage: SharedStorage,
        transport: Arc<dyn Transport>,
        provider: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self::build(config, storage, transport, Some(provider))
    }

    fn build(
        config: AppConfig,
        storage: SharedStorage,
        transport: Arc<dyn Transport>,
        provider: Option<Arc<dyn IdentityProvider>>,
    ) -> Self {
        let session_scope = MemoryStorage::shared();
        let navigator = Arc::new(Navigator::default());
        let session = Arc::new(SessionStore::new(storage.clone(), navigator.clone()));
        let loading = Arc::new(LoadingTracker::new());
        let pipeline = Arc::new(Pipeline::standard(transport, session.clone(), loading.clone()));
        let provider: Arc<dyn IdentityProvider> = match provider {
            Some(p) => p,
            None => Arc::new(RemoteIdentityProvider::new(pipeline.clone())),
        };
        let router = Router::new(RouteTable::standard(), session.clone(), session_scope, navigator.clone());
        let console = Self {
            config,
            navigator,
            session,
            router,
            loading,
            pipeline,
            provider,
            notifications: Arc::new(NotificationStore::with_defaults(Utc::now())),
            theme: ThemeStore::new(storage),
            notice: Mutex::new(None),
        };
        if console.session.is_authenticated() {
            console.navigate(&RouteName::Dashboard.path());
        }
        console
    }

    /// File-backed storage under the configured state directory, HTTP to the configured API.
    pub fn open(config: AppConfig) -> AppResult<Self> {
        let storage: SharedStorage = Arc::new(FileStorage::open(&config.state_dir)?);
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config.api_url)?);
        info!(target: "startup", "console using api={} state_dir={:?}", config.api_url, config.state_dir);
        Ok(Self::new(config, storage, transport))
    }

    pub fn config(&self) -> &AppConfig { &self.config }
    pub fn session(&self) -> &Arc<SessionStore> { &self.session }
    pub fn router(&self) -> &Router { &self.router }
    pub fn navigator(&self) -> &Arc<Navigator> { &self.navigator }
    pub fn loading(&self) -> &Arc<LoadingTracker> { &self.loading }
    pub fn pipeline(&self) -> &Arc<Pipeline> { &self.pipeline }
    pub fn notifications(&self) -> &Arc<NotificationStore> { &self.notifications }
    pub fn theme(&self) -> &ThemeStore { &self.theme }

    pub fn current_identity(&self) -> Option<Identity> { self.session.current() }

    pub fn location(&self) -> Location { self.navigator.current() }

    /// Validate, authenticate, then continue to the page that sent the user to login (or the dashboard).
    pub async fn login(&self, email: &str, password: &str) -> AppResult<NavigationOutcome> {
        validate_login(email, password)?;
        let ident = self.session.login(self.provider.as_ref(), email.trim(), password).await?;
        let target = self
            .router
            .take_redirect_path()
            .filter(|p| RouteName::from_segment(Location::parse(p).first_segment()) != Some(RouteName::Login))
            .unwrap_or_else(|| RouteName::Dashboard.path());
        info!(target: "auth", "{} continuing to {}", ident.email, target);
        Ok(self.navigate(&target))
    }

    pub fn logout(&self) {
        self.session.logout();
        *self.notice.lock() = None;
    }

    /// Register a new account, then send the user to the login screen.
    pub async fn signup(&self, form: &SignupForm) -> AppResult<IdentityRecord> {
        let req = validate_signup(form)?;
        let created = self.provider.register(&req).await?;
        info!(target: "auth", "registered {} as {}", created.email, created.role);
        self.navigator.force_route(RouteName::Login);
        Ok(created)
    }

    /// Run the guard chain for `raw` and move there (or to wherever the guards redirect).
    pub fn navigate(&self, raw: &str) -> NavigationOutcome {
        let outcome = self.router.navigate(raw);
        let notice = AccessNotice::from_location(outcome.location(), Utc::now(), self.config.notice_delay());
        *self.notice.lock() = notice;
        outcome
    }

    /// The access notice still on screen, if any. Expired notices are cleared, and
    /// so is any notice left over from a session that has since ended (a 401 logs
    /// out from inside the pipeline without going through `logout`).
    pub fn active_notice(&self) -> Option<AccessNotice> {
        let mut slot = self.notice.lock();
        let signed_out = !self.session.is_authenticated();
        if slot.as_ref().is_some_and(|n| signed_out || !n.is_visible(Utc::now())) {
            *slot = None;
        }
        slot.clone()
    }

    pub fn can(&self, action: Action) -> bool { can(self.session.current().as_ref(), action) }

    fn require(&self, action: Action, what: &str) -> AppResult<()> {
        if self.can(action) {
            return Ok(());
        }
        warn!(target: "guard", "action {:?} on {} refused", action, what);
        Err(AppError::Forbidden {
            code: "forbidden".into(),
            message: format!("You do not have permission to {}", what),
        })
    }

    fn notify(&self, severity: Severity, title: String, message: String) {
        self.notifications.add(NewNotification::new(severity, title, message));
    }

    pub fn collection<T: Record>(&self) -> Collection<T> { Collection::new(self.pipeline.clone()) }

    pub async fn list<T: Record>(&self) -> AppResult<Vec<T>> { self.collection::<T>().get_all().await }

    pub async fn add<T: Record>(&self, record: &T) -> AppResult<T> {
        self.require(T::ADD_ACTION, &format!("add a {}", T::NOUN.to_lowercase()))?;
        let created = self.collection::<T>().create(record).await?;
        self.notify(Severity::Success, format!("New {} Added", T::NOUN), format!("{} has been added", created.label()));
        Ok(created)
    }

    pub async fn edit<T: Record>(&self, record: &T) -> AppResult<T> {
        self.require(T::EDIT_ACTION, &format!("edit a {}", T::NOUN.to_lowercase()))?;
        let updated = self.collection::<T>().update(record).await?;
        self.notify(Severity::Info, format!("{} Updated", T::NOUN), format!("{} has been updated", updated.label()));
        Ok(updated)
    }

    pub async fn remove<T: Record>(&self, record: &T) -> AppResult<()> {
        self.require(T::DELETE_ACTION, &format!("delete a {}", T::NOUN.to_lowercase()))?;
        self.collection::<T>().delete(record.id()).await?;
        self.notify(Severity::Warning, format!("{} Deleted", T::NOUN), format!("{} has been removed", record.label()));
        Ok(())
    }

    /// Collect `amount` against a fee record and store the result.
    pub async fn collect_fee(&self, fee_id: u64, amount: u64, date: &str) -> AppResult<FeeRecord> {
        self.require(Action::CollectFee, "collect fees")?;
        let fees = self.collection::<FeeRecord>();
        let current = fees.get_by_id(fee_id).await?;
        let next = apply_payment(&current, amount, date)?;
        let saved = fees.update(&next).await?;
        self.notifications.add(
            NewNotification::new(
                Severity::Success,
                "Payment Collected",
                format!("₨{} received from {}", amount, saved.student_name),
            )
            .icon("bi-cash-coin"),
        );
        Ok(saved)
    }

    /// Record a student's status for `date`, updating that day's record if one exists.
    pub async fn mark_attendance(&self, student: &Student, date: &str, status: AttendanceStatus) -> AppResult<AttendanceRecord> {
        self.require(Action::MarkAttendance, "mark attendance")?;
        let marked_by = self.session.current().map(|i| i.display_name).unwrap_or_default();
        let records = self.collection::<AttendanceRecord>();
        let existing = records
            .get_all()
            .await?
            .into_iter()
            .find(|r| r.student_id == student.id && r.date == date);
        let saved = match existing {
            Some(rec) => records.update(&AttendanceRecord { status, marked_by, ..rec }).await?,
            None => {
                let rec = AttendanceRecord {
                    id: 0,
                    date: date.to_string(),
                    student_id: student.id,
                    student_name: student.name.clone(),
                    class_name: student.class_name.clone(),
                    status,
                    marked_by,
                    remarks: String::new(),
                };
                records.create(&rec).await?
            }
        };
        info!(target: "attendance", "{} marked {:?} on {}", student.name, status, date);
        Ok(saved)
    }

    fn require_identity(&self) -> AppResult<Identity> {
        self.session
            .current()
            .ok_or_else(|| AppError::unauthorized("not_authenticated", "Please login to continue."))
    }

    /// Update the signed-in account's name and email, then refresh the session copy.
    pub async fn update_profile(&self, name: &str, email: &str) -> AppResult<Identity> {
        let ident = self.require_identity()?;
        if name.trim().is_empty() || !crate::identity::validation::is_valid_email(email.trim()) {
            return Err(AppError::user("invalid_profile", "Please enter a name and a valid email"));
        }
        let rec = self
            .provider
            .update_record(ident.id, json!({ "name": name.trim(), "email": email.trim() }))
            .await?;
        let refreshed = self.session.refresh(&rec.name, &rec.email)?;
        refreshed.ok_or_else(|| AppError::unauthorized("not_authenticated", "Please login to continue."))
    }

    /// Verify the current password, then replace it.
    pub async fn change_password(&self, current: &str, new_password: &str, confirm: &str) -> AppResult<()> {
        let ident = self.require_identity()?;
        validate_password_change(new_password, confirm)?;
        if self.provider.find_by_credentials(&ident.email, current).await?.is_none() {
            return Err(AppError::invalid_credentials("wrong_password", "Current password is incorrect"));
        }
        self.provider.update_record(ident.id, json!({ "password": new_password })).await?;
        self.notify(Severity::Success, "Password Changed".into(), "Your password has been updated".into());
        Ok(())
    }

    pub fn toggle_theme(&self) -> bool { self.theme.toggle() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::{FeeStatus, Teacher};
    use crate::server::MockBackend;

    fn console() -> Console {
        Console::new(AppConfig::default(), MemoryStorage::shared(), Arc::new(MockBackend::seeded()))
    }

    #[tokio::test]
    async fn login_returns_to_recorded_path() {
        let c = console();
        let out = c.navigate("/settings");
        assert_eq!(out.location().path, "/login");
        let out = c.login("manager@school.pk", "manager123").await.unwrap();
        assert_eq!(out, NavigationOutcome::Arrived(Location::parse("/settings")));
        // the recorded path is consumed once
        c.logout();
        let out = c.login("manager@school.pk", "manager123").await.unwrap();
        assert_eq!(out.location().path, "/dashboard");
    }

    #[tokio::test]
    async fn wrong_password_is_rejected_without_session() {
        let c = console();
        let err = c.login("admin@school.pk", "nope-nope").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials { .. }));
        assert!(c.current_identity().is_none());
        assert_eq!(c.loading().in_flight(), 0);
    }

    #[tokio::test]
    async fn gated_crud_emits_notifications() {
        let c = console();
        c.login("user@school.pk", "user123").await.unwrap();
        let t = Teacher { name: "Zara Sheikh".into(), subject: "Chemistry".into(), ..Default::default() };
        assert!(matches!(c.add(&t).await, Err(AppError::Forbidden { .. })));

        c.logout();
        c.login("manager@school.pk", "manager123").await.unwrap();
        let before = c.notifications().unread_count();
        let created = c.add(&t).await.unwrap();
        assert_eq!(created.id, 4);
        assert_eq!(c.notifications().unread_count(), before + 1);
        assert_eq!(c.notifications().list()[0].title, "New Teacher Added");
        assert!(matches!(c.remove(&created).await, Err(AppError::Forbidden { .. })));

        c.logout();
        c.login("admin@school.pk", "admin123").await.unwrap();
        c.remove(&created).await.unwrap();
        assert_eq!(c.list::<Teacher>().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn fee_collection_updates_record() {
        let c = console();
        c.login("admin@school.pk", "admin123").await.unwrap();
        let fee = c.collect_fee(2, 1500, "2025-01-20").await.unwrap();
        assert_eq!(fee.status, FeeStatus::Partial);
        assert_eq!((fee.total_paid, fee.total_pending), (1500, 3000));
        let err = c.collect_fee(2, 5000, "2025-01-20").await.unwrap_err();
        assert_eq!(err.code_str(), "amount_exceeds_pending");
        assert!(c.notifications().list()[0].message.contains("Sara Khan"));
    }

    #[tokio::test]
    async fn attendance_marking_is_idempotent_per_day() {
        let c = console();
        c.login("user@school.pk", "user123").await.unwrap();
        let students = c.list::<Student>().await.unwrap();
        let sara = students.iter().find(|s| s.name == "Sara Khan").unwrap();
        let first = c.mark_attendance(sara, "2025-01-10", AttendanceStatus::Late).await.unwrap();
        assert_eq!(first.id, 3);
        assert_eq!(first.marked_by, "Regular User");
        let new_day = c.mark_attendance(sara, "2025-01-11", AttendanceStatus::Present).await.unwrap();
        assert_eq!(new_day.id, 5);
        assert_eq!(c.list::<AttendanceRecord>().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn password_change_requires_current_password() {
        let c = console();
        c.login("user@school.pk", "user123").await.unwrap();
        let err = c.change_password("wrong1", "newpass1", "newpass1").await.unwrap_err();
        assert_eq!(err.code_str(), "wrong_password");
        c.change_password("user123", "newpass1", "newpass1").await.unwrap();
        c.logout();
        assert!(c.login("user@school.pk", "user123").await.is_err());
        c.login("user@school.pk", "newpass1").await.unwrap();
        let ident = c.update_profile("Regular Person", "user@school.pk").await.unwrap();
        assert_eq!(ident.display_name, "Regular Person");
    }

    #[tokio::test]
    async fn denial_sets_an_access_notice() {
        let c = console();
        c.login("guest@school.pk", "guest123").await.unwrap();
        let out = c.navigate("/teachers");
        assert_eq!(out.location().to_string(), "/dashboard?error=access_denied");
        assert!(c.active_notice().unwrap().message().starts_with("Access Denied"));
        c.navigate("/dashboard");
        assert!(c.active_notice().is_none());
    }

    #[tokio::test]
    async fn notice_does_not_outlive_a_forced_logout() {
        let c = console();
        c.login("guest@school.pk", "guest123").await.unwrap();
        c.navigate("/teachers");
        assert!(c.active_notice().is_some());
        // the error stage ends the session directly on a 401
        c.session().logout();
        assert_eq!(c.location().path, "/login");
        assert!(c.active_notice().is_none());
    }
}
