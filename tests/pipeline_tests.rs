//! Request pipeline integration tests: loading accounting under concurrency and
//! session teardown on rejected credentials.

use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde_json::json;

use schooladmin::error::{AppError, AppResult};
use schooladmin::identity::{IdentityRecord, Permission, Role, SessionStore, StaticIdentityProvider};
use schooladmin::pipeline::{ApiRequest, ApiResponse, LoadingTracker, Pipeline, Transport};
use schooladmin::routing::{DenyReason, NavigationOutcome, Navigator, RouteTable, Router};
use schooladmin::storage::MemoryStorage;

/// Sleeps, then answers with whatever status is currently configured.
struct Slow {
    status: AtomicU16,
    delay: Duration,
}

impl Transport for Slow {
    fn send<'a>(&'a self, _req: ApiRequest) -> BoxFuture<'a, AppResult<ApiResponse>> {
        async move {
            tokio::time::sleep(self.delay).await;
            Ok(ApiResponse::new(self.status.load(Ordering::SeqCst), json!([])))
        }
        .boxed()
    }
}

async fn signed_in(navigator: Arc<Navigator>) -> Arc<SessionStore> {
    let session = Arc::new(SessionStore::new(MemoryStorage::shared(), navigator));
    let provider = StaticIdentityProvider::new(vec![(
        IdentityRecord {
            id: 3,
            email: "user@school.pk".into(),
            name: "Regular User".into(),
            role: Role::User,
            permissions: [Permission::Read].into_iter().collect(),
        },
        "user123".into(),
    )]);
    session.login(&provider, "user@school.pk", "user123").await.unwrap();
    session
}

#[test]
fn loading_counter_never_goes_negative() {
    let tracker = Arc::new(LoadingTracker::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let t = tracker.clone();
            std::thread::spawn(move || {
                for _ in 0..200 {
                    let guard = t.begin();
                    drop(guard);
                    // stray hides must clamp rather than underflow
                    t.hide();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(tracker.in_flight(), 0);
    assert!(!tracker.is_loading());
}

#[tokio::test]
async fn loading_covers_concurrent_requests() {
    let navigator = Arc::new(Navigator::default());
    let session = signed_in(navigator).await;
    let loading = Arc::new(LoadingTracker::new());
    let transport = Arc::new(Slow { status: AtomicU16::new(200), delay: Duration::from_millis(30) });
    let pipeline = Arc::new(Pipeline::standard(transport, session, loading.clone()));

    let mut rx = loading.subscribe();
    let tasks: Vec<_> = (0..5)
        .map(|i| {
            let p = pipeline.clone();
            tokio::spawn(async move { p.send(ApiRequest::get(format!("students/{}", i))).await })
        })
        .collect();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(loading.in_flight(), 5);
    assert!(*rx.borrow_and_update());

    for joined in futures::future::join_all(tasks).await {
        joined.unwrap().unwrap();
    }
    assert_eq!(loading.in_flight(), 0);
    assert!(!loading.is_loading());
}

#[tokio::test]
async fn rejected_credentials_end_the_session_for_the_next_guard() {
    let navigator = Arc::new(Navigator::default());
    let session = signed_in(navigator.clone()).await;
    let router = Router::new(RouteTable::standard(), session.clone(), MemoryStorage::shared(), navigator.clone());
    assert_eq!(router.navigate("/fees").location().path, "/fees");

    let loading = Arc::new(LoadingTracker::new());
    let transport = Arc::new(Slow { status: AtomicU16::new(401), delay: Duration::from_millis(1) });
    let pipeline = Pipeline::standard(transport, session.clone(), loading.clone());
    let err = pipeline.send(ApiRequest::get("fees")).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized { .. }));
    assert_eq!(loading.in_flight(), 0);
    assert_eq!(navigator.current().path, "/login");

    let out = router.navigate("/fees");
    assert!(matches!(out, NavigationOutcome::Redirected { reason: Some(DenyReason::NotAuthenticated), .. }));
}

#[tokio::test]
async fn server_failures_keep_the_session() {
    let navigator = Arc::new(Navigator::default());
    let session = signed_in(navigator).await;
    let transport = Arc::new(Slow { status: AtomicU16::new(404), delay: Duration::from_millis(1) });
    let pipeline = Pipeline::standard(transport.clone(), session.clone(), Arc::new(LoadingTracker::new()));

    let err = pipeline.send(ApiRequest::get("students/99")).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));
    transport.status.store(503, Ordering::SeqCst);
    let err = pipeline.send(ApiRequest::get("students")).await.unwrap_err();
    assert!(err.is_transient());
    assert!(session.is_authenticated());
    assert_eq!(pipeline.stage_names(), vec!["loading", "identity", "errors"]);
}
