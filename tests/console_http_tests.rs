//! End-to-end console tests: the mock data store served by axum on an
//! ephemeral port, reached through `HttpTransport`, with file-backed state.

use std::sync::Arc;

use tempfile::tempdir;
use tokio::net::TcpListener;

use schooladmin::collections::{fee_summary, FeeRecord, FeeStatus, Student, UserProfile};
use schooladmin::config::AppConfig;
use schooladmin::console::Console;
use schooladmin::error::AppError;
use schooladmin::identity::validation::SignupForm;
use schooladmin::pipeline::{HttpTransport, Transport};
use schooladmin::server::MockBackend;
use schooladmin::storage::{FileStorage, SharedStorage};

async fn spawn_store() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(schooladmin::server::serve(listener, Arc::new(MockBackend::seeded())));
    format!("http://{}", addr)
}

fn open_console(api: &str, state_dir: &std::path::Path) -> Console {
    let cfg = AppConfig { api_url: api.to_string(), state_dir: state_dir.to_path_buf(), ..AppConfig::default() };
    let storage: SharedStorage = Arc::new(FileStorage::open(state_dir).unwrap());
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(api).unwrap());
    Console::new(cfg, storage, transport)
}

#[tokio::test]
async fn session_survives_restart() {
    let api = spawn_store().await;
    let dir = tempdir().unwrap();

    let first = open_console(&api, dir.path());
    assert_eq!(first.location().path, "/login");
    first.login("admin@school.pk", "admin123").await.unwrap();
    assert_eq!(first.location().path, "/dashboard");
    let dark = first.toggle_theme();
    let session_id = first.current_identity().unwrap().session_id;
    drop(first);

    let second = open_console(&api, dir.path());
    let ident = second.current_identity().unwrap();
    assert_eq!(ident.session_id, session_id);
    assert_eq!(ident.display_name, "Admin User");
    assert_eq!(second.location().path, "/dashboard");
    assert_eq!(second.theme().is_dark_mode(), dark);

    second.logout();
    let third = open_console(&api, dir.path());
    assert!(third.current_identity().is_none());
    assert_eq!(third.location().path, "/login");
}

#[tokio::test]
async fn crud_over_http() {
    let api = spawn_store().await;
    let dir = tempdir().unwrap();
    let console = open_console(&api, dir.path());
    console.login("manager@school.pk", "manager123").await.unwrap();

    let students = console.list::<Student>().await.unwrap();
    assert_eq!(students.len(), 5);

    let new = Student { name: "Usman Tariq".into(), class_name: "8-C".into(), roll_number: "309".into(), ..Default::default() };
    let created = console.add(&new).await.unwrap();
    assert_eq!(created.id, 6);
    assert_eq!(created.fee_status, FeeStatus::Pending);

    let renamed = Student { name: "Usman T.".into(), ..created.clone() };
    let saved = console.edit(&renamed).await.unwrap();
    assert_eq!(saved.name, "Usman T.");
    assert_eq!(console.collection::<Student>().get_by_id(6).await.unwrap().name, "Usman T.");

    // managers cannot delete
    assert!(matches!(console.remove(&saved).await, Err(AppError::Forbidden { .. })));
    // profiles are gated on grants rather than role: write yes, delete no
    let profile = UserProfile { profile_name: "Profile-7".into(), ..Default::default() };
    let profile = console.add(&profile).await.unwrap();
    assert_eq!(profile.id, 7);
    assert!(matches!(console.remove(&profile).await, Err(AppError::Forbidden { .. })));

    let missing = console.collection::<Student>().get_by_id(99).await.unwrap_err();
    assert!(matches!(missing, AppError::NotFound { .. }));
    assert!(console.current_identity().is_some());
    assert_eq!(console.loading().in_flight(), 0);
}

#[tokio::test]
async fn fee_collection_and_notifications() {
    let api = spawn_store().await;
    let dir = tempdir().unwrap();
    let console = open_console(&api, dir.path());
    console.login("admin@school.pk", "admin123").await.unwrap();

    let notices = console.notifications();
    assert_eq!(notices.unread_count(), 3);
    notices.mark_all_as_read();
    assert_eq!(notices.unread_count(), 0);

    let before = fee_summary(&console.list::<FeeRecord>().await.unwrap());
    let fee = console.collect_fee(4, 4000, "2025-01-21").await.unwrap();
    assert_eq!(fee.status, FeeStatus::Paid);
    assert_eq!(fee.total_pending, 0);

    let after = fee_summary(&console.list::<FeeRecord>().await.unwrap());
    assert_eq!(after.total_collected, before.total_collected + 4000);
    assert_eq!(after.total_pending, before.total_pending - 4000);

    assert_eq!(notices.unread_count(), 1);
    let latest = &notices.list()[0];
    assert_eq!(latest.title, "Payment Collected");
    assert!(latest.message.contains("Hassan Raza"));
    notices.mark_as_read(latest.id);
    assert_eq!(notices.unread_count(), 0);
}

#[tokio::test]
async fn signup_then_login() {
    let api = spawn_store().await;
    let dir = tempdir().unwrap();
    let console = open_console(&api, dir.path());

    let form = SignupForm {
        name: "Hina Aslam".into(),
        email: "hina@school.pk".into(),
        password: "hina1234".into(),
        confirm: "hina1234".into(),
        accept_terms: true,
    };
    let rec = console.signup(&form).await.unwrap();
    assert_eq!(rec.id, 5);
    assert_eq!(console.location().path, "/login");
    let again = console.signup(&form).await.unwrap_err();
    assert!(matches!(again, AppError::Conflict { .. }));

    console.login("hina@school.pk", "hina1234").await.unwrap();
    let ident = console.current_identity().unwrap();
    assert_eq!(ident.display_name, "Hina Aslam");
    assert_eq!(console.navigate("/students").location().path, "/students");
}

#[tokio::test]
async fn unreachable_api_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let api = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    let dir = tempdir().unwrap();
    let console = open_console(&api, dir.path());
    let err = console.login("admin@school.pk", "admin123").await.unwrap_err();
    assert!(matches!(err, AppError::Transport { .. }));
    assert!(err.user_message().starts_with("Network Error"));
    assert!(console.current_identity().is_none());
}
