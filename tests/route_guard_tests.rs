//! Route guard integration tests: the guard chain wired through `Router`,
//! with sessions backed by a static identity provider.

use std::sync::Arc;

use schooladmin::identity::{IdentityRecord, Permission, Role, SessionStore, StaticIdentityProvider};
use schooladmin::routing::{DenyReason, Location, NavigationOutcome, Navigator, RouteDef, RouteName, RouteTable, Router};
use schooladmin::storage::{MemoryStorage, SharedStorage};

fn account(id: u64, email: &str, role: Role, perms: &[Permission]) -> (IdentityRecord, String) {
    (
        IdentityRecord { id, email: email.into(), name: String::new(), role, permissions: perms.iter().copied().collect() },
        "secret1".to_string(),
    )
}

fn provider() -> StaticIdentityProvider {
    StaticIdentityProvider::new(vec![
        account(1, "admin@school.pk", Role::Admin, &[Permission::Read, Permission::Write, Permission::Delete]),
        account(2, "user@school.pk", Role::User, &[Permission::Read]),
    ])
}

struct Harness {
    session: Arc<SessionStore>,
    router: Router,
    navigator: Arc<Navigator>,
}

fn harness(table: RouteTable) -> Harness {
    let durable: SharedStorage = MemoryStorage::shared();
    let navigator = Arc::new(Navigator::default());
    let session = Arc::new(SessionStore::new(durable, navigator.clone()));
    let router = Router::new(table, session.clone(), MemoryStorage::shared(), navigator.clone());
    Harness { session, router, navigator }
}

#[tokio::test]
async fn role_route_denies_user_to_dashboard() {
    let h = harness(RouteTable::new(vec![
        RouteDef::authenticated(RouteName::Dashboard),
        RouteDef::roles(RouteName::Users, &[Role::Admin, Role::Manager]),
    ]));
    h.session.login(&provider(), "user@school.pk", "secret1").await.unwrap();

    let out = h.router.navigate("/users");
    match &out {
        NavigationOutcome::Redirected { attempted, to, reason } => {
            assert_eq!(attempted.path, "/users");
            assert_eq!(to.to_string(), "/dashboard?error=access_denied");
            assert_eq!(*reason, Some(DenyReason::AccessDenied));
        }
        other => panic!("expected a redirect, got {:?}", other),
    }
    assert_eq!(h.navigator.current().to_string(), "/dashboard?error=access_denied");
    // denial for a signed-in user never records a return path
    assert_eq!(h.router.take_redirect_path(), None);
}

#[tokio::test]
async fn permission_route_allows_superset() {
    let h = harness(RouteTable::new(vec![
        RouteDef::authenticated(RouteName::Dashboard),
        RouteDef::permissions(RouteName::Fees, &[Permission::Delete]),
        RouteDef::permissions(RouteName::Users, &[Permission::Delete, Permission::ManageUsers]),
    ]));
    h.session.login(&provider(), "admin@school.pk", "secret1").await.unwrap();

    assert_eq!(h.router.navigate("/fees"), NavigationOutcome::Arrived(Location::parse("/fees")));
    let out = h.router.navigate("/users");
    assert_eq!(out.location().to_string(), "/dashboard?error=insufficient_permissions");
}

#[tokio::test]
async fn login_resumes_attempted_location() {
    let h = harness(RouteTable::standard());
    let out = h.router.navigate("/settings");
    assert_eq!(out.location().path, "/login");
    assert!(matches!(out, NavigationOutcome::Redirected { reason: Some(DenyReason::NotAuthenticated), .. }));

    h.session.login(&provider(), "user@school.pk", "secret1").await.unwrap();
    let back = h.router.take_redirect_path().unwrap();
    assert_eq!(back, "/settings");
    assert_eq!(h.router.navigate(&back), NavigationOutcome::Arrived(Location::parse("/settings")));
    assert_eq!(h.router.take_redirect_path(), None);
}

#[tokio::test]
async fn unknown_paths_fall_back_to_login() {
    let h = harness(RouteTable::standard());
    for raw in ["", "/", "/nowhere", "/reports/2025"] {
        let out = h.router.navigate(raw);
        assert_eq!(out.location().path, "/login", "path {:?}", raw);
    }
}

#[tokio::test]
async fn logout_makes_next_guard_treat_user_as_anonymous() {
    let h = harness(RouteTable::standard());
    h.session.login(&provider(), "admin@school.pk", "secret1").await.unwrap();
    assert!(h.router.navigate("/students").location().path == "/students");

    h.session.logout();
    assert_eq!(h.navigator.current().path, "/login");
    let out = h.router.navigate("/students");
    assert!(matches!(out, NavigationOutcome::Redirected { reason: Some(DenyReason::NotAuthenticated), .. }));
    assert_eq!(h.router.take_redirect_path().as_deref(), Some("/students"));
}

#[test]
fn route_table_loads_from_json() {
    let table = RouteTable::from_json(
        r#"{"routes":[
            {"name":"login"},
            {"name":"dashboard","guard":"authenticated"},
            {"name":"fees","guard":"role","requirement":{"roles":["admin","manager"]}}
        ]}"#,
    )
    .unwrap();
    assert_eq!(table.routes().len(), 3);
    assert_eq!(table.get(RouteName::Fees), Some(&RouteDef::roles(RouteName::Fees, &[Role::Admin, Role::Manager])));
    assert!(RouteTable::from_json("{\"routes\": 3}").is_err());
}
