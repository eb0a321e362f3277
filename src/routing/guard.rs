//! Navigation guards.
//!
//! Each guard is a total function of (target, session state) returning
//! `Allow` or `Deny(redirect, reason)`. The role and permission guards run the
//! authentication guard first. Only the authentication guard has a side effect:
//! on deny it records the attempted location in session-scoped storage so the
//! login screen can send the user back there.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::identity::{authorizer, Identity, Permission, Role, SessionStore};
use crate::storage::{ClientStorage, SharedStorage, REDIRECT_URL_KEY};

use super::navigator::Navigator;
use super::route::{GuardKind, Location, Resolved, RouteDef, RouteName, RouteRequirement, RouteTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    NotAuthenticated,
    AccessDenied,
    InsufficientPermissions,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::NotAuthenticated => "not_authenticated",
            DenyReason::AccessDenied => "access_denied",
            DenyReason::InsufficientPermissions => "insufficient_permissions",
        }
    }

    pub fn parse(s: &str) -> Option<DenyReason> {
        match s {
            "not_authenticated" => Some(DenyReason::NotAuthenticated),
            "access_denied" => Some(DenyReason::AccessDenied),
            "insufficient_permissions" => Some(DenyReason::InsufficientPermissions),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Deny { redirect: Location, reason: DenyReason },
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool { matches!(self, GuardDecision::Allow) }
}

pub fn auth_guard(target: &Location, identity: Option<&Identity>, session_scope: &dyn ClientStorage) -> GuardDecision {
    if identity.is_some() {
        return GuardDecision::Allow;
    }
    let attempted = target.to_string();
    if let Err(e) = crate::storage::set_json(session_scope, REDIRECT_URL_KEY, &attempted) {
        warn!(target: "guard", "could not record redirect path '{}': {}", attempted, e);
    }
    info!(target: "guard", "auth guard: not authenticated, attempted '{}'", attempted);
    GuardDecision::Deny { redirect: Location::route(RouteName::Login), reason: DenyReason::NotAuthenticated }
}

pub fn role_guard(
    target: &Location,
    required: &[Role],
    identity: Option<&Identity>,
    session_scope: &dyn ClientStorage,
) -> GuardDecision {
    let decision = auth_guard(target, identity, session_scope);
    let Some(ident) = identity else { return decision; };
    if required.is_empty() || authorizer::has_any_role(ident, required) {
        debug!(target: "guard", "role guard: '{}' allowed for role {}", target, ident.role);
        return GuardDecision::Allow;
    }
    info!(target: "guard", "role guard: role {} not in {:?} for '{}'", ident.role, required, target);
    GuardDecision::Deny {
        redirect: Location::route(RouteName::Dashboard).with_query("error", DenyReason::AccessDenied.as_str()),
        reason: DenyReason::AccessDenied,
    }
}

pub fn permission_guard(
    target: &Location,
    required: &[Permission],
    identity: Option<&Identity>,
    session_scope: &dyn ClientStorage,
) -> GuardDecision {
    let decision = auth_guard(target, identity, session_scope);
    let Some(ident) = identity else { return decision; };
    if authorizer::has_all_permissions(ident, required) {
        debug!(target: "guard", "permission guard: '{}' allowed", target);
        return GuardDecision::Allow;
    }
    info!(
        target: "guard",
        "permission guard: {:?} do not cover {:?} for '{}'",
        ident.permissions, required, target
    );
    GuardDecision::Deny {
        redirect: Location::route(RouteName::Dashboard).with_query("error", DenyReason::InsufficientPermissions.as_str()),
        reason: DenyReason::InsufficientPermissions,
    }
}

/// Evaluate the guard a route declares.
pub fn evaluate_route(
    def: &RouteDef,
    target: &Location,
    identity: Option<&Identity>,
    session_scope: &dyn ClientStorage,
) -> GuardDecision {
    let no_roles: &[Role] = &[];
    let no_perms: &[Permission] = &[];
    match def.guard {
        GuardKind::Public => GuardDecision::Allow,
        GuardKind::Authenticated => auth_guard(target, identity, session_scope),
        GuardKind::Role => {
            let roles = match &def.requirement { RouteRequirement::Roles(r) => r.as_slice(), _ => no_roles };
            role_guard(target, roles, identity, session_scope)
        }
        GuardKind::Permission => {
            let perms = match &def.requirement { RouteRequirement::Permissions(p) => p.as_slice(), _ => no_perms };
            permission_guard(target, perms, identity, session_scope)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    Arrived(Location),
    /// The attempt was terminal; the user ends up at `to`.
    Redirected { attempted: Location, to: Location, reason: Option<DenyReason> },
}

impl NavigationOutcome {
    pub fn location(&self) -> &Location {
        match self {
            NavigationOutcome::Arrived(l) => l,
            NavigationOutcome::Redirected { to, .. } => to,
        }
    }
}

/// Route table + guard chain + navigator. One synchronous evaluation per attempt, no retries.
pub struct Router {
    table: RouteTable,
    session: Arc<SessionStore>,
    session_scope: SharedStorage,
    navigator: Arc<Navigator>,
}

impl Router {
    pub fn new(table: RouteTable, session: Arc<SessionStore>, session_scope: SharedStorage, navigator: Arc<Navigator>) -> Self {
        Self { table, session, session_scope, navigator }
    }

    pub fn table(&self) -> &RouteTable { &self.table }

    /// Decide without moving.
    pub fn check(&self, target: &Location) -> Result<GuardDecision, RouteName> {
        match self.table.resolve(target) {
            Resolved::Route(def) => {
                let ident = self.session.current();
                Ok(evaluate_route(def, target, ident.as_ref(), self.session_scope.as_ref()))
            }
            Resolved::Redirect(name) => Err(name),
        }
    }

    pub fn navigate(&self, raw: &str) -> NavigationOutcome {
        let target = Location::parse(raw);
        let outcome = match self.check(&target) {
            Ok(GuardDecision::Allow) => NavigationOutcome::Arrived(target),
            Ok(GuardDecision::Deny { redirect, reason }) => {
                NavigationOutcome::Redirected { attempted: target, to: redirect, reason: Some(reason) }
            }
            Err(fallback) => NavigationOutcome::Redirected { attempted: target, to: Location::route(fallback), reason: None },
        };
        self.navigator.force(outcome.location().clone());
        outcome
    }

    /// Read and clear the path recorded by the authentication guard.
    pub fn take_redirect_path(&self) -> Option<String> {
        let path = crate::storage::get_json::<String>(self.session_scope.as_ref(), REDIRECT_URL_KEY);
        if let Err(e) = self.session_scope.remove(REDIRECT_URL_KEY) {
            warn!(target: "guard", "could not clear redirect path: {}", e);
        }
        path
    }
}
