//! Navigation boundary: named routes, guard chain and the current location.

mod route;
mod guard;
mod navigator;
mod notice;

pub use route::{GuardKind, Location, Resolved, RouteDef, RouteName, RouteRequirement, RouteTable};
pub use guard::{
    auth_guard, evaluate_route, permission_guard, role_guard, DenyReason, GuardDecision, NavigationOutcome, Router,
};
pub use navigator::Navigator;
pub use notice::{AccessNotice, DEFAULT_NOTICE_SECS};
