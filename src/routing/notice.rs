use chrono::{DateTime, Duration, Utc};

use super::guard::DenyReason;
use super::route::Location;

pub const DEFAULT_NOTICE_SECS: i64 = 5;

/// User-visible message derived from a guard denial's `error` query parameter.
/// Disappears on its own once `dismiss_after` has elapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessNotice {
    pub reason: DenyReason,
    pub shown_at: DateTime<Utc>,
    pub dismiss_after: Duration,
}

impl AccessNotice {
    pub fn from_location(loc: &Location, now: DateTime<Utc>, dismiss_after: Duration) -> Option<Self> {
        let reason = DenyReason::parse(loc.query.get("error")?)?;
        match reason {
            DenyReason::NotAuthenticated => None,
            _ => Some(Self { reason, shown_at: now, dismiss_after }),
        }
    }

    pub fn message(&self) -> &'static str {
        match self.reason {
            DenyReason::AccessDenied => "Access Denied: You do not have permission to access that page.",
            DenyReason::InsufficientPermissions => "Insufficient Permissions: You need additional permissions to access that page.",
            DenyReason::NotAuthenticated => "Please login to continue.",
        }
    }

    pub fn is_visible(&self, now: DateTime<Utc>) -> bool { now < self.shown_at + self.dismiss_after }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::RouteName;

    #[test]
    fn notice_expires_after_delay() {
        let now = Utc::now();
        let loc = Location::route(RouteName::Dashboard).with_query("error", "access_denied");
        let n = AccessNotice::from_location(&loc, now, Duration::seconds(DEFAULT_NOTICE_SECS)).unwrap();
        assert!(n.message().starts_with("Access Denied"));
        assert!(n.is_visible(now + Duration::seconds(4)));
        assert!(!n.is_visible(now + Duration::seconds(5)));
    }

    #[test]
    fn unknown_or_missing_reason_yields_nothing() {
        let now = Utc::now();
        let d = Duration::seconds(5);
        assert!(AccessNotice::from_location(&Location::route(RouteName::Dashboard), now, d).is_none());
        let loc = Location::route(RouteName::Dashboard).with_query("error", "whatever");
        assert!(AccessNotice::from_location(&loc, now, d).is_none());
    }
}
