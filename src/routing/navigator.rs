use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;

use super::route::{Location, RouteName};

const HISTORY_LIMIT: usize = 64;

/// Holds the current location and publishes every change.
///
/// The navigator applies no policy; guarded navigation goes through
/// [`super::Router`], while forced redirects (logout, 401 handling) call
/// [`Navigator::force`] directly.
pub struct Navigator {
    tx: watch::Sender<Location>,
    history: Mutex<Vec<Location>>,
}

impl Navigator {
    pub fn new(start: Location) -> Self {
        let (tx, _rx) = watch::channel(start);
        Self { tx, history: Mutex::new(Vec::new()) }
    }

    pub fn current(&self) -> Location { self.tx.borrow().clone() }

    pub fn subscribe(&self) -> watch::Receiver<Location> { self.tx.subscribe() }

    /// Move to `to` without consulting any guard.
    pub fn force(&self, to: Location) {
        let mut hist = self.history.lock();
        let prev = self.tx.send_replace(to.clone());
        hist.push(prev);
        if hist.len() > HISTORY_LIMIT {
            let overflow = hist.len() - HISTORY_LIMIT;
            hist.drain(0..overflow);
        }
        debug!(target: "guard", "navigated to {}", to);
    }

    pub fn force_route(&self, name: RouteName) { self.force(Location::route(name)); }

    /// Previously visited locations, oldest first.
    pub fn history(&self) -> Vec<Location> { self.history.lock().clone() }
}

impl Default for Navigator {
    fn default() -> Self { Self::new(Location::route(RouteName::Login)) }
}
