use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Process-wide count of in-flight remote calls. The loading indicator is
/// visible iff the count is above zero; the count never goes below zero.
#[derive(Debug)]
pub struct LoadingTracker {
    in_flight: Mutex<usize>,
    tx: watch::Sender<bool>,
}

impl Default for LoadingTracker {
    fn default() -> Self { Self::new() }
}

impl LoadingTracker {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { in_flight: Mutex::new(0), tx }
    }

    pub fn show(&self) {
        let mut n = self.in_flight.lock();
        *n += 1;
        debug!(target: "loading", "in_flight={}", *n);
        self.tx.send_if_modified(|v| !std::mem::replace(v, true));
    }

    /// Extra hides are ignored.
    pub fn hide(&self) {
        let mut n = self.in_flight.lock();
        if *n == 0 {
            warn!(target: "loading", "hide() with no call in flight");
            return;
        }
        *n -= 1;
        debug!(target: "loading", "in_flight={}", *n);
        let visible = *n > 0;
        self.tx.send_if_modified(|v| std::mem::replace(v, visible) != visible);
    }

    pub fn in_flight(&self) -> usize { *self.in_flight.lock() }

    pub fn is_loading(&self) -> bool { *self.tx.borrow() }

    pub fn subscribe(&self) -> watch::Receiver<bool> { self.tx.subscribe() }

    /// Count one call in flight until the returned guard drops.
    pub fn begin(self: &Arc<Self>) -> LoadingGuard {
        self.show();
        LoadingGuard { tracker: self.clone() }
    }
}

/// Releases its slot exactly once, on drop, whether the call finished, failed or was abandoned.
#[derive(Debug)]
pub struct LoadingGuard {
    tracker: Arc<LoadingTracker>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) { self.tracker.hide(); }
}
