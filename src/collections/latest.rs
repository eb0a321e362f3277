use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

/// A query registered with `LatestSearch::issue`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub generation: u64,
    /// What is being searched, e.g. a collection name.
    pub scope: String,
    pub query: String,
}

/// Debounced, latest-wins search.
///
/// Every new query bumps the generation; a search whose generation is no
/// longer current when it resolves is discarded, so results never show out
/// of order. A query equal to the last applied one in the same scope is
/// skipped until `reset` is called.
#[derive(Debug)]
pub struct LatestSearch {
    generation: AtomicU64,
    debounce: Duration,
    last_applied: Mutex<Option<(String, String)>>,
}

impl LatestSearch {
    pub fn new(debounce: Duration) -> Self {
        Self { generation: AtomicU64::new(0), debounce, last_applied: Mutex::new(None) }
    }

    pub fn debounce(&self) -> Duration { self.debounce }

    pub fn issue(&self, scope: &str, query: &str) -> SearchTicket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        SearchTicket { generation, scope: scope.to_string(), query: query.trim().to_string() }
    }

    fn already_applied(&self, ticket: &SearchTicket) -> bool {
        self.last_applied
            .lock()
            .as_ref()
            .is_some_and(|(scope, query)| *scope == ticket.scope && *query == ticket.query)
    }

    pub fn is_current(&self, ticket: &SearchTicket) -> bool { self.generation.load(Ordering::SeqCst) == ticket.generation }

    /// Forget the last applied query so the next identical one runs again (after data changed).
    pub fn reset(&self) { *self.last_applied.lock() = None; }

    /// `None` when superseded during the debounce window or while searching, or when nothing changed.
    pub async fn run<F, Fut, T>(&self, scope: &str, query: &str, search: F) -> Option<T>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = T>,
    {
        let ticket = self.issue(scope, query);
        tokio::time::sleep(self.debounce).await;
        if !self.is_current(&ticket) {
            debug!(target: "search", "query '{}' superseded before dispatch", ticket.query);
            return None;
        }
        if self.already_applied(&ticket) {
            return None;
        }
        let out = search(ticket.query.clone()).await;
        if !self.is_current(&ticket) {
            debug!(target: "search", "discarding stale results for '{}'", ticket.query);
            return None;
        }
        *self.last_applied.lock() = Some((ticket.scope, ticket.query));
        Some(out)
    }
}
