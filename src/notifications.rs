//!
//! notifications
//! -------------
//! Ordered, newest-first list of user-facing notices. Every mutation publishes
//! the whole list to subscribers; the unread count is derived from it.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: u64,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
    pub icon: String,
}

/// What a caller supplies; id and timestamp are assigned on add.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub icon: String,
}

impl NewNotification {
    pub fn new(severity: Severity, title: impl Into<String>, message: impl Into<String>) -> Self {
        let icon = match severity {
            Severity::Info => "bi-info-circle-fill",
            Severity::Success => "bi-check-circle-fill",
            Severity::Warning => "bi-exclamation-triangle-fill",
            Severity::Error => "bi-x-circle-fill",
        };
        Self { title: title.into(), message: message.into(), severity, icon: icon.to_string() }
    }

    pub fn icon(mut self, icon: &str) -> Self {
        self.icon = icon.to_string();
        self
    }
}

pub struct NotificationStore {
    list: Mutex<Vec<Notification>>,
    next_id: AtomicU64,
    tx: watch::Sender<Vec<Notification>>,
}

impl Default for NotificationStore {
    fn default() -> Self { Self::new() }
}

impl NotificationStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Vec::new());
        Self { list: Mutex::new(Vec::new()), next_id: AtomicU64::new(1), tx }
    }

    /// A store preloaded with the demo notices shown on first start.
    pub fn with_defaults(now: DateTime<Utc>) -> Self {
        let store = Self::new();
        store.seed_defaults(now);
        store
    }

    pub fn seed_defaults(&self, now: DateTime<Utc>) {
        let demo = [
            (Severity::Success, "New Student Admission", "Ahmed Ali has been admitted to Class 10-A", "bi-person-plus-fill", 5, false),
            (Severity::Info, "Parent-Teacher Meeting", "PTM scheduled for Saturday, 10 AM in main hall", "bi-calendar-event-fill", 30, false),
            (Severity::Success, "Fee Payment Received", "Monthly fee received from Sara Khan (Class 9-B)", "bi-cash-coin", 120, true),
            (Severity::Warning, "Low Attendance Alert", "Class 8-C has only 65% attendance today", "bi-exclamation-triangle-fill", 300, false),
            (Severity::Info, "Exam Schedule Updated", "Mid-term exams will start from 15th December", "bi-journal-text", 1440, true),
        ];
        let mut list = self.list.lock();
        list.clear();
        for (severity, title, message, icon, minutes_ago, read) in demo {
            list.push(Notification {
                id: self.next_id.fetch_add(1, Ordering::Relaxed),
                title: title.to_string(),
                message: message.to_string(),
                severity,
                timestamp: now - Duration::minutes(minutes_ago),
                read,
                icon: icon.to_string(),
            });
        }
        self.tx.send_replace(list.clone());
    }

    pub fn list(&self) -> Vec<Notification> { self.list.lock().clone() }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Notification>> { self.tx.subscribe() }

    pub fn unread_count(&self) -> usize { self.list.lock().iter().filter(|n| !n.read).count() }

    /// Prepend a notice and return its id. Ids are unique for the life of the store.
    pub fn add(&self, new: NewNotification) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(target: "notifications", "add id={} title='{}'", id, new.title);
        self.update(|list| {
            list.insert(
                0,
                Notification {
                    id,
                    title: new.title,
                    message: new.message,
                    severity: new.severity,
                    timestamp: Utc::now(),
                    read: false,
                    icon: new.icon,
                },
            );
        });
        id
    }

    pub fn mark_as_read(&self, id: u64) {
        self.update(|list| {
            if let Some(n) = list.iter_mut().find(|n| n.id == id) {
                n.read = true;
            }
        });
    }

    pub fn mark_all_as_read(&self) {
        self.update(|list| list.iter_mut().for_each(|n| n.read = true));
    }

    pub fn delete(&self, id: u64) {
        self.update(|list| list.retain(|n| n.id != id));
    }

    fn update<F: FnOnce(&mut Vec<Notification>)>(&self, f: F) {
        let mut list = self.list.lock();
        f(&mut list);
        self.tx.send_replace(list.clone());
    }
}

/// Short relative age for list display ("5m ago").
pub fn relative_age(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let mins = (now - ts).num_minutes();
    if mins < 1 {
        "just now".to_string()
    } else if mins < 60 {
        format!("{}m ago", mins)
    } else if mins < 1440 {
        format!("{}h ago", mins / 60)
    } else {
        format!("{}d ago", mins / 1440)
    }
}
