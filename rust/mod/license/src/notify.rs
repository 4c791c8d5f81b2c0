//! Transient user feedback.
//!
//! Stores push a [`Notification`] for every operation outcome. Entries
//! expire after [`DEFAULT_TTL`] unless dismissed first. Subscribers are
//! called synchronously on every push, in subscription order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// How long a notification stays visible.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
    expires_at: Instant,
}

impl Notification {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Handle returned by [`Notifications::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type NotificationHandler = Arc<dyn Fn(&Notification) + Send + Sync>;

struct Inner {
    entries: RwLock<Vec<Notification>>,
    handlers: RwLock<Vec<(SubscriptionId, NotificationHandler)>>,
    next_id: AtomicU64,
    ttl: Duration,
}

/// Shared notification channel. Cloning yields another handle to the
/// same channel.
#[derive(Clone)]
pub struct Notifications {
    inner: Arc<Inner>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: RwLock::new(Vec::new()),
                handlers: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(1),
                ttl,
            }),
        }
    }

    /// Show a message. Returns its id for [`dismiss`](Self::dismiss).
    pub fn push(&self, kind: NotificationKind, message: impl Into<String>) -> String {
        let now = Instant::now();
        let notification = Notification {
            id: uuid::Uuid::new_v4().simple().to_string(),
            kind,
            message: message.into(),
            created_at: Utc::now(),
            expires_at: now + self.inner.ttl,
        };
        let id = notification.id.clone();
        {
            let mut entries = self.inner.entries.write().unwrap_or_else(PoisonError::into_inner);
            entries.retain(|n| n.is_live(now));
            entries.push(notification.clone());
        }
        // Snapshot handlers so a handler may subscribe or unsubscribe.
        let handlers: Vec<NotificationHandler> = self
            .inner
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, h)| h.clone())
            .collect();
        for handler in handlers {
            handler(&notification);
        }
        id
    }

    pub fn success(&self, message: impl Into<String>) -> String {
        self.push(NotificationKind::Success, message)
    }

    pub fn error(&self, message: impl Into<String>) -> String {
        self.push(NotificationKind::Error, message)
    }

    pub fn warning(&self, message: impl Into<String>) -> String {
        self.push(NotificationKind::Warning, message)
    }

    pub fn info(&self, message: impl Into<String>) -> String {
        self.push(NotificationKind::Info, message)
    }

    /// Remove a notification before it expires. Returns whether it was
    /// still showing.
    pub fn dismiss(&self, id: &str) -> bool {
        let now = Instant::now();
        let mut entries = self.inner.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|n| n.id != id);
        let removed = entries.len() != before;
        entries.retain(|n| n.is_live(now));
        removed
    }

    /// Notifications still visible now, oldest first.
    pub fn active(&self) -> Vec<Notification> {
        self.active_at(Instant::now())
    }

    pub fn active_at(&self, now: Instant) -> Vec<Notification> {
        self.inner
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|n| n.is_live(now))
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.inner.entries.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(handler)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(sid, _)| *sid != id);
    }
}

impl Default for Notifications {
    fn default() -> Self {
        Self::new()
    }
}
