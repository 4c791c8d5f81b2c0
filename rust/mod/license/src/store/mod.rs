//! Client-side caches over the license service.
//!
//! Every store follows the same shape:
//!
//! 1. mark itself busy for the duration of the call;
//! 2. call the service;
//! 3. on success, write the server's record into the cache and push a
//!    success notification (mutations only);
//! 4. on failure, leave the cache alone, push an error notification, and
//!    return the error.
//!
//! Once the owning [`AppContext`](crate::context::AppContext) is torn down
//! a store is no longer live: late responses are still returned to the
//! caller but neither touch the cache nor notify.

mod analytics;
mod cache;
mod customers;
mod licenses;
mod requests;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use msp_client::ApiError;

use crate::api::LicenseApi;
use crate::model::RequestStatus;
use crate::notify::Notifications;

pub use analytics::AnalyticsStore;
pub use cache::{Cache, Record};
pub use customers::CustomerStore;
pub use licenses::LicenseStore;
pub use requests::RequestStore;

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Refused locally: the cached request already reached a terminal
    /// state.
    #[error("request {id} is already {status}")]
    AlreadyProcessed { id: String, status: RequestStatus },

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// The service answered with a license owned by someone else.
    #[error("license {id} belongs to customer {actual}, not {expected}")]
    OwnerMismatch { id: String, expected: String, actual: String },

    #[error("not signed in")]
    Unauthenticated,
}

impl StoreError {
    /// Text for an error notification: the service's own message when it
    /// sent one, else `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            StoreError::Api(e) => e.server_message().unwrap_or(fallback).to_string(),
            StoreError::AlreadyProcessed { status, .. } => format!("Request is already {status}"),
            other => other.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Api(e) => e.status(),
            _ => None,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Liveness
// ---------------------------------------------------------------------------

/// Shared flag cleared when the owning context is torn down.
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_live(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn kill(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

/// In-flight call counter behind a store's `is_loading()`.
#[derive(Debug, Default)]
pub(crate) struct Activity(AtomicUsize);

impl Activity {
    pub(crate) fn begin(&self) -> Busy<'_> {
        self.0.fetch_add(1, Ordering::AcqRel);
        Busy(&self.0)
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire) > 0
    }
}

/// Clears one unit of activity on drop, including on early return.
pub(crate) struct Busy<'a>(&'a AtomicUsize);

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

// ---------------------------------------------------------------------------
// StoreContext
// ---------------------------------------------------------------------------

/// What every store is built from: the service, the notification channel
/// and the liveness flag of the context that created it.
#[derive(Clone)]
pub struct StoreContext {
    pub(crate) api: Arc<dyn LicenseApi>,
    pub(crate) notifications: Notifications,
    pub(crate) liveness: Liveness,
}

impl StoreContext {
    pub fn new(api: Arc<dyn LicenseApi>, notifications: Notifications, liveness: Liveness) -> Self {
        Self { api, notifications, liveness }
    }

    pub fn is_live(&self) -> bool {
        self.liveness.is_live()
    }

    pub(crate) fn success(&self, message: &str) {
        if self.is_live() {
            self.notifications.success(message);
        }
    }

    /// Push an error notification for `err` and hand it back.
    pub(crate) fn failure(&self, err: StoreError, fallback: &str) -> StoreError {
        tracing::warn!(error = %err, "{fallback}");
        if self.is_live() {
            self.notifications.error(err.user_message(fallback));
        }
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_prefers_server_text() {
        let e = StoreError::from(ApiError::Server { status: 409, message: "Request already processed".into() });
        assert_eq!(e.user_message("Failed to approve request"), "Request already processed");
        assert_eq!(e.status(), Some(409));

        let e = StoreError::from(ApiError::Server { status: 500, message: String::new() });
        assert_eq!(e.user_message("Failed to approve request"), "Failed to approve request");

        let e = StoreError::AlreadyProcessed { id: "r1".into(), status: RequestStatus::Rejected };
        assert_eq!(e.user_message("x"), "Request is already rejected");
    }

    #[test]
    fn busy_guard_balances() {
        let a = Activity::default();
        assert!(!a.is_busy());
        {
            let _one = a.begin();
            let _two = a.begin();
            assert!(a.is_busy());
        }
        assert!(!a.is_busy());
    }

    #[test]
    fn liveness_is_shared() {
        let l = Liveness::new();
        let m = l.clone();
        m.kill();
        assert!(!l.is_live());
    }
}
