use tracing::{debug, info};

use super::{Activity, Cache, StoreContext, StoreError, StoreResult};
use crate::model::{Decision, LicenseRequest, NewRequest};

/// Cached license requests and the approval workflow.
///
/// ```text
/// create ──▶ pending ──approve──▶ approved
///                    ──reject───▶ rejected
/// ```
///
/// A request the cache already knows to be terminal is refused without a
/// network call. Anything else is left to the service, which rejects a
/// second decision on the same request.
pub struct RequestStore {
    ctx: StoreContext,
    cache: Cache<LicenseRequest>,
    activity: Activity,
}

impl RequestStore {
    pub fn new(ctx: StoreContext) -> Self {
        Self {
            ctx,
            cache: Cache::new(),
            activity: Activity::default(),
        }
    }

    /// Fetch every request and replace the cache.
    pub async fn list(&self) -> StoreResult<Vec<LicenseRequest>> {
        let _busy = self.activity.begin();
        match self.ctx.api.list_requests().await {
            Ok(requests) => {
                if self.ctx.is_live() {
                    debug!(count = requests.len(), "requests cache replaced");
                    self.cache.replace_all(requests.clone());
                }
                Ok(requests)
            }
            Err(e) => Err(self.ctx.failure(e.into(), "Failed to load license requests")),
        }
    }

    /// Fetch pending requests and merge them into the cache.
    pub async fn pending(&self) -> StoreResult<Vec<LicenseRequest>> {
        let _busy = self.activity.begin();
        match self.ctx.api.pending_requests().await {
            Ok(requests) => {
                self.merge(&requests);
                Ok(requests)
            }
            Err(e) => Err(self.ctx.failure(e.into(), "Failed to load pending requests")),
        }
    }

    /// Fetch one customer's requests and merge them into the cache.
    pub async fn for_customer(&self, customer_id: &str) -> StoreResult<Vec<LicenseRequest>> {
        let _busy = self.activity.begin();
        match self.ctx.api.customer_requests(customer_id).await {
            Ok(requests) => {
                self.merge(&requests);
                Ok(requests)
            }
            Err(e) => Err(self.ctx.failure(e.into(), "Failed to load license requests")),
        }
    }

    pub async fn get(&self, id: &str) -> StoreResult<LicenseRequest> {
        let _busy = self.activity.begin();
        match self.ctx.api.get_request(id).await {
            Ok(request) => {
                if self.ctx.is_live() {
                    self.cache.upsert(request.clone());
                }
                Ok(request)
            }
            Err(e) => Err(self.ctx.failure(e.into(), "Failed to load license request")),
        }
    }

    /// Submit a new request. The record the service returns is appended.
    ///
    /// On failure the error is notified *and* returned, so a form can keep
    /// its own submitting state accurate.
    pub async fn create(&self, request: &NewRequest) -> StoreResult<LicenseRequest> {
        let _busy = self.activity.begin();
        match self.ctx.api.create_request(request).await {
            Ok(created) => {
                info!(id = %created.id, customer = %created.customer_id, "license request submitted");
                if self.ctx.is_live() {
                    self.cache.upsert(created.clone());
                }
                self.ctx.success("License request submitted successfully");
                Ok(created)
            }
            Err(e) => Err(self.ctx.failure(e.into(), "Failed to submit license request")),
        }
    }

    pub async fn approve(&self, id: &str, notes: Option<&str>) -> StoreResult<LicenseRequest> {
        self.decide(id, Decision::Approve, notes).await
    }

    pub async fn reject(&self, id: &str, notes: Option<&str>) -> StoreResult<LicenseRequest> {
        self.decide(id, Decision::Reject, notes).await
    }

    async fn decide(
        &self,
        id: &str,
        decision: Decision,
        notes: Option<&str>,
    ) -> StoreResult<LicenseRequest> {
        let fallback = match decision {
            Decision::Approve => "Failed to approve request",
            Decision::Reject => "Failed to reject request",
        };

        if let Some(cached) = self.cache.get(id) {
            if cached.status.is_terminal() {
                let err = StoreError::AlreadyProcessed {
                    id: id.to_string(),
                    status: cached.status,
                };
                return Err(self.ctx.failure(err, fallback));
            }
        }

        let _busy = self.activity.begin();
        match self.ctx.api.decide_request(id, decision, notes).await {
            Ok(updated) => {
                info!(id, status = %updated.status, "license request {}", decision.verb());
                if self.ctx.is_live() {
                    self.cache.upsert(updated.clone());
                }
                self.ctx.success(&format!("Request {} successfully", decision.verb()));
                Ok(updated)
            }
            Err(e) => Err(self.ctx.failure(e.into(), fallback)),
        }
    }

    fn merge(&self, requests: &[LicenseRequest]) {
        if self.ctx.is_live() {
            debug!(count = requests.len(), "requests merged into cache");
            self.cache.merge(requests.to_vec());
        }
    }

    pub fn snapshot(&self) -> Vec<LicenseRequest> {
        self.cache.snapshot()
    }

    pub fn cached(&self, id: &str) -> Option<LicenseRequest> {
        self.cache.get(id)
    }

    pub fn is_loading(&self) -> bool {
        self.activity.is_busy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, Harness};
    use crate::model::RequestStatus;
    use crate::notify::NotificationKind;

    // ========================================================================
    // list
    // ========================================================================

    #[tokio::test]
    async fn list_replaces_cache() {
        let h = Harness::new();
        h.api.seed_request(fixtures::request("r1", "c1", RequestStatus::Pending));
        h.api.seed_request(fixtures::request("r2", "c2", RequestStatus::Approved));
        let store = RequestStore::new(h.ctx());

        let got = store.list().await.unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(store.snapshot(), got);
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn unlisted_license_type_is_cached_and_decidable() {
        let h = Harness::new();
        let mut odd = fixtures::request("r1", "c1", RequestStatus::Pending);
        odd.license_type = "Adobe".into();
        h.api.seed_request(odd);
        h.api.seed_request(fixtures::request("r2", "c1", RequestStatus::Pending));
        let store = RequestStore::new(h.ctx());

        assert_eq!(store.list().await.unwrap().len(), 2);
        let approved = store.approve("r1", None).await.unwrap();
        assert_eq!(approved.license_type, "Adobe");
        assert_eq!(store.cached("r1").unwrap().status, RequestStatus::Approved);
    }

    #[tokio::test]
    async fn list_failure_keeps_prior_cache() {
        let h = Harness::new();
        h.api.seed_request(fixtures::request("r1", "c1", RequestStatus::Pending));
        let store = RequestStore::new(h.ctx());
        store.list().await.unwrap();

        h.api.set_offline(true);
        let err = store.list().await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert_eq!(store.snapshot().len(), 1);

        let last = h.notifications.active().pop().unwrap();
        assert_eq!(last.kind, NotificationKind::Error);
        assert_eq!(last.message, "Service unavailable");
    }

    // ========================================================================
    // create
    // ========================================================================

    #[tokio::test]
    async fn create_appends_server_record_as_pending() {
        let h = Harness::new();
        let store = RequestStore::new(h.ctx());

        let created = store.create(&fixtures::new_request("c1")).await.unwrap();
        assert_eq!(created.status, RequestStatus::Pending);
        assert!(!created.id.is_empty());
        assert_eq!(store.snapshot(), vec![created]);

        let note = h.notifications.active().pop().unwrap();
        assert_eq!(note.kind, NotificationKind::Success);
        assert_eq!(note.message, "License request submitted successfully");
    }

    #[tokio::test]
    async fn create_failure_propagates_and_leaves_cache() {
        let h = Harness::new();
        let store = RequestStore::new(h.ctx());
        h.api.set_offline(true);

        assert!(store.create(&fixtures::new_request("c1")).await.is_err());
        assert!(store.snapshot().is_empty());
        assert_eq!(h.notifications.active().len(), 1);
    }

    // ========================================================================
    // approve / reject
    // ========================================================================

    #[tokio::test]
    async fn approve_replaces_cached_record() {
        let h = Harness::new();
        h.api.set_processor("admin@msp.io");
        let store = RequestStore::new(h.ctx());
        let r = store.create(&fixtures::new_request("c1")).await.unwrap();

        let approved = store.approve(&r.id, Some("ok")).await.unwrap();
        assert_eq!(approved.status, RequestStatus::Approved);
        assert!(approved.processed_date.is_some());
        assert_eq!(approved.processed_by.as_deref(), Some("admin@msp.io"));
        assert_eq!(store.cached(&r.id), Some(approved));
        assert_eq!(
            h.notifications.active().pop().unwrap().message,
            "Request approved successfully"
        );
    }

    #[tokio::test]
    async fn second_decision_refused_locally() {
        let h = Harness::new();
        let store = RequestStore::new(h.ctx());
        let r = store.create(&fixtures::new_request("c1")).await.unwrap();
        store.approve(&r.id, None).await.unwrap();

        let calls = h.api.calls();
        let err = store.approve(&r.id, None).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyProcessed { status: RequestStatus::Approved, .. }));
        let err = store.reject(&r.id, None).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyProcessed { .. }));
        assert_eq!(h.api.calls(), calls);
        assert_eq!(store.cached(&r.id).unwrap().status, RequestStatus::Approved);
    }

    #[tokio::test]
    async fn stale_cache_defers_to_service() {
        let h = Harness::new();
        h.api.seed_request(fixtures::request("r1", "c1", RequestStatus::Pending));
        let a = RequestStore::new(h.ctx());
        let b = RequestStore::new(h.ctx());
        a.list().await.unwrap();
        b.list().await.unwrap();

        a.reject("r1", Some("duplicate")).await.unwrap();
        // `b` still believes r1 is pending; the service refuses.
        let err = b.approve("r1", None).await.unwrap_err();
        assert_eq!(err.status(), Some(409));
        assert_eq!(b.cached("r1").unwrap().status, RequestStatus::Pending);
        assert_eq!(
            h.notifications.active().pop().unwrap().message,
            "Request is already rejected"
        );
    }

    #[tokio::test]
    async fn for_customer_merges() {
        let h = Harness::new();
        h.api.seed_request(fixtures::request("r1", "c1", RequestStatus::Pending));
        h.api.seed_request(fixtures::request("r2", "c2", RequestStatus::Pending));
        let store = RequestStore::new(h.ctx());

        let mine = store.for_customer("c1").await.unwrap();
        assert_eq!(mine.len(), 1);
        store.pending().await.unwrap();
        assert_eq!(store.snapshot().len(), 2);
    }

    // ========================================================================
    // liveness
    // ========================================================================

    #[tokio::test]
    async fn dead_store_returns_but_does_not_cache() {
        let h = Harness::new();
        let store = RequestStore::new(h.ctx());
        h.liveness.kill();

        let created = store.create(&fixtures::new_request("c1")).await.unwrap();
        assert_eq!(created.status, RequestStatus::Pending);
        assert!(store.snapshot().is_empty());
        assert!(h.notifications.active().is_empty());
    }
}
