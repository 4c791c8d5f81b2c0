//! Application root.
//!
//! `AppContext` owns the session, the notification channel and the
//! service handle. It is created once with [`AppContext::init`] and hands
//! out stores bound to its current lifetime. [`AppContext::teardown`]
//! ends that lifetime: stores created before it stop writing to their
//! caches and stop notifying, while stores created afterwards start
//! fresh.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use msp_client::ApiError;
use tracing::info;

use crate::api::{HttpLicenseApi, LicenseApi};
use crate::guard::Navigator;
use crate::model::{Credentials, User};
use crate::notify::Notifications;
use crate::session::Session;
use crate::store::{
    AnalyticsStore, CustomerStore, LicenseStore, Liveness, RequestStore, StoreContext, StoreError, StoreResult,
};

pub struct AppContext {
    api: Arc<dyn LicenseApi>,
    session: Session,
    notifications: Notifications,
    liveness: RwLock<Liveness>,
}

impl AppContext {
    pub fn init(api: Arc<dyn LicenseApi>, session: Session) -> Self {
        Self {
            api,
            session,
            notifications: Notifications::new(),
            liveness: RwLock::new(Liveness::new()),
        }
    }

    /// Context talking HTTP to `base_url`, authenticating with whatever
    /// token the session holds.
    pub fn connect(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let session = Session::new();
        let api = HttpLicenseApi::connect(base_url, Arc::new(session.clone()), timeout)?;
        Ok(Self::init(Arc::new(api), session))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn api(&self) -> Arc<dyn LicenseApi> {
        self.api.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.session.user()
    }

    /// Sign in and establish the session.
    pub async fn login(&self, email: &str, password: &str) -> StoreResult<User> {
        let credentials = Credentials {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        match self.api.login(&credentials).await {
            Ok(auth) => {
                info!(user = %auth.user.email, role = %auth.user.role, "signed in");
                self.session.establish(auth.user.clone(), auth.token);
                Ok(auth.user)
            }
            Err(e) => {
                self.session.resolve_anonymous();
                Err(self.store_context().failure(e.into(), "Login failed"))
            }
        }
    }

    /// Resume a session from a saved token.
    pub fn restore(&self, user: User, token: impl Into<String>) {
        self.session.establish(user, token);
    }

    /// The signed-in user, or [`StoreError::Unauthenticated`].
    pub fn require_user(&self) -> StoreResult<User> {
        self.session.user().ok_or(StoreError::Unauthenticated)
    }

    pub fn store_context(&self) -> StoreContext {
        let liveness = self.liveness.read().unwrap_or_else(PoisonError::into_inner).clone();
        StoreContext::new(self.api.clone(), self.notifications.clone(), liveness)
    }

    pub fn requests(&self) -> RequestStore {
        RequestStore::new(self.store_context())
    }

    pub fn customers(&self) -> CustomerStore {
        CustomerStore::new(self.store_context())
    }

    pub fn licenses(&self) -> LicenseStore {
        LicenseStore::new(self.store_context())
    }

    pub fn analytics(&self) -> AnalyticsStore {
        AnalyticsStore::new(self.store_context())
    }

    pub fn navigator(&self) -> Navigator {
        Navigator::new(self.session.clone())
    }

    /// Detach every store handed out so far and drop pending notifications.
    pub fn teardown(&self) {
        let mut liveness = self.liveness.write().unwrap_or_else(PoisonError::into_inner);
        liveness.kill();
        *liveness = Liveness::new();
        self.notifications.clear();
    }

    pub fn logout(&self) {
        self.teardown();
        self.session.logout();
        info!("signed out");
    }
}
