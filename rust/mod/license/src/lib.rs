//! MSP license management core.
//!
//! Administrators manage customers, a license catalog and approval
//! requests; client users see their own customer's licenses and submit
//! requests. This crate holds everything except rendering:
//!
//! - [`model`]: wire types, with date normalization at the boundary
//! - [`expiry`]: renewal-date classification (active / expiring / expired)
//! - [`validate`]: form validation producing typed request bodies
//! - [`api`]: the remote service as a trait, plus the HTTP implementation
//! - [`store`]: caches reconciled with the service, one per resource
//! - [`notify`]: transient success/error feedback
//! - [`session`], [`context`]: who is signed in, and the application root
//! - [`scope`]: role-based visibility, filters and ordering
//! - [`guard`]: route table and access decisions
//! - [`dashboard`]: summary figures
//!
//! # Example
//!
//! ```ignore
//! let ctx = AppContext::connect("http://localhost:5000/api", Duration::from_secs(30))?;
//! ctx.login("admin@msp.io", "secret").await?;
//!
//! let requests = ctx.requests();
//! requests.list().await?;
//! for r in scope::visible_scope(&ctx.require_user()?, &requests.snapshot()) {
//!     println!("{} {}", r.id, r.status);
//! }
//! ```

pub mod api;
pub mod context;
pub mod dashboard;
pub mod expiry;
pub mod guard;
pub mod memory;
pub mod model;
pub mod notify;
pub mod scope;
pub mod session;
pub mod store;
pub mod validate;

#[cfg(test)]
mod fixtures;

/// Default service URL when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

pub const APP_NAME: &str = "MSP License Manager";

pub use api::{HttpLicenseApi, LicenseApi};
pub use context::AppContext;
pub use expiry::{classify, ExpiryStatus, EXPIRING_THRESHOLD_DAYS};
pub use guard::{Access, Navigator, Route};
pub use memory::InMemoryLicenseApi;
pub use notify::{Notification, NotificationKind, Notifications};
pub use scope::{visible_scope, View};
pub use session::{AuthPhase, Session};
pub use store::{AnalyticsStore, CustomerStore, LicenseStore, RequestStore, StoreError, StoreResult};
pub use validate::{AssignmentDraft, CustomerDraft, FieldErrors, RequestDraft};
