//! Route table and access guard.
//!
//! ```text
//!                 ┌── session loading ─────────────▶ Loading
//! navigate(path) ─┼── not signed in / wrong role ──▶ Redirect(route)
//!                 └── allowed ─────────────────────▶ Authorized(route)
//! ```
//!
//! Public pages (login, register, forgot-password) send a signed-in user
//! to their dashboard. `/` always goes to the login page. Unknown paths
//! render the not-found page; unknown paths under `/admin` or `/client`
//! are still guarded first.

use crate::model::Role;
use crate::session::{AuthPhase, Session, SessionSnapshot};

const MAX_REDIRECTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminPage {
    Dashboard,
    Customers,
    Licenses,
    Requests,
    Pending,
    Settings,
}

impl AdminPage {
    pub const ALL: [AdminPage; 6] = [
        Self::Dashboard,
        Self::Customers,
        Self::Licenses,
        Self::Requests,
        Self::Pending,
        Self::Settings,
    ];

    pub fn segment(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Customers => "customers",
            Self::Licenses => "licenses",
            Self::Requests => "requests",
            Self::Pending => "pending",
            Self::Settings => "settings",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientPage {
    Dashboard,
    Licenses,
    Requests,
    Settings,
}

impl ClientPage {
    pub const ALL: [ClientPage; 4] = [Self::Dashboard, Self::Licenses, Self::Requests, Self::Settings];

    pub fn segment(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Licenses => "licenses",
            Self::Requests => "requests",
            Self::Settings => "settings",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Root,
    Login,
    Register,
    ForgotPassword,
    Admin(AdminPage),
    Client(ClientPage),
    /// No page matches. `area` is the role-guarded section the path falls
    /// under, if any.
    Unknown { area: Option<Role>, path: String },
}

impl Route {
    pub fn parse(path: &str) -> Route {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        let mut parts = trimmed.trim_start_matches('/').splitn(2, '/');
        let head = parts.next().unwrap_or_default();
        let rest = parts.next();

        match (head, rest) {
            ("", None) => Route::Root,
            ("login", None) => Route::Login,
            ("register", None) => Route::Register,
            ("forgot-password", None) => Route::ForgotPassword,
            ("admin", Some(rest)) => AdminPage::ALL
                .into_iter()
                .find(|p| p.segment() == rest)
                .map(Route::Admin)
                .unwrap_or_else(|| Route::unknown(Some(Role::Admin), path)),
            ("client", Some(rest)) => ClientPage::ALL
                .into_iter()
                .find(|p| p.segment() == rest)
                .map(Route::Client)
                .unwrap_or_else(|| Route::unknown(Some(Role::Client), path)),
            ("admin", None) => Route::unknown(Some(Role::Admin), path),
            ("client", None) => Route::unknown(Some(Role::Client), path),
            _ => Route::unknown(None, path),
        }
    }

    fn unknown(area: Option<Role>, path: &str) -> Route {
        Route::Unknown { area, path: path.to_string() }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Root => "/".into(),
            Route::Login => "/login".into(),
            Route::Register => "/register".into(),
            Route::ForgotPassword => "/forgot-password".into(),
            Route::Admin(p) => format!("/admin/{}", p.segment()),
            Route::Client(p) => format!("/client/{}", p.segment()),
            Route::Unknown { path, .. } => path.clone(),
        }
    }

    pub fn dashboard(role: Role) -> Route {
        match role {
            Role::Admin => Route::Admin(AdminPage::Dashboard),
            Role::Client => Route::Client(ClientPage::Dashboard),
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Route::Login | Route::Register | Route::ForgotPassword)
    }

    /// Role a route is restricted to.
    pub fn required_role(&self) -> Option<Role> {
        match self {
            Route::Admin(_) => Some(Role::Admin),
            Route::Client(_) => Some(Role::Client),
            Route::Unknown { area, .. } => *area,
            _ => None,
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}

/// Guard decision for one navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// Session still resolving: show a blocking placeholder.
    Loading,
    Redirect(Route),
    Authorized(Route),
    NotFound,
}

pub fn evaluate(route: &Route, session: &SessionSnapshot) -> Access {
    if *route == Route::Root {
        return Access::Redirect(Route::Login);
    }
    if let Route::Unknown { area: None, .. } = route {
        return Access::NotFound;
    }
    if session.phase == AuthPhase::Loading {
        return Access::Loading;
    }

    let user = match (&session.phase, &session.user) {
        (AuthPhase::Authenticated, Some(user)) => Some(user),
        _ => None,
    };

    if route.is_public() {
        return match user {
            Some(u) => Access::Redirect(Route::dashboard(u.role)),
            None => Access::Authorized(route.clone()),
        };
    }

    let required = route.required_role();
    match (user, required) {
        (None, _) => Access::Redirect(Route::Login),
        (Some(u), Some(role)) if u.role != role => Access::Redirect(Route::dashboard(u.role)),
        (Some(_), _) if matches!(route, Route::Unknown { .. }) => Access::NotFound,
        (Some(_), _) => Access::Authorized(route.clone()),
    }
}

/// Current location, re-guarded on every navigation.
pub struct Navigator {
    session: Session,
    current: Route,
}

impl Navigator {
    pub fn new(session: Session) -> Self {
        Self { session, current: Route::Root }
    }

    pub fn current(&self) -> &Route {
        &self.current
    }

    /// Navigate to `path`, following redirects. The returned access is
    /// never a redirect unless redirects loop.
    pub fn navigate(&mut self, path: &str) -> Access {
        self.go(Route::parse(path))
    }

    /// Re-evaluate the current route, e.g. after the session changed.
    pub fn refresh(&mut self) -> Access {
        self.go(self.current.clone())
    }

    fn go(&mut self, mut route: Route) -> Access {
        for _ in 0..MAX_REDIRECTS {
            let access = evaluate(&route, &self.session.snapshot());
            match access {
                Access::Redirect(next) => {
                    tracing::debug!(from = %route, to = %next, "redirect");
                    route = next;
                }
                other => {
                    self.current = route;
                    return other;
                }
            }
        }
        tracing::warn!(route = %route, "redirect limit reached");
        self.current = route.clone();
        Access::Redirect(route)
    }
}
