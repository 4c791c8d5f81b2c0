//! Command implementations.
//!
//! Every command that talks to the service runs against an [`AppContext`]
//! built from the active config context, and checks its page with the
//! route guard before doing anything.

pub mod context;
pub mod customers;
pub mod dashboard;
pub mod licenses;
pub mod login;
pub mod report;
pub mod requests;

use anyhow::{anyhow, bail, Result};
use msp_license::guard::{AdminPage, ClientPage};
use msp_license::model::{Role, User};
use msp_license::{Access, AppContext, NotificationKind, Route, StoreError};

use crate::config::Context;

/// Connect to the context's server and resume its saved session.
pub fn connect(ctx: &Context) -> Result<AppContext> {
    let url = ctx.server_url();
    tracing::debug!(context = %ctx.name, %url, "connecting");
    let app = AppContext::connect(&url, ctx.timeout())?;
    match ctx.saved_user() {
        Some(user) => app.restore(user, ctx.token.clone()),
        None => app.session().resolve_anonymous(),
    }
    // Errors come back as the command's result; only echo the rest.
    app.notifications().subscribe(|n| {
        if n.kind != NotificationKind::Error {
            eprintln!("[{}] {}", n.kind, n.message);
        }
    });
    Ok(app)
}

/// The signed-in user, if the guard lets them onto the page this command
/// stands for. `None` means the command has no page for that role.
pub fn authorize(app: &AppContext, admin: Option<AdminPage>, client: Option<ClientPage>) -> Result<User> {
    let Some(user) = app.user() else {
        bail!("Not logged in. Run `mspctl login`.");
    };
    let route = match user.role {
        Role::Admin => admin.map(Route::Admin),
        Role::Client => client.map(Route::Client),
    };
    let Some(route) = route else {
        let needed = match user.role {
            Role::Admin => Role::Client,
            Role::Client => Role::Admin,
        };
        bail!("This command requires {needed} access.");
    };

    match app.navigator().navigate(&route.path()) {
        Access::Authorized(landed) if landed == route => Ok(user),
        Access::Authorized(Route::Login) => bail!("Not logged in. Run `mspctl login`."),
        other => bail!("Access to {route} denied ({other:?})."),
    }
}

/// Customer a client user is scoped to.
pub fn own_customer_id(user: &User) -> Result<String> {
    user.customer_id()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Account {} is not linked to a customer.", user.email))
}

/// Turn a store failure into the message a user should see.
pub fn fail(fallback: &'static str) -> impl FnOnce(StoreError) -> anyhow::Error {
    move |e| anyhow!(e.user_message(fallback))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use msp_license::model::{Role, User};
    use msp_license::{AppContext, InMemoryLicenseApi, Session};

    pub fn admin() -> User {
        User {
            id: "u-admin".into(),
            email: "admin@msp.io".into(),
            name: "Admin".into(),
            role: Role::Admin,
            customer_id: None,
        }
    }

    pub fn client(customer_id: &str) -> User {
        User {
            id: "u-client".into(),
            email: "it@acme.com".into(),
            name: "Acme IT".into(),
            role: Role::Client,
            customer_id: Some(customer_id.into()),
        }
    }

    /// Context over an in-memory service, signed in as `user`.
    pub fn signed_in(user: User) -> (Arc<InMemoryLicenseApi>, AppContext) {
        let api = Arc::new(InMemoryLicenseApi::new());
        api.set_processor(user.email.clone());
        let app = AppContext::init(api.clone(), Session::authenticated(user, "tok"));
        (api, app)
    }
}
