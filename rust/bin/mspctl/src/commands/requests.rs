//! License request commands.

use anyhow::{bail, Result};
use msp_license::guard::{AdminPage, ClientPage};
use msp_license::model::{Decision, LicenseRequest, Role};
use msp_license::scope::{self, RequestFilter};
use msp_license::{AppContext, RequestDraft, View};

use super::{authorize, fail, own_customer_id};
use crate::output::{print_json, Output, Table};

/// Fields of `mspctl requests submit`.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub customer: Option<String>,
    pub license_type: String,
    pub subtype: String,
    pub email: String,
    pub mobile: String,
    pub notes: Option<String>,
}

pub async fn list(app: &AppContext, filter: RequestFilter, output: Output) -> Result<()> {
    let user = authorize(app, Some(AdminPage::Requests), Some(ClientPage::Requests))?;
    let store = app.requests();
    let fetched = match user.role {
        Role::Admin => store.list().await,
        Role::Client => store.for_customer(&own_customer_id(&user)?).await,
    }
    .map_err(fail("Failed to load license requests"))?;

    show(&scope::request_view(&user, &fetched, &filter), output)
}

/// Pending requests awaiting a decision, oldest first.
pub async fn pending(app: &AppContext, output: Output) -> Result<()> {
    let user = authorize(app, Some(AdminPage::Pending), None)?;
    let mut pending = app
        .requests()
        .pending()
        .await
        .map_err(fail("Failed to load pending requests"))?;
    pending.sort_by_key(|r| r.request_date);

    let view = View::new(scope::visible_scope(&user, &pending), false);
    show(&view, output)
}

pub async fn submit(app: &AppContext, submission: Submission, output: Output) -> Result<LicenseRequest> {
    let user = authorize(app, Some(AdminPage::Requests), Some(ClientPage::Requests))?;
    let customer_id = match user.role {
        Role::Client => {
            let own = own_customer_id(&user)?;
            if submission.customer.as_deref().is_some_and(|c| c != own) {
                bail!("Clients can only request licenses for their own customer.");
            }
            own
        }
        Role::Admin => match submission.customer {
            Some(c) => c,
            None => bail!("--customer is required."),
        },
    };
    let customer = app
        .customers()
        .get(&customer_id)
        .await
        .map_err(fail("Failed to load customer"))?;

    let draft = RequestDraft {
        customer_id: customer.id,
        customer_name: customer.name,
        license_type: submission.license_type,
        subtype: submission.subtype,
        user_email: submission.email,
        mobile: submission.mobile,
        notes: submission.notes.unwrap_or_default(),
    };
    let body = draft.validate()?;
    let created = app
        .requests()
        .create(&body)
        .await
        .map_err(fail("Failed to submit license request"))?;

    match output {
        Output::Json => print_json(&created)?,
        Output::Table => println!("Request {} submitted for {}.", created.id, created.customer_name),
    }
    Ok(created)
}

/// Approve or reject a pending request.
pub async fn decide(
    app: &AppContext,
    id: &str,
    decision: Decision,
    notes: Option<&str>,
    output: Output,
) -> Result<LicenseRequest> {
    authorize(app, Some(AdminPage::Pending), None)?;
    let store = app.requests();
    // Load first so a request that is already decided is refused locally.
    store.get(id).await.map_err(fail("Failed to load license request"))?;
    let updated = match decision {
        Decision::Approve => store.approve(id, notes).await.map_err(fail("Failed to approve request"))?,
        Decision::Reject => store.reject(id, notes).await.map_err(fail("Failed to reject request"))?,
    };

    match output {
        Output::Json => print_json(&updated)?,
        Output::Table => println!("Request {} {}.", updated.id, updated.status),
    }
    Ok(updated)
}

fn show(view: &View<LicenseRequest>, output: Output) -> Result<()> {
    if output == Output::Json {
        return print_json(view.items());
    }
    match view.placeholder("license requests") {
        Some(text) => println!("{text}"),
        None => render(view.items()).print(),
    }
    Ok(())
}

fn render(requests: &[LicenseRequest]) -> Table {
    let mut table = Table::new(&["ID", "CUSTOMER", "TYPE", "SUBTYPE", "USER", "STATUS", "REQUESTED"]);
    for r in requests {
        table.row(vec![
            r.id.clone(),
            r.customer_name.clone(),
            r.license_type.clone(),
            r.subtype.clone(),
            r.user_email.clone(),
            r.status.to_string(),
            r.request_date.format("%Y-%m-%d %H:%M").to_string(),
        ]);
    }
    table
}
