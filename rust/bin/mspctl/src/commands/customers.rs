//! Customer commands (admin only).

use anyhow::Result;
use msp_license::guard::AdminPage;
use msp_license::model::Customer;
use msp_license::scope::{self, CustomerFilter};
use msp_license::AppContext;

use super::{authorize, fail};
use crate::output::{money, print_json, Output, Table};

pub async fn list(app: &AppContext, filter: CustomerFilter, output: Output) -> Result<()> {
    let user = authorize(app, Some(AdminPage::Customers), None)?;
    let customers = app
        .customers()
        .list()
        .await
        .map_err(fail("Failed to load customers"))?;
    let view = scope::customer_view(&user, &customers, &filter);

    if output == Output::Json {
        return print_json(view.items());
    }
    match view.placeholder("customers") {
        Some(text) => println!("{text}"),
        None => render(view.items()).print(),
    }
    Ok(())
}

fn render(customers: &[Customer]) -> Table {
    let mut table = Table::new(&["ID", "NAME", "EMAIL", "LOCATION", "STATUS", "LICENSES", "SEATS", "SPENT"]);
    for c in customers {
        table.row(vec![
            c.id.clone(),
            c.name.clone(),
            c.email.clone(),
            c.location.summary(),
            c.status.to_string(),
            c.licenses.len().to_string(),
            c.total_seats().to_string(),
            money(c.total_spent),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{admin, client, signed_in};
    use msp_license::model::CustomerStatus;

    #[tokio::test]
    async fn admin_lists_with_filters() {
        let (api, app) = signed_in(admin());
        let customer: Customer = serde_json::from_value(serde_json::json!({
            "id": "c1",
            "name": "Acme Ltd",
            "email": "ops@acme.com",
            "status": "active",
            "city": "Leeds",
        }))
        .unwrap();
        api.seed_customer(customer);
        list(&app, CustomerFilter::default(), Output::Json).await.unwrap();
        list(
            &app,
            CustomerFilter { search: "acme".into(), status: Some(CustomerStatus::Active) },
            Output::Table,
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn clients_are_turned_away() {
        let (_, app) = signed_in(client("c1"));
        assert!(list(&app, CustomerFilter::default(), Output::Table).await.is_err());
    }

    #[tokio::test]
    async fn service_failure_surfaces_message() {
        let (api, app) = signed_in(admin());
        api.set_offline(true);
        let err = list(&app, CustomerFilter::default(), Output::Table).await.unwrap_err();
        assert_eq!(err.to_string(), "Service unavailable");
    }
}
