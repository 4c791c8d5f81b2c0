//! Held-license listing with display status.

use std::collections::HashMap;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use msp_license::expiry::{self, format_display};
use msp_license::guard::{AdminPage, ClientPage};
use msp_license::model::{Customer, CustomerLicense, Role};
use msp_license::scope::{self, LicenseFilter};
use msp_license::AppContext;
use serde::Serialize;

use super::{authorize, fail, own_customer_id};
use crate::output::{print_json, Output, Table};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Row<'a> {
    #[serde(flatten)]
    license: &'a CustomerLicense,
    customer_name: &'a str,
    display_status: String,
    days_until_renewal: i64,
}

pub async fn list(app: &AppContext, customer: Option<&str>, filter: LicenseFilter, output: Output) -> Result<()> {
    let user = authorize(app, Some(AdminPage::Licenses), Some(ClientPage::Licenses))?;
    let store = app.customers();

    let customers: Vec<Customer> = match user.role {
        Role::Admin => {
            let mut all = store.list().await.map_err(fail("Failed to load customers"))?;
            if let Some(id) = customer {
                all.retain(|c| c.id == id);
            }
            all
        }
        Role::Client => {
            let own = own_customer_id(&user)?;
            if customer.is_some_and(|c| c != own) {
                bail!("Clients can only list their own licenses.");
            }
            vec![store.get(&own).await.map_err(fail("Failed to load licenses"))?]
        }
    };

    let today = expiry::today();
    let view = scope::license_view(&user, &customers, &filter, today);
    let names: HashMap<&str, &str> = customers.iter().map(|c| (c.id.as_str(), c.name.as_str())).collect();
    let rows: Vec<Row> = view
        .items()
        .iter()
        .map(|l| row(l, names.get(l.customer_id.as_str()).copied().unwrap_or("-"), today))
        .collect();

    if output == Output::Json {
        return print_json(&rows);
    }
    match view.placeholder("licenses") {
        Some(text) => println!("{text}"),
        None => render(&rows).print(),
    }
    Ok(())
}

fn row<'a>(license: &'a CustomerLicense, customer_name: &'a str, today: NaiveDate) -> Row<'a> {
    Row {
        license,
        customer_name,
        display_status: expiry::display_status(license, today).to_string(),
        days_until_renewal: expiry::days_until(license.renewal_date, today),
    }
}

fn render(rows: &[Row]) -> Table {
    let mut table = Table::new(&["ID", "CUSTOMER", "TYPE", "SUBTYPE", "SEATS", "RENEWAL", "STATUS", "DAYS"]);
    for r in rows {
        let l = r.license;
        table.row(vec![
            l.id.clone(),
            r.customer_name.to_string(),
            l.category.to_string(),
            l.subtype.clone(),
            format!("{}/{}", l.users.len(), l.quantity),
            format_display(l.renewal_date),
            r.display_status.clone(),
            r.days_until_renewal.to_string(),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{admin, client, signed_in};
    use chrono::Duration;
    use msp_license::model::{CustomerStatus, LicenseCategory, LicenseStatus};

    fn held(id: &str, renewal: NaiveDate) -> CustomerLicense {
        CustomerLicense {
            id: id.into(),
            license_id: "l1".into(),
            customer_id: "c1".into(),
            category: LicenseCategory::Microsoft365,
            subtype: "E3".into(),
            quantity: 2,
            users: Vec::new(),
            purchase_date: renewal - Duration::days(365),
            renewal_date: renewal,
            status: LicenseStatus::Active,
            notes: None,
        }
    }

    fn acme(licenses: Vec<CustomerLicense>) -> Customer {
        Customer {
            id: "c1".into(),
            name: "Acme Ltd".into(),
            email: "ops@acme.com".into(),
            phone: None,
            address: None,
            location: Default::default(),
            status: CustomerStatus::Active,
            total_spent: 0.0,
            last_purchase: None,
            licenses,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn row_shows_display_status() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let l = held("a", today + Duration::days(30));
        let r = row(&l, "Acme Ltd", today);
        assert_eq!(r.display_status, "expiring");
        assert_eq!(r.days_until_renewal, 30);

        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["displayStatus"], "expiring");
        assert_eq!(json["customerName"], "Acme Ltd");
        assert_eq!(json["subtype"], "E3");
    }

    #[tokio::test]
    async fn client_sees_own_licenses_only() {
        let (api, app) = signed_in(client("c1"));
        api.seed_customer(acme(vec![held("a", expiry::today() + Duration::days(90))]));

        list(&app, None, LicenseFilter::default(), Output::Table).await.unwrap();
        assert!(list(&app, Some("c2"), LicenseFilter::default(), Output::Table).await.is_err());
    }

    #[tokio::test]
    async fn empty_catalog_is_not_an_error() {
        let (api, app) = signed_in(admin());
        api.seed_customer(acme(Vec::new()));
        list(&app, Some("c1"), LicenseFilter::default(), Output::Table).await.unwrap();
    }
}
