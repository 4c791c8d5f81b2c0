//! `mspctl dashboard`: the landing page for the signed-in role.

use anyhow::Result;
use msp_license::dashboard::{AdminSummary, ClientSummary};
use msp_license::expiry;
use msp_license::guard::{AdminPage, ClientPage};
use msp_license::model::{AnalyticsData, Role, TimeFrame};
use msp_license::AppContext;

use super::{authorize, fail, own_customer_id};
use crate::output::{money, print_json, Output, Table};

pub async fn show(app: &AppContext, timeframe: TimeFrame, output: Output) -> Result<()> {
    let user = authorize(app, Some(AdminPage::Dashboard), Some(ClientPage::Dashboard))?;
    match user.role {
        Role::Client => {
            let summary = client(app, &own_customer_id(&user)?).await?;
            match output {
                Output::Json => print_json(&summary),
                Output::Table => {
                    print_client(&summary);
                    Ok(())
                }
            }
        }
        Role::Admin => {
            let (summary, analytics) = admin(app, timeframe).await?;
            match output {
                Output::Json => print_json(&serde_json::json!({
                    "summary": summary,
                    "analytics": analytics,
                })),
                Output::Table => {
                    print_admin(&summary, analytics.as_ref(), timeframe);
                    Ok(())
                }
            }
        }
    }
}

async fn client(app: &AppContext, customer_id: &str) -> Result<ClientSummary> {
    let customer = app
        .customers()
        .get(customer_id)
        .await
        .map_err(fail("Failed to load customer"))?;
    let requests = app
        .requests()
        .for_customer(customer_id)
        .await
        .map_err(fail("Failed to load license requests"))?;
    Ok(ClientSummary::build(&customer, &requests, expiry::today()))
}

/// Local summary plus the service's analytics. Analytics are optional:
/// a failure there is reported but does not sink the summary.
async fn admin(app: &AppContext, timeframe: TimeFrame) -> Result<(AdminSummary, Option<AnalyticsData>)> {
    let customers = app.customers().list().await.map_err(fail("Failed to load customers"))?;
    let catalog = app.licenses().list().await.map_err(fail("Failed to load licenses"))?;
    let requests = app.requests().list().await.map_err(fail("Failed to load license requests"))?;
    let summary = AdminSummary::build(&customers, &catalog, &requests, expiry::today());

    let analytics = match app.analytics().dashboard(timeframe).await {
        Ok(data) => Some(data),
        Err(e) => {
            eprintln!("[warning] {}", e.user_message("Failed to fetch analytics"));
            None
        }
    };
    Ok((summary, analytics))
}

fn print_client(s: &ClientSummary) {
    println!("{}", s.customer_name);
    println!(
        "  Licenses: {} active, {} expiring, {} expired, {} suspended",
        s.licenses.active, s.licenses.expiring, s.licenses.expired, s.licenses.suspended
    );
    println!("  Seats:    {}", s.total_seats);
    println!("  Pending requests: {}", s.pending_requests);

    if s.recent_requests.is_empty() {
        return;
    }
    println!();
    println!("Recent requests");
    let mut table = Table::new(&["ID", "SUBTYPE", "USER", "STATUS", "REQUESTED"]);
    for r in &s.recent_requests {
        table.row(vec![
            r.id.clone(),
            r.subtype.clone(),
            r.user_email.clone(),
            r.status.to_string(),
            r.request_date.format("%Y-%m-%d").to_string(),
        ]);
    }
    table.print();
}

fn print_admin(s: &AdminSummary, analytics: Option<&AnalyticsData>, timeframe: TimeFrame) {
    println!("Customers: {} ({} active)", s.customers, s.active_customers);
    println!("Seats:     {}", s.total_seats);
    println!("Pending requests: {}", s.pending_requests);
    println!(
        "Licenses:  {} active, {} expiring, {} expired, {} suspended",
        s.licenses.active, s.licenses.expiring, s.licenses.expired, s.licenses.suspended
    );
    println!("Revenue:   {}  profit {}  margin {:.1}%", money(s.revenue), money(s.profit), s.margin);

    let Some(a) = analytics else { return };
    println!();
    println!(
        "Service KPIs: revenue {} ({:+.1}%), profit {}, margin {:.1}%",
        money(a.kpi.total_revenue),
        a.kpi.revenue_growth,
        money(a.kpi.total_profit),
        a.kpi.profit_margin
    );

    let sales = a.sales_data.for_timeframe(timeframe);
    if !sales.is_empty() {
        println!();
        println!("Sales ({timeframe})");
        let mut table = Table::new(&["PERIOD", "LICENSES", "REVENUE"]);
        for d in sales {
            table.row(vec![d.name.clone(), d.licenses.to_string(), money(d.revenue)]);
        }
        table.print();
    }

    if !a.top_customers.is_empty() {
        println!();
        println!("Top customers");
        let mut table = Table::new(&["NAME", "LICENSES", "SPENT"]);
        for c in &a.top_customers {
            table.row(vec![c.name.clone(), c.license_count.to_string(), money(c.total_spent)]);
        }
        table.print();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{admin as admin_user, client as client_user, signed_in};
    use msp_license::model::{Customer, KpiMetrics};

    fn acme() -> Customer {
        serde_json::from_value(serde_json::json!({
            "id": "c1",
            "name": "Acme Ltd",
            "email": "ops@acme.com",
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn client_summary_for_own_customer() {
        let (api, app) = signed_in(client_user("c1"));
        api.seed_customer(acme());
        let s = client(&app, "c1").await.unwrap();
        assert_eq!(s.customer_name, "Acme Ltd");
        assert_eq!(s.pending_requests, 0);
        show(&app, TimeFrame::Monthly, Output::Table).await.unwrap();
    }

    #[tokio::test]
    async fn admin_summary_with_analytics() {
        let (api, app) = signed_in(admin_user());
        api.seed_customer(acme());
        let (summary, analytics) = admin(&app, TimeFrame::Weekly).await.unwrap();
        assert_eq!(summary.customers, 1);
        assert!(analytics.is_some());

        api.set_analytics(AnalyticsData {
            kpi: KpiMetrics { total_revenue: 500.0, ..Default::default() },
            ..Default::default()
        });
        show(&app, TimeFrame::Daily, Output::Json).await.unwrap();
    }
}
