//! `mspctl report`: the service's analytics reports (admin only).

use anyhow::{bail, Result};
use chrono::NaiveDate;
use msp_license::guard::AdminPage;
use msp_license::model::{SalesData, TimeFrame};
use msp_license::AppContext;

use super::{authorize, fail};
use crate::output::{money, print_json, Output, Table};

pub async fn sales(app: &AppContext, timeframe: TimeFrame, output: Output) -> Result<()> {
    authorize(app, Some(AdminPage::Dashboard), None)?;
    let points = app
        .analytics()
        .sales(timeframe)
        .await
        .map_err(fail("Failed to fetch sales data"))?;
    print_series(&points, "PERIOD", output)
}

pub async fn distribution(app: &AppContext, output: Output) -> Result<()> {
    authorize(app, Some(AdminPage::Dashboard), None)?;
    let slices = app
        .analytics()
        .license_distribution()
        .await
        .map_err(fail("Failed to fetch license distribution"))?;
    if output == Output::Json {
        return print_json(&slices);
    }
    let mut table = Table::new(&["TYPE", "LICENSES"]);
    for s in &slices {
        table.row(vec![s.name.clone(), s.value.to_string()]);
    }
    table.print();
    Ok(())
}

pub async fn top_customers(app: &AppContext, limit: usize, output: Output) -> Result<()> {
    authorize(app, Some(AdminPage::Dashboard), None)?;
    let top = app
        .analytics()
        .top_customers(limit)
        .await
        .map_err(fail("Failed to fetch top customers"))?;
    if output == Output::Json {
        return print_json(&top);
    }
    let mut table = Table::new(&["ID", "NAME", "LICENSES", "SPENT", "LAST PURCHASE"]);
    for c in &top {
        table.row(vec![
            c.id.clone(),
            c.name.clone(),
            c.license_count.to_string(),
            money(c.total_spent),
            c.last_purchase.map(|t| t.format("%Y-%m-%d").to_string()).unwrap_or_default(),
        ]);
    }
    table.print();
    Ok(())
}

pub async fn revenue(app: &AppContext, from: NaiveDate, to: NaiveDate, output: Output) -> Result<()> {
    if from > to {
        bail!("--from {from} is after --to {to}");
    }
    authorize(app, Some(AdminPage::Dashboard), None)?;
    let months = app
        .analytics()
        .revenue(from, to)
        .await
        .map_err(fail("Failed to fetch revenue report"))?;
    print_series(&months, "MONTH", output)
}

fn print_series(points: &[SalesData], label: &'static str, output: Output) -> Result<()> {
    if output == Output::Json {
        return print_json(points);
    }
    if points.is_empty() {
        println!("No sales in this period.");
        return Ok(());
    }
    let mut table = Table::new(&[label, "LICENSES", "REVENUE"]);
    for p in points {
        table.row(vec![p.name.clone(), p.licenses.to_string(), money(p.revenue)]);
    }
    let total: f64 = points.iter().map(|p| p.revenue).sum();
    table.row(vec!["TOTAL".into(), String::new(), money(total)]);
    table.print();
    Ok(())
}
