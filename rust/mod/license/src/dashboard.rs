//! Dashboard figures computed from cached data.

use chrono::NaiveDate;
use serde::Serialize;

use crate::expiry;
use crate::model::{Customer, CustomerLicense, CustomerStatus, License, LicenseRequest, LicenseStatus, RequestStatus, User};
use crate::scope;

pub fn profit(cost: f64, price: f64) -> f64 {
    price - cost
}

/// Profit as a percentage of price. Zero for a free license.
pub fn margin(cost: f64, price: f64) -> f64 {
    if price == 0.0 {
        0.0
    } else {
        (price - cost) / price * 100.0
    }
}

/// Percentage change from `previous` to `current`; 100 when there was
/// nothing before.
pub fn growth_rate(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        100.0
    } else {
        (current - previous) / previous * 100.0
    }
}

fn catalog_entry<'a>(catalog: &'a [License], held: &CustomerLicense) -> Option<&'a License> {
    catalog
        .iter()
        .find(|l| l.id == held.license_id)
        .or_else(|| catalog.iter().find(|l| l.subtype == held.subtype))
}

/// Revenue of held licenses at catalog price. Licenses with no catalog
/// entry count as zero.
pub fn total_revenue(held: &[CustomerLicense], catalog: &[License]) -> f64 {
    held.iter()
        .filter_map(|h| catalog_entry(catalog, h).map(|l| l.price * f64::from(h.quantity)))
        .sum()
}

pub fn total_profit(held: &[CustomerLicense], catalog: &[License]) -> f64 {
    held.iter()
        .filter_map(|h| catalog_entry(catalog, h).map(|l| l.profit() * f64::from(h.quantity)))
        .sum()
}

/// Seats across `held`, widened so large quantities cannot overflow.
pub fn total_seats(held: &[CustomerLicense]) -> u64 {
    held.iter().map(|l| u64::from(l.quantity)).sum()
}

/// Licenses by display status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub active: usize,
    pub expiring: usize,
    pub expired: usize,
    pub suspended: usize,
}

impl StatusCounts {
    pub fn tally(held: &[CustomerLicense], today: NaiveDate) -> Self {
        let mut counts = Self::default();
        for l in held {
            match expiry::display_status(l, today) {
                LicenseStatus::Active => counts.active += 1,
                LicenseStatus::Expiring => counts.expiring += 1,
                LicenseStatus::Expired => counts.expired += 1,
                LicenseStatus::Suspended => counts.suspended += 1,
            }
        }
        counts
    }
}

/// A client's landing page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSummary {
    pub customer_id: String,
    pub customer_name: String,
    pub licenses: StatusCounts,
    pub total_seats: u64,
    pub pending_requests: usize,
    pub recent_requests: Vec<LicenseRequest>,
}

impl ClientSummary {
    pub fn build(customer: &Customer, requests: &[LicenseRequest], today: NaiveDate) -> Self {
        let own: Vec<LicenseRequest> = requests
            .iter()
            .filter(|r| r.customer_id == customer.id)
            .cloned()
            .collect();
        Self {
            customer_id: customer.id.clone(),
            customer_name: customer.name.clone(),
            licenses: StatusCounts::tally(&customer.licenses, today),
            total_seats: total_seats(&customer.licenses),
            pending_requests: own.iter().filter(|r| r.status == RequestStatus::Pending).count(),
            recent_requests: scope::recent(&own, scope::RECENT_REQUESTS),
        }
    }
}

/// Summary for `user`'s own customer, if it is among `customers`.
pub fn client_summary(
    user: &User,
    customers: &[Customer],
    requests: &[LicenseRequest],
    today: NaiveDate,
) -> Option<ClientSummary> {
    scope::own_customer(user, customers).map(|c| ClientSummary::build(c, requests, today))
}

/// An administrator's landing page, computed locally.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSummary {
    pub customers: usize,
    pub active_customers: usize,
    pub total_seats: u64,
    pub pending_requests: usize,
    pub licenses: StatusCounts,
    pub revenue: f64,
    pub profit: f64,
    pub margin: f64,
}

impl AdminSummary {
    pub fn build(
        customers: &[Customer],
        catalog: &[License],
        requests: &[LicenseRequest],
        today: NaiveDate,
    ) -> Self {
        let held: Vec<CustomerLicense> = customers.iter().flat_map(|c| c.licenses.iter().cloned()).collect();
        let revenue = total_revenue(&held, catalog);
        let profit = total_profit(&held, catalog);
        Self {
            customers: customers.len(),
            active_customers: customers.iter().filter(|c| c.status == CustomerStatus::Active).count(),
            total_seats: total_seats(&held),
            pending_requests: requests.iter().filter(|r| r.status == RequestStatus::Pending).count(),
            licenses: StatusCounts::tally(&held, today),
            revenue,
            profit,
            margin: margin(revenue - profit, revenue),
        }
    }
}
