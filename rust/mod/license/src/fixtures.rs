//! Shared test fixtures.

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};

use crate::memory::InMemoryLicenseApi;
use crate::model::*;
use crate::notify::Notifications;
use crate::store::{Liveness, StoreContext};
use crate::validate::RequestDraft;

pub struct Harness {
    pub api: Arc<InMemoryLicenseApi>,
    pub notifications: Notifications,
    pub liveness: Liveness,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            api: Arc::new(InMemoryLicenseApi::new()),
            notifications: Notifications::new(),
            liveness: Liveness::new(),
        }
    }

    pub fn ctx(&self) -> StoreContext {
        StoreContext::new(self.api.clone(), self.notifications.clone(), self.liveness.clone())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn request(id: &str, customer_id: &str, status: RequestStatus) -> LicenseRequest {
    LicenseRequest {
        id: id.into(),
        customer_id: customer_id.into(),
        customer_name: format!("Customer {customer_id}"),
        license_type: "Microsoft 365".into(),
        subtype: "E3".into(),
        user_email: format!("user@{customer_id}.com"),
        mobile: "+1000000000".into(),
        status,
        request_date: Utc.with_ymd_and_hms(2025, 5, 1, 10, 0, 0).unwrap(),
        processed_date: None,
        processed_by: None,
        notes: None,
    }
}

pub fn new_request(customer_id: &str) -> NewRequest {
    RequestDraft {
        customer_id: customer_id.into(),
        customer_name: String::new(),
        license_type: "Microsoft 365".into(),
        subtype: "E3".into(),
        user_email: "u@acme.com".into(),
        mobile: "+1000000000".into(),
        notes: String::new(),
    }
    .validate()
    .unwrap()
}

pub fn customer(id: &str, name: &str) -> Customer {
    Customer {
        id: id.into(),
        name: name.into(),
        email: format!("ops@{}.com", name.split_whitespace().next().unwrap_or(id).to_lowercase()),
        phone: None,
        address: None,
        location: Location::default(),
        status: CustomerStatus::Active,
        total_spent: 0.0,
        last_purchase: None,
        licenses: Vec::new(),
        created_at: None,
        updated_at: None,
    }
}

pub fn customer_license(id: &str, customer_id: &str, renewal: NaiveDate) -> CustomerLicense {
    CustomerLicense {
        id: id.into(),
        license_id: "l1".into(),
        customer_id: customer_id.into(),
        category: LicenseCategory::Microsoft365,
        subtype: "E3".into(),
        quantity: 2,
        users: Vec::new(),
        purchase_date: date(2024, 1, 1),
        renewal_date: renewal,
        status: LicenseStatus::Active,
        notes: None,
    }
}

pub fn catalog(id: &str, subtype: &str, cost: f64, price: f64) -> License {
    License {
        id: id.into(),
        category: LicenseCategory::Microsoft365,
        subtype: subtype.into(),
        cost,
        price,
        active: true,
        description: None,
        created_at: None,
        updated_at: None,
    }
}

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
        id: format!("u-{customer_id}"),
        email: format!("client@{customer_id}.com"),
        name: "Client".into(),
        role: Role::Client,
        customer_id: Some(customer_id.into()),
    }
}
