//! In-memory [`LicenseApi`] for tests and demos.
//!
//! Behaves like the real service where stores depend on it: ids and
//! timestamps are assigned server-side, request decisions are accepted
//! only while a request is pending, and unknown ids answer 404. Taking it
//! offline makes every call fail with 503.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use chrono::{NaiveDate, Utc};
use msp_client::ApiError;

use crate::api::LicenseApi;
use crate::model::*;

#[derive(Default)]
struct Data {
    requests: Vec<LicenseRequest>,
    customers: Vec<Customer>,
    licenses: Vec<License>,
    accounts: HashMap<String, (String, User)>,
    analytics: AnalyticsData,
}

#[derive(Default)]
pub struct InMemoryLicenseApi {
    data: Mutex<Data>,
    offline: AtomicBool,
    calls: AtomicUsize,
    /// Identity recorded as `processedBy` on decisions.
    processor: Mutex<Option<String>>,
}

fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn not_found(kind: &str, id: &str) -> ApiError {
    ApiError::Server {
        status: 404,
        message: format!("{kind} {id} not found"),
    }
}

impl InMemoryLicenseApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail (or succeed again).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of calls that reached the service so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_processor(&self, who: impl Into<String>) {
        *self.processor.lock().unwrap_or_else(PoisonError::into_inner) = Some(who.into());
    }

    pub fn add_account(&self, user: User, password: impl Into<String>) {
        self.data()
            .accounts
            .insert(user.email.clone(), (password.into(), user));
    }

    pub fn seed_customer(&self, customer: Customer) {
        self.data().customers.push(customer);
    }

    pub fn seed_request(&self, request: LicenseRequest) {
        self.data().requests.push(request);
    }

    pub fn seed_license(&self, license: License) {
        self.data().licenses.push(license);
    }

    pub fn set_analytics(&self, analytics: AnalyticsData) {
        self.data().analytics = analytics;
    }

    /// The service-side copy of a request.
    pub fn stored_request(&self, id: &str) -> Option<LicenseRequest> {
        self.data().requests.iter().find(|r| r.id == id).cloned()
    }

    fn data(&self) -> std::sync::MutexGuard<'_, Data> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enter(&self) -> Result<(), ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(ApiError::Server {
                status: 503,
                message: "Service unavailable".into(),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl LicenseApi for InMemoryLicenseApi {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        self.enter()?;
        match self.data().accounts.get(&credentials.email) {
            Some((password, user)) if *password == credentials.password => Ok(AuthResponse {
                user: user.clone(),
                token: format!("token-{}", new_id()),
            }),
            _ => Err(ApiError::Server {
                status: 401,
                message: "Invalid email or password".into(),
            }),
        }
    }

    async fn list_requests(&self) -> Result<Vec<LicenseRequest>, ApiError> {
        self.enter()?;
        Ok(self.data().requests.clone())
    }

    async fn pending_requests(&self) -> Result<Vec<LicenseRequest>, ApiError> {
        self.enter()?;
        Ok(self
            .data()
            .requests
            .iter()
            .filter(|r| r.status == RequestStatus::Pending)
            .cloned()
            .collect())
    }

    async fn customer_requests(&self, customer_id: &str) -> Result<Vec<LicenseRequest>, ApiError> {
        self.enter()?;
        Ok(self
            .data()
            .requests
            .iter()
            .filter(|r| r.customer_id == customer_id)
            .cloned()
            .collect())
    }

    async fn get_request(&self, id: &str) -> Result<LicenseRequest, ApiError> {
        self.enter()?;
        self.stored_request(id).ok_or_else(|| not_found("request", id))
    }

    async fn create_request(&self, request: &NewRequest) -> Result<LicenseRequest, ApiError> {
        self.enter()?;
        let mut data = self.data();
        let customer_name = data
            .customers
            .iter()
            .find(|c| c.id == request.customer_id())
            .map(|c| c.name.clone())
            .unwrap_or_else(|| request.customer_name().to_string());
        let record = LicenseRequest {
            id: new_id(),
            customer_id: request.customer_id().to_string(),
            customer_name,
            license_type: request.license_type().to_string(),
            subtype: request.subtype().to_string(),
            user_email: request.user_email().to_string(),
            mobile: request.mobile().to_string(),
            status: RequestStatus::Pending,
            request_date: Utc::now(),
            processed_date: None,
            processed_by: None,
            notes: request.notes().map(str::to_string),
        };
        data.requests.push(record.clone());
        Ok(record)
    }

    async fn decide_request(
        &self,
        id: &str,
        decision: Decision,
        notes: Option<&str>,
    ) -> Result<LicenseRequest, ApiError> {
        self.enter()?;
        let processor = self
            .processor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let mut data = self.data();
        let request = data
            .requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| not_found("request", id))?;
        if !request.status.can_transition_to(decision.outcome()) {
            return Err(ApiError::Server {
                status: 409,
                message: format!("Request is already {}", request.status),
            });
        }
        request.status = decision.outcome();
        request.processed_date = Some(Utc::now());
        request.processed_by = processor;
        if let Some(notes) = notes {
            request.notes = Some(notes.to_string());
        }
        Ok(request.clone())
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, ApiError> {
        self.enter()?;
        Ok(self.data().customers.clone())
    }

    async fn get_customer(&self, id: &str) -> Result<Customer, ApiError> {
        self.enter()?;
        self.data()
            .customers
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| not_found("customer", id))
    }

    async fn create_customer(&self, customer: &NewCustomer) -> Result<Customer, ApiError> {
        self.enter()?;
        let mut data = self.data();
        if data.customers.iter().any(|c| c.email.eq_ignore_ascii_case(customer.email())) {
            return Err(ApiError::Server {
                status: 409,
                message: "Customer with this email already exists".into(),
            });
        }
        let now = Utc::now();
        let record = Customer {
            id: new_id(),
            name: customer.name().to_string(),
            email: customer.email().to_string(),
            phone: customer.phone().map(str::to_string),
            address: customer.address().map(str::to_string),
            location: customer.location().clone(),
            status: customer.status(),
            total_spent: 0.0,
            last_purchase: None,
            licenses: Vec::new(),
            created_at: Some(now),
            updated_at: Some(now),
        };
        data.customers.push(record.clone());
        Ok(record)
    }

    async fn update_customer(&self, id: &str, patch: &UpdateCustomer) -> Result<Customer, ApiError> {
        self.enter()?;
        let mut data = self.data();
        let c = data
            .customers
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| not_found("customer", id))?;
        if let Some(name) = &patch.name {
            c.name = name.clone();
        }
        if let Some(email) = &patch.email {
            c.email = email.clone();
        }
        if let Some(phone) = &patch.phone {
            c.phone = Some(phone.clone());
        }
        if let Some(address) = &patch.address {
            c.address = Some(address.clone());
        }
        c.location.merge(&patch.location);
        if let Some(status) = patch.status {
            c.status = status;
        }
        c.updated_at = Some(Utc::now());
        Ok(c.clone())
    }

    async fn delete_customer(&self, id: &str) -> Result<(), ApiError> {
        self.enter()?;
        let mut data = self.data();
        let before = data.customers.len();
        data.customers.retain(|c| c.id != id);
        if data.customers.len() == before {
            return Err(not_found("customer", id));
        }
        Ok(())
    }

    async fn customer_licenses(&self, customer_id: &str) -> Result<Vec<CustomerLicense>, ApiError> {
        self.enter()?;
        self.data()
            .customers
            .iter()
            .find(|c| c.id == customer_id)
            .map(|c| c.licenses.clone())
            .ok_or_else(|| not_found("customer", customer_id))
    }

    async fn list_licenses(&self) -> Result<Vec<License>, ApiError> {
        self.enter()?;
        Ok(self.data().licenses.clone())
    }

    async fn get_license(&self, id: &str) -> Result<License, ApiError> {
        self.enter()?;
        self.data()
            .licenses
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or_else(|| not_found("license", id))
    }

    async fn create_license(&self, license: &CreateLicense) -> Result<License, ApiError> {
        self.enter()?;
        let now = Utc::now();
        let record = License {
            id: new_id(),
            category: license.category,
            subtype: license.subtype.clone(),
            cost: license.cost,
            price: license.price,
            active: license.active,
            description: license.description.clone(),
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.data().licenses.push(record.clone());
        Ok(record)
    }

    async fn update_license(&self, id: &str, patch: &UpdateLicense) -> Result<License, ApiError> {
        self.enter()?;
        let mut data = self.data();
        let l = data
            .licenses
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| not_found("license", id))?;
        if let Some(cost) = patch.cost {
            l.cost = cost;
        }
        if let Some(price) = patch.price {
            l.price = price;
        }
        if let Some(active) = patch.active {
            l.active = active;
        }
        if let Some(description) = &patch.description {
            l.description = Some(description.clone());
        }
        l.updated_at = Some(Utc::now());
        Ok(l.clone())
    }

    async fn delete_license(&self, id: &str) -> Result<(), ApiError> {
        self.enter()?;
        let mut data = self.data();
        let before = data.licenses.len();
        data.licenses.retain(|l| l.id != id);
        if data.licenses.len() == before {
            return Err(not_found("license", id));
        }
        Ok(())
    }

    async fn assign_license(&self, assignment: &Assignment) -> Result<CustomerLicense, ApiError> {
        self.enter()?;
        let mut data = self.data();
        let catalog = data
            .licenses
            .iter()
            .find(|l| l.id == assignment.license_id())
            .cloned()
            .ok_or_else(|| not_found("license", assignment.license_id()))?;
        let customer = data
            .customers
            .iter_mut()
            .find(|c| c.id == assignment.customer_id())
            .ok_or_else(|| not_found("customer", assignment.customer_id()))?;
        let record = CustomerLicense {
            id: new_id(),
            license_id: catalog.id.clone(),
            customer_id: customer.id.clone(),
            category: catalog.category,
            subtype: catalog.subtype.clone(),
            quantity: assignment.quantity(),
            users: assignment.users().to_vec(),
            purchase_date: assignment.purchase_date(),
            renewal_date: assignment.renewal_date(),
            status: LicenseStatus::Active,
            notes: assignment.notes().map(str::to_string),
        };
        customer.licenses.push(record.clone());
        customer.total_spent += catalog.price * f64::from(assignment.quantity());
        customer.last_purchase = Some(Utc::now());
        Ok(record)
    }

    async fn analytics(&self, _timeframe: TimeFrame) -> Result<AnalyticsData, ApiError> {
        self.enter()?;
        Ok(self.data().analytics.clone())
    }

    async fn sales(&self, timeframe: TimeFrame) -> Result<Vec<SalesData>, ApiError> {
        self.enter()?;
        Ok(self.data().analytics.sales_data.for_timeframe(timeframe).to_vec())
    }

    async fn license_distribution(&self) -> Result<Vec<LicenseDistribution>, ApiError> {
        self.enter()?;
        Ok(self.data().analytics.license_distribution.clone())
    }

    /// Biggest spenders first.
    async fn top_customers(&self, limit: usize) -> Result<Vec<TopCustomer>, ApiError> {
        self.enter()?;
        let data = self.data();
        let mut top: Vec<TopCustomer> = data
            .customers
            .iter()
            .map(|c| TopCustomer {
                id: c.id.clone(),
                name: c.name.clone(),
                total_spent: c.total_spent,
                license_count: c.licenses.len() as u64,
                last_purchase: c.last_purchase,
            })
            .collect();
        top.sort_by(|a, b| b.total_spent.total_cmp(&a.total_spent));
        top.truncate(limit);
        Ok(top)
    }

    async fn revenue(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<SalesData>, ApiError> {
        self.enter()?;
        if from > to {
            return Err(ApiError::Server {
                status: 400,
                message: "startDate must not be after endDate".into(),
            });
        }
        let data = self.data();
        let mut months: BTreeMap<String, SalesData> = BTreeMap::new();
        for held in data.customers.iter().flat_map(|c| &c.licenses) {
            if held.purchase_date < from || held.purchase_date > to {
                continue;
            }
            let price = data
                .licenses
                .iter()
                .find(|l| l.id == held.license_id)
                .map_or(0.0, |l| l.price);
            let name = held.purchase_date.format("%Y-%m").to_string();
            let bucket = months.entry(name.clone()).or_insert(SalesData { name, licenses: 0, revenue: 0.0 });
            bucket.licenses += u64::from(held.quantity);
            bucket.revenue += price * f64::from(held.quantity);
        }
        Ok(months.into_values().collect())
    }
}
