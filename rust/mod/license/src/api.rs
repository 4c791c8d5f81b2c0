//! The remote license service.
//!
//! [`LicenseApi`] is the seam between stores and the network: production
//! code uses [`HttpLicenseApi`], tests use
//! [`InMemoryLicenseApi`](crate::memory::InMemoryLicenseApi).

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use msp_client::{ApiError, RestClient, TokenSource};

use crate::model::*;

/// Endpoints of the license service. All records returned are exactly
/// what the service sent; normalization happens in the stores.
#[async_trait::async_trait]
pub trait LicenseApi: Send + Sync + 'static {
    // --- auth ---
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError>;

    // --- requests ---
    async fn list_requests(&self) -> Result<Vec<LicenseRequest>, ApiError>;
    async fn pending_requests(&self) -> Result<Vec<LicenseRequest>, ApiError>;
    async fn customer_requests(&self, customer_id: &str) -> Result<Vec<LicenseRequest>, ApiError>;
    async fn get_request(&self, id: &str) -> Result<LicenseRequest, ApiError>;
    async fn create_request(&self, request: &NewRequest) -> Result<LicenseRequest, ApiError>;
    async fn decide_request(
        &self,
        id: &str,
        decision: Decision,
        notes: Option<&str>,
    ) -> Result<LicenseRequest, ApiError>;

    // --- customers ---
    async fn list_customers(&self) -> Result<Vec<Customer>, ApiError>;
    async fn get_customer(&self, id: &str) -> Result<Customer, ApiError>;
    async fn create_customer(&self, customer: &NewCustomer) -> Result<Customer, ApiError>;
    async fn update_customer(&self, id: &str, patch: &UpdateCustomer) -> Result<Customer, ApiError>;
    async fn delete_customer(&self, id: &str) -> Result<(), ApiError>;
    async fn customer_licenses(&self, customer_id: &str) -> Result<Vec<CustomerLicense>, ApiError>;

    // --- license catalog ---
    async fn list_licenses(&self) -> Result<Vec<License>, ApiError>;
    async fn get_license(&self, id: &str) -> Result<License, ApiError>;
    async fn create_license(&self, license: &CreateLicense) -> Result<License, ApiError>;
    async fn update_license(&self, id: &str, patch: &UpdateLicense) -> Result<License, ApiError>;
    async fn delete_license(&self, id: &str) -> Result<(), ApiError>;
    async fn assign_license(&self, assignment: &Assignment) -> Result<CustomerLicense, ApiError>;

    // --- analytics ---
    async fn analytics(&self, timeframe: TimeFrame) -> Result<AnalyticsData, ApiError>;
    async fn sales(&self, timeframe: TimeFrame) -> Result<Vec<SalesData>, ApiError>;
    async fn license_distribution(&self) -> Result<Vec<LicenseDistribution>, ApiError>;
    async fn top_customers(&self, limit: usize) -> Result<Vec<TopCustomer>, ApiError>;
    /// Revenue per month for purchases dated `from..=to`.
    async fn revenue(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<SalesData>, ApiError>;
}

/// [`LicenseApi`] over HTTP.
#[derive(Clone)]
pub struct HttpLicenseApi {
    client: RestClient,
}

impl HttpLicenseApi {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    pub fn connect(
        base_url: &str,
        token_source: Arc<dyn TokenSource>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        Ok(Self::new(RestClient::with_timeout(base_url, token_source, timeout)?))
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }
}

#[async_trait::async_trait]
impl LicenseApi for HttpLicenseApi {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        self.client.post("/auth/login", credentials).await
    }

    async fn list_requests(&self) -> Result<Vec<LicenseRequest>, ApiError> {
        self.client.get("/requests").await
    }

    async fn pending_requests(&self) -> Result<Vec<LicenseRequest>, ApiError> {
        self.client.get("/requests/pending").await
    }

    async fn customer_requests(&self, customer_id: &str) -> Result<Vec<LicenseRequest>, ApiError> {
        self.client.get(&format!("/requests/customer/{customer_id}")).await
    }

    async fn get_request(&self, id: &str) -> Result<LicenseRequest, ApiError> {
        self.client.get(&format!("/requests/{id}")).await
    }

    async fn create_request(&self, request: &NewRequest) -> Result<LicenseRequest, ApiError> {
        self.client.post("/requests", request).await
    }

    async fn decide_request(
        &self,
        id: &str,
        decision: Decision,
        notes: Option<&str>,
    ) -> Result<LicenseRequest, ApiError> {
        let body = DecisionBody { notes: notes.map(str::to_string) };
        self.client
            .post(&format!("/requests/{id}/{}", decision.action()), &body)
            .await
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, ApiError> {
        self.client.get("/customers").await
    }

    async fn get_customer(&self, id: &str) -> Result<Customer, ApiError> {
        self.client.get(&format!("/customers/{id}")).await
    }

    async fn create_customer(&self, customer: &NewCustomer) -> Result<Customer, ApiError> {
        self.client.post("/customers", customer).await
    }

    async fn update_customer(&self, id: &str, patch: &UpdateCustomer) -> Result<Customer, ApiError> {
        self.client.put(&format!("/customers/{id}"), patch).await
    }

    async fn delete_customer(&self, id: &str) -> Result<(), ApiError> {
        self.client.delete(&format!("/customers/{id}")).await
    }

    async fn customer_licenses(&self, customer_id: &str) -> Result<Vec<CustomerLicense>, ApiError> {
        self.client.get(&format!("/customers/{customer_id}/licenses")).await
    }

    async fn list_licenses(&self) -> Result<Vec<License>, ApiError> {
        self.client.get("/licenses").await
    }

    async fn get_license(&self, id: &str) -> Result<License, ApiError> {
        self.client.get(&format!("/licenses/{id}")).await
    }

    async fn create_license(&self, license: &CreateLicense) -> Result<License, ApiError> {
        self.client.post("/licenses", license).await
    }

    async fn update_license(&self, id: &str, patch: &UpdateLicense) -> Result<License, ApiError> {
        self.client.put(&format!("/licenses/{id}"), patch).await
    }

    async fn delete_license(&self, id: &str) -> Result<(), ApiError> {
        self.client.delete(&format!("/licenses/{id}")).await
    }

    async fn assign_license(&self, assignment: &Assignment) -> Result<CustomerLicense, ApiError> {
        self.client.post("/licenses/assign", assignment).await
    }

    async fn analytics(&self, timeframe: TimeFrame) -> Result<AnalyticsData, ApiError> {
        self.client
            .get_query("/analytics/dashboard", &[("timeframe", timeframe.as_str())])
            .await
    }

    async fn sales(&self, timeframe: TimeFrame) -> Result<Vec<SalesData>, ApiError> {
        self.client
            .get_query("/analytics/sales", &[("timeframe", timeframe.as_str())])
            .await
    }

    async fn license_distribution(&self) -> Result<Vec<LicenseDistribution>, ApiError> {
        self.client.get("/analytics/license-distribution").await
    }

    async fn top_customers(&self, limit: usize) -> Result<Vec<TopCustomer>, ApiError> {
        self.client.get_query("/analytics/top-customers", &[("limit", limit)]).await
    }

    async fn revenue(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<SalesData>, ApiError> {
        let start = from.format("%Y-%m-%d").to_string();
        let end = to.format("%Y-%m-%d").to_string();
        self.client
            .get_query("/analytics/revenue", &[("startDate", start), ("endDate", end)])
            .await
    }
}
