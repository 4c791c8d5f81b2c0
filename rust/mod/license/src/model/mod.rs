//! Wire and domain types. JSON is camelCase; dates are normalized on the
//! way in by [`dates`].

pub mod analytics;
pub mod customer;
pub mod dates;
pub mod license;
pub mod request;
pub mod user;

pub use analytics::{AnalyticsData, KpiMetrics, LicenseDistribution, SalesData, SalesSeries, TimeFrame, TopCustomer};
pub use customer::{Customer, CustomerStatus, Location, NewCustomer, UpdateCustomer};
pub use license::{
    Assignment, CreateLicense, CustomerLicense, License, LicenseCategory, LicenseStatus, LicenseUser,
    UpdateLicense,
};
pub use request::{Decision, DecisionBody, LicenseRequest, NewRequest, RequestStatus};
pub use user::{AuthResponse, Credentials, Role, User};
