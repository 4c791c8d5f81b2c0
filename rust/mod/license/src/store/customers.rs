use tracing::{debug, info, warn};

use super::{Activity, Cache, StoreContext, StoreError, StoreResult};
use crate::model::customer::normalize_licenses;
use crate::model::{Assignment, Customer, CustomerLicense, NewCustomer, UpdateCustomer};

/// Cached customers, including the licenses each one holds.
///
/// Records are normalized before caching, so every cached license carries
/// its owner's `customerId`.
pub struct CustomerStore {
    ctx: StoreContext,
    cache: Cache<Customer>,
    activity: Activity,
}

impl CustomerStore {
    pub fn new(ctx: StoreContext) -> Self {
        Self {
            ctx,
            cache: Cache::new(),
            activity: Activity::default(),
        }
    }

    pub async fn list(&self) -> StoreResult<Vec<Customer>> {
        let _busy = self.activity.begin();
        match self.ctx.api.list_customers().await {
            Ok(customers) => {
                let customers: Vec<Customer> = customers.into_iter().map(Customer::normalize).collect();
                if self.ctx.is_live() {
                    debug!(count = customers.len(), "customers cache replaced");
                    self.cache.replace_all(customers.clone());
                }
                Ok(customers)
            }
            Err(e) => Err(self.ctx.failure(e.into(), "Failed to fetch customers")),
        }
    }

    pub async fn get(&self, id: &str) -> StoreResult<Customer> {
        let _busy = self.activity.begin();
        match self.ctx.api.get_customer(id).await {
            Ok(customer) => Ok(self.keep(customer.normalize())),
            Err(e) => Err(self.ctx.failure(e.into(), "Failed to fetch customer")),
        }
    }

    pub async fn create(&self, customer: &NewCustomer) -> StoreResult<Customer> {
        let _busy = self.activity.begin();
        match self.ctx.api.create_customer(customer).await {
            Ok(created) => {
                info!(id = %created.id, name = %created.name, "customer created");
                let created = self.keep(created.normalize());
                self.ctx.success("Customer created successfully");
                Ok(created)
            }
            Err(e) => Err(self.ctx.failure(e.into(), "Failed to create customer")),
        }
    }

    pub async fn update(&self, id: &str, patch: &UpdateCustomer) -> StoreResult<Customer> {
        let _busy = self.activity.begin();
        match self.ctx.api.update_customer(id, patch).await {
            Ok(updated) => {
                info!(id, "customer updated");
                let updated = self.keep(updated.normalize());
                self.ctx.success("Customer updated successfully");
                Ok(updated)
            }
            Err(e) => Err(self.ctx.failure(e.into(), "Failed to update customer")),
        }
    }

    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        let _busy = self.activity.begin();
        match self.ctx.api.delete_customer(id).await {
            Ok(()) => {
                info!(id, "customer deleted");
                if self.ctx.is_live() {
                    self.cache.remove(id);
                }
                self.ctx.success("Customer deleted successfully");
                Ok(())
            }
            Err(e) => Err(self.ctx.failure(e.into(), "Failed to delete customer")),
        }
    }

    /// Fetch a customer's licenses and refresh them on the cached customer.
    pub async fn licenses(&self, customer_id: &str) -> StoreResult<Vec<CustomerLicense>> {
        let _busy = self.activity.begin();
        match self.ctx.api.customer_licenses(customer_id).await {
            Ok(licenses) => {
                let licenses = normalize_licenses(customer_id, licenses);
                if self.ctx.is_live() {
                    self.cache.update(customer_id, |c| c.licenses = licenses.clone());
                }
                Ok(licenses)
            }
            Err(e) => Err(self.ctx.failure(e.into(), "Failed to fetch customer licenses")),
        }
    }

    /// Assign seats of a catalog license to a customer.
    pub async fn assign_license(&self, assignment: &Assignment) -> StoreResult<CustomerLicense> {
        let _busy = self.activity.begin();
        match self.ctx.api.assign_license(assignment).await {
            Ok(record) => {
                let owner = assignment.customer_id();
                let id = record.id.clone();
                let actual = record.customer_id.clone();
                let Some(record) = normalize_licenses(owner, vec![record]).pop() else {
                    let err = StoreError::OwnerMismatch { id, expected: owner.to_string(), actual };
                    return Err(self.ctx.failure(err, "Failed to assign license"));
                };
                info!(customer = owner, license = %record.id, quantity = record.quantity, "license assigned");
                if self.ctx.is_live() {
                    let found = self.cache.update(owner, |c| {
                        match c.licenses.iter_mut().find(|l| l.id == record.id) {
                            Some(slot) => *slot = record.clone(),
                            None => c.licenses.push(record.clone()),
                        }
                    });
                    if !found {
                        warn!(customer = owner, "assigned license to a customer not in cache");
                    }
                }
                self.ctx.success("License assigned successfully");
                Ok(record)
            }
            Err(e) => Err(self.ctx.failure(e.into(), "Failed to assign license")),
        }
    }

    fn keep(&self, customer: Customer) -> Customer {
        if self.ctx.is_live() {
            self.cache.upsert(customer.clone());
        }
        customer
    }

    pub fn snapshot(&self) -> Vec<Customer> {
        self.cache.snapshot()
    }

    pub fn cached(&self, id: &str) -> Option<Customer> {
        self.cache.get(id)
    }

    pub fn is_loading(&self) -> bool {
        self.activity.is_busy()
    }
}
