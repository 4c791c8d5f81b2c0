use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::dates;
use super::license::CustomerLicense;

/// Account status of a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
}

impl CustomerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Suspended => "suspended",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "suspended" => Some(Self::Suspended),
            _ => None,
        }
    }
}

impl std::fmt::Display for CustomerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a customer is. Every part is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

impl Location {
    pub fn is_empty(&self) -> bool {
        self.parts().next().is_none()
    }

    /// The parts present, joined with ", ".
    pub fn summary(&self) -> String {
        self.parts().collect::<Vec<_>>().join(", ")
    }

    /// Overwrite the parts `patch` sets.
    pub fn merge(&mut self, patch: &Location) {
        for (slot, value) in [
            (&mut self.city, &patch.city),
            (&mut self.state, &patch.state),
            (&mut self.country, &patch.country),
            (&mut self.postal_code, &patch.postal_code),
        ] {
            if let Some(v) = value {
                *slot = Some(v.clone());
            }
        }
    }

    fn parts(&self) -> impl Iterator<Item = &str> {
        [&self.city, &self.state, &self.postal_code, &self.country]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .filter(|p| !p.trim().is_empty())
    }
}

/// A customer account and the licenses it holds.
///
/// Every entry in `licenses` belongs to this customer. Records coming off
/// the wire go through [`Customer::normalize`] before they are cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(flatten)]
    pub location: Location,
    #[serde(default)]
    pub status: CustomerStatus,
    #[serde(default)]
    pub total_spent: f64,
    #[serde(default, with = "dates::option_instant")]
    pub last_purchase: Option<DateTime<Utc>>,
    #[serde(default)]
    pub licenses: Vec<CustomerLicense>,
    #[serde(default, with = "dates::option_instant", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "dates::option_instant", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Customer {
    /// Restore the ownership invariant on nested licenses.
    ///
    /// Entries with an empty `customerId` inherit this customer's id.
    /// Entries claiming a different owner are dropped.
    pub fn normalize(mut self) -> Self {
        let owner = self.id.clone();
        self.licenses = normalize_licenses(&owner, std::mem::take(&mut self.licenses));
        self
    }

    pub fn total_seats(&self) -> u64 {
        self.licenses.iter().map(|l| u64::from(l.quantity)).sum()
    }
}

/// Apply the ownership rule to a list of licenses fetched for `owner`.
pub fn normalize_licenses(owner: &str, licenses: Vec<CustomerLicense>) -> Vec<CustomerLicense> {
    licenses
        .into_iter()
        .filter_map(|mut l| {
            if l.customer_id.is_empty() {
                l.customer_id = owner.to_string();
            } else if l.customer_id != owner {
                warn!(
                    customer = owner,
                    license = %l.id,
                    claimed_owner = %l.customer_id,
                    "dropping license owned by another customer"
                );
                return None;
            }
            if !l.within_quantity() {
                warn!(
                    customer = owner,
                    license = %l.id,
                    users = l.users.len(),
                    quantity = l.quantity,
                    "license has more users than seats"
                );
            }
            Some(l)
        })
        .collect()
}

/// Body of `POST /customers`. Built by
/// [`crate::validate::CustomerDraft::validate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    pub(crate) name: String,
    pub(crate) email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) address: Option<String>,
    #[serde(flatten)]
    pub(crate) location: Location,
    pub(crate) status: CustomerStatus,
}

impl NewCustomer {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn status(&self) -> CustomerStatus {
        self.status
    }
}

/// Body of `PUT /customers/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Parts set here replace the stored ones; the rest are kept.
    #[serde(flatten)]
    pub location: Location,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CustomerStatus>,
}
