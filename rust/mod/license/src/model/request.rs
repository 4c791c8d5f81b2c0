use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::dates;
use super::license::LicenseCategory;

// ---------------------------------------------------------------------------
// RequestStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of a license request.
///
/// ```text
/// pending → approved
///         → rejected
/// ```
///
/// Both outcomes are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved) | (Self::Pending, Self::Rejected)
        )
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// LicenseRequest
// ---------------------------------------------------------------------------

/// A customer's ask for a new license seat, subject to admin approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseRequest {
    pub id: String,
    pub customer_id: String,
    #[serde(default)]
    pub customer_name: String,
    /// Free text on the wire. New requests only ever carry a known
    /// [`LicenseCategory`], but older records may name anything.
    pub license_type: String,
    pub subtype: String,
    pub user_email: String,
    #[serde(default)]
    pub mobile: String,
    /// A record the service sent without a status is still pending.
    #[serde(default)]
    pub status: RequestStatus,
    #[serde(with = "dates::instant")]
    pub request_date: DateTime<Utc>,
    #[serde(default, with = "dates::option_instant", skip_serializing_if = "Option::is_none")]
    pub processed_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl LicenseRequest {
    /// The license family named by `license_type`, if it is a known one.
    pub fn category(&self) -> Option<LicenseCategory> {
        LicenseCategory::parse(&self.license_type)
    }
}

/// Body of `POST /requests`. Built by
/// [`crate::validate::RequestDraft::validate`]; the status on the wire is
/// always `pending`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRequest {
    customer_id: String,
    customer_name: String,
    license_type: LicenseCategory,
    subtype: String,
    user_email: String,
    mobile: String,
    status: RequestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

impl NewRequest {
    pub(crate) fn new(
        customer_id: String,
        customer_name: String,
        license_type: LicenseCategory,
        subtype: String,
        user_email: String,
        mobile: String,
        notes: Option<String>,
    ) -> Self {
        Self {
            customer_id,
            customer_name,
            license_type,
            subtype,
            user_email,
            mobile,
            status: RequestStatus::Pending,
            notes,
        }
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn license_type(&self) -> LicenseCategory {
        self.license_type
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    pub fn user_email(&self) -> &str {
        &self.user_email
    }

    pub fn mobile(&self) -> &str {
        &self.mobile
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}

/// An admin decision on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    /// Last path segment of the decision endpoint.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }

    pub fn outcome(&self) -> RequestStatus {
        match self {
            Self::Approve => RequestStatus::Approved,
            Self::Reject => RequestStatus::Rejected,
        }
    }

    /// Past tense used in user-facing messages.
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Approve => "approved",
            Self::Reject => "rejected",
        }
    }
}

/// Body of the approve/reject endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
