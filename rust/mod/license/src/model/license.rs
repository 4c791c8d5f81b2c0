use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::dates;

// ---------------------------------------------------------------------------
// LicenseCategory
// ---------------------------------------------------------------------------

/// Top-level license family. Each family has a fixed list of subtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LicenseCategory {
    #[serde(rename = "Microsoft 365")]
    Microsoft365,
    Windows,
    Sophos,
    Zoho,
    Voucher,
}

impl LicenseCategory {
    pub const ALL: [LicenseCategory; 5] = [
        Self::Microsoft365,
        Self::Windows,
        Self::Sophos,
        Self::Zoho,
        Self::Voucher,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Microsoft365 => "Microsoft 365",
            Self::Windows => "Windows",
            Self::Sophos => "Sophos",
            Self::Zoho => "Zoho",
            Self::Voucher => "Voucher",
        }
    }

    /// Case-insensitive lookup by display name.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|c| c.as_str().eq_ignore_ascii_case(s))
    }

    pub fn subtypes(&self) -> &'static [&'static str] {
        match self {
            Self::Microsoft365 => &[
                "Business Basic",
                "Business Standard",
                "Business Premium",
                "E3",
                "E5",
            ],
            Self::Windows => &[
                "Windows 10 Pro",
                "Windows 11 Pro",
                "Windows 11 Enterprise",
                "Windows Server 2022",
            ],
            Self::Sophos => &[
                "Endpoint Protection",
                "Complete Security",
                "XG Firewall",
                "Central Cloud",
            ],
            Self::Zoho => &[
                "Workplace Standard",
                "Workplace Professional",
                "CRM Standard",
                "CRM Professional",
            ],
            Self::Voucher => &["Gift Card", "Promotional Code"],
        }
    }

    /// The canonical spelling of `subtype` under this category, if listed.
    pub fn find_subtype(&self, subtype: &str) -> Option<&'static str> {
        let subtype = subtype.trim();
        self.subtypes()
            .iter()
            .copied()
            .find(|s| s.eq_ignore_ascii_case(subtype))
    }
}

impl std::fmt::Display for LicenseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// LicenseStatus
// ---------------------------------------------------------------------------

/// Status of a license held by a customer.
///
/// `Suspended` is only ever set by the service. The other three are
/// derived from the renewal date, see [`crate::expiry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseStatus {
    #[default]
    Active,
    Expiring,
    Expired,
    Suspended,
}

impl LicenseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expiring => "expiring",
            Self::Expired => "expired",
            Self::Suspended => "suspended",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Some(Self::Active),
            "expiring" => Some(Self::Expiring),
            "expired" => Some(Self::Expired),
            "suspended" => Some(Self::Suspended),
            _ => None,
        }
    }
}

impl std::fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// License (catalog item)
// ---------------------------------------------------------------------------

/// A sellable license defined by an administrator.
///
/// `price >= cost` is expected but not enforced; a negative margin is
/// reported as such.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct License {
    pub id: String,
    #[serde(rename = "type")]
    pub category: LicenseCategory,
    pub subtype: String,
    pub cost: f64,
    pub price: f64,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, with = "dates::option_instant", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "dates::option_instant", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

impl License {
    pub fn profit(&self) -> f64 {
        crate::dashboard::profit(self.cost, self.price)
    }

    pub fn margin(&self) -> f64 {
        crate::dashboard::margin(self.cost, self.price)
    }
}

/// Body of `POST /licenses`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLicense {
    #[serde(rename = "type")]
    pub category: LicenseCategory,
    pub subtype: String,
    pub cost: f64,
    pub price: f64,
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Body of `PUT /licenses/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLicense {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// CustomerLicense
// ---------------------------------------------------------------------------

/// A seat holder on a customer license.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseUser {
    pub email: String,
    #[serde(default)]
    pub mobile: String,
    #[serde(with = "dates::calendar")]
    pub assigned_date: NaiveDate,
}

/// A license held by a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerLicense {
    pub id: String,
    pub license_id: String,
    /// Owning customer. May be missing on the wire for nested records;
    /// filled in from the owner during normalization.
    #[serde(default)]
    pub customer_id: String,
    #[serde(rename = "type")]
    pub category: LicenseCategory,
    pub subtype: String,
    pub quantity: u32,
    #[serde(default)]
    pub users: Vec<LicenseUser>,
    #[serde(with = "dates::calendar")]
    pub purchase_date: NaiveDate,
    #[serde(with = "dates::calendar")]
    pub renewal_date: NaiveDate,
    #[serde(default)]
    pub status: LicenseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CustomerLicense {
    /// Seats not yet assigned to a user.
    pub fn seats_available(&self) -> u32 {
        let used = u32::try_from(self.users.len()).unwrap_or(u32::MAX);
        self.quantity.saturating_sub(used)
    }

    /// Whether `users.len() <= quantity` holds.
    pub fn within_quantity(&self) -> bool {
        self.users.len() <= self.quantity as usize
    }
}

/// Body of `POST /licenses/assign`. Built by
/// [`crate::validate::AssignmentDraft::validate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub(crate) customer_id: String,
    pub(crate) license_id: String,
    pub(crate) quantity: u32,
    pub(crate) users: Vec<LicenseUser>,
    #[serde(with = "dates::calendar")]
    pub(crate) purchase_date: NaiveDate,
    #[serde(with = "dates::calendar")]
    pub(crate) renewal_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) notes: Option<String>,
}

impl Assignment {
    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn license_id(&self) -> &str {
        &self.license_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn users(&self) -> &[LicenseUser] {
        &self.users
    }

    pub fn purchase_date(&self) -> NaiveDate {
        self.purchase_date
    }

    pub fn renewal_date(&self) -> NaiveDate {
        self.renewal_date
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_wire_names() {
        let json = serde_json::to_string(&LicenseCategory::Microsoft365).unwrap();
        assert_eq!(json, r#""Microsoft 365""#);
        let back: LicenseCategory = serde_json::from_str(r#""Sophos""#).unwrap();
        assert_eq!(back, LicenseCategory::Sophos);
        assert_eq!(LicenseCategory::parse("microsoft 365"), Some(LicenseCategory::Microsoft365));
        assert_eq!(LicenseCategory::parse("Office"), None);
    }

    #[test]
    fn subtype_lookup_is_per_category() {
        assert_eq!(LicenseCategory::Microsoft365.find_subtype("e3"), Some("E3"));
        assert_eq!(LicenseCategory::Windows.find_subtype("E3"), None);
        assert_eq!(LicenseCategory::Voucher.subtypes().len(), 2);
    }

    #[test]
    fn customer_license_from_mixed_wire_dates() {
        let json = r#"{
            "id": "cl1", "licenseId": "l1", "type": "Windows",
            "subtype": "Windows 11 Pro", "quantity": 3,
            "users": [{"email": "a@x.com", "mobile": "+15550000000", "assignedDate": 1735689600000}],
            "purchaseDate": "2025-01-01T00:00:00.000Z",
            "renewalDate": "2026-01-01",
            "status": "active"
        }"#;
        let cl: CustomerLicense = serde_json::from_str(json).unwrap();
        assert_eq!(cl.customer_id, "");
        assert_eq!(cl.purchase_date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(cl.users[0].assigned_date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(cl.seats_available(), 2);
        assert!(cl.within_quantity());
    }

    #[test]
    fn license_defaults_active() {
        let json = r#"{"id":"l1","type":"Zoho","subtype":"CRM Standard","cost":10,"price":15}"#;
        let l: License = serde_json::from_str(json).unwrap();
        assert!(l.active);
        assert_eq!(l.profit(), 5.0);
    }
}
