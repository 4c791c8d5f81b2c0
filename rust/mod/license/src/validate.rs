//! Form validation.
//!
//! Drafts hold raw user input. `validate()` either produces the typed body
//! a store accepts, or a [`FieldErrors`] map for inline display. Stores only
//! take the typed bodies, so nothing unvalidated reaches the network.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::expiry::{self, TermUnit};
use crate::model::{
    Assignment, CustomerStatus, LicenseCategory, LicenseUser, Location, NewCustomer, NewRequest,
};

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid"));

static PHONE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9\s\-()]{10,}$").expect("phone regex is valid"));

pub fn validate_required(value: &str) -> bool {
    !value.trim().is_empty()
}

pub fn validate_email(value: &str) -> bool {
    EMAIL_REGEX.is_match(value.trim())
}

/// Optional leading `+`, then at least ten digits, spaces, dashes or parens.
pub fn validate_phone(value: &str) -> bool {
    PHONE_REGEX.is_match(value.trim())
}

// ---------------------------------------------------------------------------
// FieldErrors
// ---------------------------------------------------------------------------

/// Per-field validation messages, keyed by the camelCase field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message. The first message for a field is kept.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, msg) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {msg}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

fn trimmed(s: &str) -> String {
    s.trim().to_string()
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

// ---------------------------------------------------------------------------
// RequestDraft
// ---------------------------------------------------------------------------

/// Raw input of the license request form.
#[derive(Debug, Clone, Default)]
pub struct RequestDraft {
    pub customer_id: String,
    pub customer_name: String,
    pub license_type: String,
    pub subtype: String,
    pub user_email: String,
    pub mobile: String,
    pub notes: String,
}

impl RequestDraft {
    pub fn validate(&self) -> Result<NewRequest, FieldErrors> {
        let mut errors = FieldErrors::new();

        if !validate_required(&self.customer_id) {
            errors.add("customerId", "Customer is required");
        }

        let category = if validate_required(&self.license_type) {
            let parsed = LicenseCategory::parse(&self.license_type);
            if parsed.is_none() {
                errors.add("licenseType", format!("Unknown license type: {}", self.license_type.trim()));
            }
            parsed
        } else {
            errors.add("licenseType", "License type is required");
            None
        };

        let subtype = if !validate_required(&self.subtype) {
            errors.add("subtype", "License subtype is required");
            None
        } else if let Some(category) = category {
            let found = category.find_subtype(&self.subtype);
            if found.is_none() {
                errors.add("subtype", format!("Unknown subtype for {category}"));
            }
            found
        } else {
            None
        };

        if !validate_email(&self.user_email) {
            errors.add("userEmail", "Valid email is required");
        }
        if !validate_phone(&self.mobile) {
            errors.add("mobile", "Valid phone number is required");
        }

        match (category, subtype) {
            (Some(category), Some(subtype)) => errors.into_result(|| {
                NewRequest::new(
                    trimmed(&self.customer_id),
                    trimmed(&self.customer_name),
                    category,
                    subtype.to_string(),
                    trimmed(&self.user_email),
                    trimmed(&self.mobile),
                    non_empty(&self.notes),
                )
            }),
            _ => Err(errors),
        }
    }
}

// ---------------------------------------------------------------------------
// CustomerDraft
// ---------------------------------------------------------------------------

/// Raw input of the customer form.
#[derive(Debug, Clone, Default)]
pub struct CustomerDraft {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
    pub status: Option<CustomerStatus>,
}

impl CustomerDraft {
    pub fn validate(&self) -> Result<NewCustomer, FieldErrors> {
        let mut errors = FieldErrors::new();
        if !validate_required(&self.name) {
            errors.add("name", "Name is required");
        }
        if !validate_email(&self.email) {
            errors.add("email", "Valid email is required");
        }
        // Phone is optional, but must be well formed when given.
        if validate_required(&self.phone) && !validate_phone(&self.phone) {
            errors.add("phone", "Valid phone number is required");
        }
        errors.into_result(|| NewCustomer {
            name: trimmed(&self.name),
            email: trimmed(&self.email),
            phone: non_empty(&self.phone),
            address: non_empty(&self.address),
            location: Location {
                city: non_empty(&self.city),
                state: non_empty(&self.state),
                country: non_empty(&self.country),
                postal_code: non_empty(&self.postal_code),
            },
            status: self.status.unwrap_or_default(),
        })
    }
}

// ---------------------------------------------------------------------------
// AssignmentDraft
// ---------------------------------------------------------------------------

/// Raw input of the assign-license form.
///
/// The renewal date is either given directly or computed from a term
/// (`renewal_term`) starting at the purchase date.
#[derive(Debug, Clone)]
pub struct AssignmentDraft {
    pub customer_id: String,
    pub license_id: String,
    pub quantity: u32,
    pub users: Vec<LicenseUser>,
    pub purchase_date: NaiveDate,
    pub renewal_date: Option<NaiveDate>,
    pub renewal_term: Option<(u32, TermUnit)>,
    pub notes: String,
}

impl AssignmentDraft {
    pub fn validate(&self) -> Result<Assignment, FieldErrors> {
        let mut errors = FieldErrors::new();
        if !validate_required(&self.customer_id) {
            errors.add("customerId", "Customer is required");
        }
        if !validate_required(&self.license_id) {
            errors.add("licenseId", "License is required");
        }
        if self.quantity < 1 {
            errors.add("quantity", "Quantity must be at least 1");
        }
        if self.users.len() > self.quantity as usize {
            errors.add(
                "users",
                format!("{} users exceed quantity {}", self.users.len(), self.quantity),
            );
        }
        if let Some(bad) = self.users.iter().find(|u| !validate_email(&u.email)) {
            errors.add("users", format!("Invalid user email: {}", bad.email));
        }
        if let Some(bad) = self
            .users
            .iter()
            .find(|u| validate_required(&u.mobile) && !validate_phone(&u.mobile))
        {
            errors.add("users", format!("Invalid mobile number: {}", bad.mobile));
        }

        let renewal = self.renewal_date.or_else(|| {
            self.renewal_term
                .and_then(|(n, unit)| expiry::renewal_date(self.purchase_date, n, unit))
        });
        match renewal {
            None => errors.add("renewalDate", "Renewal date is required"),
            Some(r) if r <= self.purchase_date => {
                errors.add("renewalDate", "Renewal date must be after purchase date")
            }
            Some(_) => {}
        }

        match renewal {
            Some(renewal_date) => errors.into_result(|| Assignment {
                customer_id: trimmed(&self.customer_id),
                license_id: trimmed(&self.license_id),
                quantity: self.quantity,
                users: self.users.clone(),
                purchase_date: self.purchase_date,
                renewal_date,
                notes: non_empty(&self.notes),
            }),
            None => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RequestStatus;

    fn acme_request() -> RequestDraft {
        RequestDraft {
            customer_id: "c1".into(),
            customer_name: "Acme Ltd".into(),
            license_type: "Microsoft 365".into(),
            subtype: "E3".into(),
            user_email: "u@acme.com".into(),
            mobile: "+1000000000".into(),
            notes: String::new(),
        }
    }

    // ========================================================================
    // Primitives
    // ========================================================================

    #[test]
    fn email_format() {
        assert!(validate_email("u@acme.com"));
        assert!(validate_email("  first.last@sub.example.org "));
        assert!(!validate_email("u@acme"));
        assert!(!validate_email("u acme@x.com"));
        assert!(!validate_email(""));
    }

    #[test]
    fn phone_format() {
        assert!(validate_phone("+1000000000"));
        assert!(validate_phone("(555) 123-4567"));
        assert!(!validate_phone("12345"));
        assert!(!validate_phone("+1 555 CALL NOW"));
    }

    #[test]
    fn required_ignores_whitespace() {
        assert!(!validate_required("   "));
        assert!(validate_required(" x "));
    }

    // ========================================================================
    // Request drafts
    // ========================================================================

    #[test]
    fn valid_request_is_pending() {
        let req = acme_request().validate().unwrap();
        assert_eq!(req.status(), RequestStatus::Pending);
        assert_eq!(req.license_type(), LicenseCategory::Microsoft365);
        assert_eq!(req.notes(), None);
    }

    #[test]
    fn subtype_is_canonicalized() {
        let mut draft = acme_request();
        draft.subtype = "business premium".into();
        assert_eq!(draft.validate().unwrap().subtype(), "Business Premium");
    }

    #[test]
    fn request_collects_every_error() {
        let errors = RequestDraft::default().validate().unwrap_err();
        assert_eq!(errors.get("customerId"), Some("Customer is required"));
        assert_eq!(errors.get("licenseType"), Some("License type is required"));
        assert_eq!(errors.get("subtype"), Some("License subtype is required"));
        assert_eq!(errors.get("userEmail"), Some("Valid email is required"));
        assert_eq!(errors.get("mobile"), Some("Valid phone number is required"));
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn subtype_must_belong_to_type() {
        let mut draft = acme_request();
        draft.license_type = "Windows".into();
        let errors = draft.validate().unwrap_err();
        assert_eq!(errors.get("subtype"), Some("Unknown subtype for Windows"));
        assert_eq!(errors.len(), 1);
    }

    // ========================================================================
    // Customer drafts
    // ========================================================================

    #[test]
    fn customer_defaults_active_and_drops_blanks() {
        let c = CustomerDraft {
            name: " Acme Ltd ".into(),
            email: "ops@acme.com".into(),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(c.name(), "Acme Ltd");
        assert_eq!(c.status(), CustomerStatus::Active);
        assert_eq!(c.phone(), None);
        assert!(c.location().is_empty());

        let c = CustomerDraft {
            name: "Acme Ltd".into(),
            email: "ops@acme.com".into(),
            city: " Leeds ".into(),
            postal_code: "  ".into(),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(c.location().city.as_deref(), Some("Leeds"));
        assert_eq!(c.location().postal_code, None);
    }

    #[test]
    fn customer_bad_phone() {
        let errors = CustomerDraft {
            name: "Acme".into(),
            email: "ops@acme.com".into(),
            phone: "123".into(),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert!(errors.get("phone").is_some());
        assert!(errors.to_string().starts_with("phone:"));
    }

    // ========================================================================
    // Assignment drafts
    // ========================================================================

    fn user(email: &str) -> LicenseUser {
        LicenseUser {
            email: email.into(),
            mobile: String::new(),
            assigned_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        }
    }

    fn assignment(quantity: u32, users: Vec<LicenseUser>) -> AssignmentDraft {
        AssignmentDraft {
            customer_id: "c1".into(),
            license_id: "l1".into(),
            quantity,
            users,
            purchase_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            renewal_date: None,
            renewal_term: Some((1, TermUnit::Years)),
            notes: String::new(),
        }
    }

    #[test]
    fn assignment_computes_renewal_from_term() {
        let a = assignment(2, vec![user("a@acme.com")]).validate().unwrap();
        assert_eq!(a.renewal_date(), NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(a.users().len(), 1);
    }

    #[test]
    fn assignment_users_bounded_by_quantity() {
        let errors = assignment(1, vec![user("a@acme.com"), user("b@acme.com")])
            .validate()
            .unwrap_err();
        assert_eq!(errors.get("users"), Some("2 users exceed quantity 1"));
    }

    #[test]
    fn assignment_zero_quantity_and_missing_renewal() {
        let mut draft = assignment(0, vec![]);
        draft.renewal_term = None;
        let errors = draft.validate().unwrap_err();
        assert!(errors.get("quantity").is_some());
        assert_eq!(errors.get("renewalDate"), Some("Renewal date is required"));
    }
}
