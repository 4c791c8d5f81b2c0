//! Renewal-date classification.
//!
//! ```text
//!        expired        │      expiring       │   active
//! ──────────────────────┼─────────────────────┼──────────────▶ renewal
//!                     today           today + threshold
//! ```
//!
//! Both bounds of the expiring window are inclusive: a renewal due today
//! is still `Expiring`, and one due exactly `threshold` days out is
//! `Expiring` too.

use chrono::{Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{CustomerLicense, LicenseStatus};

/// Days ahead of renewal at which a license starts showing as expiring.
pub const EXPIRING_THRESHOLD_DAYS: i64 = 30;

/// Classifier output. A subset of [`LicenseStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpiryStatus {
    Active,
    Expiring,
    Expired,
}

impl ExpiryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expiring => "expiring",
            Self::Expired => "expired",
        }
    }
}

impl From<ExpiryStatus> for LicenseStatus {
    fn from(s: ExpiryStatus) -> Self {
        match s {
            ExpiryStatus::Active => LicenseStatus::Active,
            ExpiryStatus::Expiring => LicenseStatus::Expiring,
            ExpiryStatus::Expired => LicenseStatus::Expired,
        }
    }
}

impl std::fmt::Display for ExpiryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The current calendar date in UTC.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Whole days from `today` to `renewal`. Negative once past.
pub fn days_until(renewal: NaiveDate, today: NaiveDate) -> i64 {
    (renewal - today).num_days()
}

/// Classify with the default 30-day window.
pub fn classify(renewal: NaiveDate, today: NaiveDate) -> ExpiryStatus {
    classify_with(renewal, today, EXPIRING_THRESHOLD_DAYS)
}

pub fn classify_with(renewal: NaiveDate, today: NaiveDate, threshold_days: i64) -> ExpiryStatus {
    let days = days_until(renewal, today);
    if days < 0 {
        ExpiryStatus::Expired
    } else if days <= threshold_days {
        ExpiryStatus::Expiring
    } else {
        ExpiryStatus::Active
    }
}

/// What a view shows for a customer license on `today`.
///
/// A service-side suspension wins over the date; otherwise the stored
/// status is ignored and the renewal date decides.
pub fn display_status(license: &CustomerLicense, today: NaiveDate) -> LicenseStatus {
    match license.status {
        LicenseStatus::Suspended => LicenseStatus::Suspended,
        _ => classify(license.renewal_date, today).into(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermUnit {
    Months,
    Years,
}

/// Renewal date for a term of `duration` units starting at `start`.
///
/// Month arithmetic clamps to the last day of shorter months
/// (Jan 31 + 1 month = Feb 28/29). Returns `None` on overflow.
pub fn renewal_date(start: NaiveDate, duration: u32, unit: TermUnit) -> Option<NaiveDate> {
    let months = match unit {
        TermUnit::Months => duration,
        TermUnit::Years => duration.checked_mul(12)?,
    };
    start.checked_add_months(Months::new(months))
}

/// `Mar 01, 2025` style rendering used in listings.
pub fn format_display(date: NaiveDate) -> String {
    date.format("%b %d, %Y").to_string()
}
