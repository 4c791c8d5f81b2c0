//! What a given user may see, and the list filters on top of it.
//!
//! All role branching lives in [`visible_scope`]: admins see every
//! record, a client sees only records of their own customer, and a client
//! without a customer sees nothing. Filters and ordering are applied to
//! the scoped result.

use chrono::NaiveDate;

use crate::expiry;
use crate::model::{
    Customer, CustomerLicense, CustomerStatus, LicenseRequest, LicenseStatus, RequestStatus, Role, User,
};

/// Number of requests shown in "recent requests" panels.
pub const RECENT_REQUESTS: usize = 5;

/// A record that belongs to exactly one customer.
pub trait CustomerScoped {
    fn owner_id(&self) -> &str;
}

impl CustomerScoped for Customer {
    fn owner_id(&self) -> &str {
        &self.id
    }
}

impl CustomerScoped for LicenseRequest {
    fn owner_id(&self) -> &str {
        &self.customer_id
    }
}

impl CustomerScoped for CustomerLicense {
    fn owner_id(&self) -> &str {
        &self.customer_id
    }
}

/// The subset of `items` visible to `user`, in original order.
pub fn visible_scope<T: CustomerScoped + Clone>(user: &User, items: &[T]) -> Vec<T> {
    match user.role {
        Role::Admin => items.to_vec(),
        Role::Client => match user.customer_id() {
            Some(own) => items.iter().filter(|x| x.owner_id() == own).cloned().collect(),
            None => Vec::new(),
        },
    }
}

/// The client's own customer record.
pub fn own_customer<'a>(user: &User, customers: &'a [Customer]) -> Option<&'a Customer> {
    let own = user.customer_id()?;
    customers.iter().find(|c| c.id == own)
}

/// Every license held by a customer visible to `user`.
pub fn visible_licenses(user: &User, customers: &[Customer]) -> Vec<CustomerLicense> {
    visible_scope(user, customers)
        .into_iter()
        .flat_map(|c| c.licenses)
        .collect()
}

/// Case-insensitive substring match against any field. An empty needle
/// matches everything.
pub fn matches_search(fields: &[&str], needle: &str) -> bool {
    let needle = needle.trim().to_lowercase();
    needle.is_empty() || fields.iter().any(|f| f.to_lowercase().contains(&needle))
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerFilter {
    pub search: String,
    pub status: Option<CustomerStatus>,
}

impl CustomerFilter {
    pub fn is_active(&self) -> bool {
        !self.search.trim().is_empty() || self.status.is_some()
    }

    pub fn matches(&self, c: &Customer) -> bool {
        matches_search(&[c.name.as_str(), c.email.as_str()], &self.search)
            && self.status.map_or(true, |s| c.status == s)
    }

    pub fn apply(&self, items: &[Customer]) -> Vec<Customer> {
        items.iter().filter(|c| self.matches(c)).cloned().collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestFilter {
    pub search: String,
    pub status: Option<RequestStatus>,
}

impl RequestFilter {
    pub fn is_active(&self) -> bool {
        !self.search.trim().is_empty() || self.status.is_some()
    }

    pub fn matches(&self, r: &LicenseRequest) -> bool {
        matches_search(
            &[
                r.customer_name.as_str(),
                r.user_email.as_str(),
                r.license_type.as_str(),
                r.subtype.as_str(),
            ],
            &self.search,
        ) && self.status.map_or(true, |s| r.status == s)
    }

    pub fn apply(&self, items: &[LicenseRequest]) -> Vec<LicenseRequest> {
        items.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

/// Filter over customer licenses. The status compared is the display
/// status on the given day, not the stored one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LicenseFilter {
    pub search: String,
    pub status: Option<LicenseStatus>,
}

impl LicenseFilter {
    pub fn is_active(&self) -> bool {
        !self.search.trim().is_empty() || self.status.is_some()
    }

    pub fn matches(&self, l: &CustomerLicense, today: NaiveDate) -> bool {
        matches_search(&[l.category.as_str(), l.subtype.as_str()], &self.search)
            && self
                .status
                .map_or(true, |s| expiry::display_status(l, today) == s)
    }

    pub fn apply(&self, items: &[CustomerLicense], today: NaiveDate) -> Vec<CustomerLicense> {
        items.iter().filter(|l| self.matches(l, today)).cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Requests newest first. Ties keep their original order.
pub fn most_recent(requests: &[LicenseRequest]) -> Vec<LicenseRequest> {
    let mut sorted = requests.to_vec();
    sorted.sort_by(|a, b| b.request_date.cmp(&a.request_date));
    sorted
}

/// The `n` newest requests.
pub fn recent(requests: &[LicenseRequest], n: usize) -> Vec<LicenseRequest> {
    let mut sorted = most_recent(requests);
    sorted.truncate(n);
    sorted
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

/// What a list renders.
#[derive(Debug, Clone, PartialEq)]
pub enum View<T> {
    /// Nothing exists yet.
    Empty,
    /// Records exist but none pass the active filter.
    NoMatches,
    Items(Vec<T>),
}

impl<T> View<T> {
    pub fn new(filtered: Vec<T>, filter_active: bool) -> Self {
        match (filtered.is_empty(), filter_active) {
            (false, _) => View::Items(filtered),
            (true, true) => View::NoMatches,
            (true, false) => View::Empty,
        }
    }

    pub fn items(&self) -> &[T] {
        match self {
            View::Items(items) => items,
            _ => &[],
        }
    }

    /// Placeholder text for a list of `noun` (plural), if there are no items.
    pub fn placeholder(&self, noun: &str) -> Option<String> {
        match self {
            View::Empty => Some(format!("No {noun} available")),
            View::NoMatches => Some(format!("No {noun} found matching your filters")),
            View::Items(_) => None,
        }
    }
}

/// Licenses view for `user`: the client's own licenses, or every
/// customer's for an admin, after filtering.
pub fn license_view(
    user: &User,
    customers: &[Customer],
    filter: &LicenseFilter,
    today: NaiveDate,
) -> View<CustomerLicense> {
    let licenses = visible_licenses(user, customers);
    View::new(filter.apply(&licenses, today), filter.is_active())
}

/// Requests view for `user`, newest first.
pub fn request_view(user: &User, requests: &[LicenseRequest], filter: &RequestFilter) -> View<LicenseRequest> {
    let scoped = visible_scope(user, requests);
    View::new(most_recent(&filter.apply(&scoped)), filter.is_active())
}

/// Customers view for `user`.
pub fn customer_view(user: &User, customers: &[Customer], filter: &CustomerFilter) -> View<Customer> {
    let scoped = visible_scope(user, customers);
    View::new(filter.apply(&scoped), filter.is_active())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, admin, client, customer, customer_license, date, request};
    use chrono::Duration;

    fn dataset() -> Vec<LicenseRequest> {
        vec![
            request("r1", "c1", RequestStatus::Pending),
            request("r2", "c2", RequestStatus::Approved),
            request("r3", "c1", RequestStatus::Rejected),
            request("r4", "c3", RequestStatus::Pending),
        ]
    }

    // ========================================================================
    // visible_scope
    // ========================================================================

    #[test]
    fn client_sees_exactly_own_requests() {
        let all = dataset();
        for own in ["c1", "c2", "c3", "c9"] {
            let user = client(own);
            let seen = visible_scope(&user, &all);
            let expected: Vec<_> = all.iter().filter(|r| r.customer_id == own).cloned().collect();
            assert_eq!(seen, expected);
            // Other customers exist in every case, so the view is strict.
            assert!(seen.len() < all.len());
        }
    }

    #[test]
    fn admin_sees_everything() {
        let all = dataset();
        assert_eq!(visible_scope(&admin(), &all), all);
    }

    #[test]
    fn client_without_customer_sees_nothing() {
        let mut user = client("c1");
        user.customer_id = None;
        assert!(visible_scope(&user, &dataset()).is_empty());
        user.customer_id = Some(String::new());
        assert!(visible_scope(&user, &dataset()).is_empty());
    }

    #[test]
    fn own_customer_lookup() {
        let customers = vec![customer("c1", "Acme Ltd"), customer("c2", "Globex")];
        assert_eq!(own_customer(&client("c2"), &customers).unwrap().name, "Globex");
        assert!(own_customer(&admin(), &customers).is_none());
    }

    // ========================================================================
    // Filters
    // ========================================================================

    #[test]
    fn search_acme() {
        let customers = vec![customer("c1", "Acme Ltd"), customer("c2", "Globex")];
        let filter = CustomerFilter { search: "acme".into(), status: None };
        let found = filter.apply(&customers);
        assert_eq!(found, vec![customers[0].clone()]);
    }

    #[test]
    fn search_and_status_compose() {
        let mut customers = vec![customer("c1", "Acme Ltd"), customer("c2", "Acme Labs")];
        customers[1].status = CustomerStatus::Suspended;
        let filter = CustomerFilter { search: "ACME".into(), status: Some(CustomerStatus::Suspended) };
        let found = filter.apply(&customers);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "c2");
    }

    #[test]
    fn request_search_fields() {
        let mut all = dataset();
        all[1].subtype = "Business Premium".into();
        let by_subtype = RequestFilter { search: "premium".into(), status: None };
        assert_eq!(by_subtype.apply(&all).len(), 1);

        let by_type = RequestFilter { search: "microsoft".into(), status: Some(RequestStatus::Pending) };
        assert_eq!(by_type.apply(&all).len(), 2);

        let by_email = RequestFilter { search: "@c3.".into(), status: None };
        assert_eq!(by_email.apply(&all)[0].id, "r4");
    }

    #[test]
    fn license_filter_uses_display_status() {
        let today = date(2025, 6, 1);
        let soon = customer_license("a", "c1", today + Duration::days(10));
        let later = customer_license("b", "c1", today + Duration::days(90));
        let filter = LicenseFilter { search: String::new(), status: Some(LicenseStatus::Expiring) };
        assert_eq!(filter.apply(&[soon.clone(), later], today), vec![soon]);
    }

    // ========================================================================
    // Ordering
    // ========================================================================

    #[test]
    fn newest_first_and_recent_n() {
        let mut all = dataset();
        for (i, r) in all.iter_mut().enumerate() {
            r.request_date += Duration::days(i as i64);
        }
        let ids: Vec<_> = most_recent(&all).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, ["r4", "r3", "r2", "r1"]);
        assert_eq!(recent(&all, 2).len(), 2);
        assert_eq!(recent(&all, 10).len(), 4);
    }

    // ========================================================================
    // Views
    // ========================================================================

    #[test]
    fn customer_with_no_licenses_is_empty_state() {
        let customers = vec![customer("c1", "Acme Ltd")];
        let view = license_view(&client("c1"), &customers, &LicenseFilter::default(), fixtures::date(2025, 1, 1));
        assert_eq!(view, View::Empty);
        assert_eq!(view.placeholder("licenses").as_deref(), Some("No licenses available"));
        assert!(view.items().is_empty());
    }

    #[test]
    fn filtered_out_is_no_matches() {
        let mut c = customer("c1", "Acme Ltd");
        c.licenses.push(customer_license("a", "c1", date(2026, 1, 1)));
        let filter = LicenseFilter { search: "sophos".into(), status: None };
        let view = license_view(&client("c1"), &[c], &filter, date(2025, 1, 1));
        assert_eq!(view, View::NoMatches);
        assert_eq!(
            view.placeholder("licenses").as_deref(),
            Some("No licenses found matching your filters")
        );
    }

    #[test]
    fn request_view_scopes_then_sorts() {
        let mut all = dataset();
        all[2].request_date += Duration::hours(1);
        let view = request_view(&client("c1"), &all, &RequestFilter::default());
        let ids: Vec<_> = view.items().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["r3", "r1"]);
    }
}
