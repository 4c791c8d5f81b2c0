//! End-to-end: an admin onboards a customer, a client requests a license,
//! the admin decides, and every role sees what it should.

use std::sync::Arc;

use chrono::{Duration, Utc};
use msp_license::guard::{Access, AdminPage, ClientPage, Route};
use msp_license::model::{CustomerStatus, RequestStatus, Role, User};
use msp_license::scope::{self, CustomerFilter, LicenseFilter, RequestFilter, View};
use msp_license::{
    classify, AppContext, CustomerDraft, ExpiryStatus, InMemoryLicenseApi, NotificationKind, RequestDraft, Session,
    StoreError,
};

fn admin_user() -> User {
    User {
        id: "u-admin".into(),
        email: "admin@msp.io".into(),
        name: "Admin".into(),
        role: Role::Admin,
        customer_id: None,
    }
}

fn client_user(customer_id: &str) -> User {
    User {
        id: "u-client".into(),
        email: "it@acme.com".into(),
        name: "Acme IT".into(),
        role: Role::Client,
        customer_id: Some(customer_id.into()),
    }
}

#[tokio::test]
async fn acme_request_lifecycle() {
    let api = Arc::new(InMemoryLicenseApi::new());
    api.add_account(admin_user(), "admin-pass");
    api.set_processor("admin@msp.io");
    let ctx = AppContext::init(api.clone(), Session::new());

    // --- admin onboards Acme ---
    ctx.login("admin@msp.io", "admin-pass").await.unwrap();
    let customers = ctx.customers();
    let acme = customers
        .create(
            &CustomerDraft {
                name: "Acme Ltd".into(),
                email: "ops@acme.com".into(),
                status: Some(CustomerStatus::Active),
                ..Default::default()
            }
            .validate()
            .unwrap(),
        )
        .await
        .unwrap();
    let globex = customers
        .create(
            &CustomerDraft {
                name: "Globex".into(),
                email: "it@globex.com".into(),
                ..Default::default()
            }
            .validate()
            .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(acme.status, CustomerStatus::Active);

    // --- a request is submitted for Acme ---
    let requests = ctx.requests();
    let draft = RequestDraft {
        customer_id: acme.id.clone(),
        customer_name: acme.name.clone(),
        license_type: "Microsoft 365".into(),
        subtype: "E3".into(),
        user_email: "u@acme.com".into(),
        mobile: "+1000000000".into(),
        notes: String::new(),
    };
    let submitted = requests.create(&draft.validate().unwrap()).await.unwrap();
    assert_eq!(submitted.status, RequestStatus::Pending);

    // A Globex request so that scoping has something to hide.
    let other = RequestDraft { customer_id: globex.id.clone(), ..draft.clone() };
    requests.create(&other.validate().unwrap()).await.unwrap();

    // --- list holds exactly one pending request for Acme ---
    let all = requests.list().await.unwrap();
    let for_acme: Vec<_> = all
        .iter()
        .filter(|r| r.customer_id == acme.id && r.status == RequestStatus::Pending)
        .collect();
    assert_eq!(for_acme.len(), 1);
    assert_eq!(for_acme[0].customer_name, "Acme Ltd");

    // --- admin approves ---
    let approved = requests.approve(&submitted.id, Some("ok")).await.unwrap();
    assert_eq!(approved.status, RequestStatus::Approved);
    assert!(approved.processed_date.is_some());
    assert_eq!(approved.processed_by.as_deref(), Some("admin@msp.io"));
    assert_eq!(approved.notes.as_deref(), Some("ok"));
    assert_eq!(requests.cached(&submitted.id).unwrap().status, RequestStatus::Approved);

    // --- a later reject fails and changes nothing ---
    let err = requests.reject(&submitted.id, None).await.unwrap_err();
    assert!(matches!(err, StoreError::AlreadyProcessed { .. }));
    assert_eq!(api.stored_request(&submitted.id).unwrap().status, RequestStatus::Approved);
    let last = ctx.notifications().active().pop().unwrap();
    assert_eq!(last.kind, NotificationKind::Error);

    // --- the same holds when the cache is stale ---
    let fresh = ctx.requests();
    let err = fresh.reject(&submitted.id, None).await.unwrap_err();
    assert_eq!(err.status(), Some(409));

    // --- client view is exactly Acme's requests ---
    let client = client_user(&acme.id);
    let snapshot = requests.snapshot();
    let seen = scope::visible_scope(&client, &snapshot);
    let expected: Vec<_> = snapshot.iter().filter(|r| r.customer_id == acme.id).cloned().collect();
    assert_eq!(seen, expected);
    assert!(seen.len() < snapshot.len());

    let pending_view = scope::request_view(
        &client,
        &snapshot,
        &RequestFilter { search: String::new(), status: Some(RequestStatus::Pending) },
    );
    assert_eq!(pending_view, View::NoMatches);

    // --- admin search ---
    let found = CustomerFilter { search: "acme".into(), status: None }.apply(&customers.snapshot());
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Acme Ltd");

    // --- Acme holds no licenses yet: empty state, not an error ---
    let today = Utc::now().date_naive();
    let licenses = customers.licenses(&acme.id).await.unwrap();
    assert!(licenses.is_empty());
    let view = scope::license_view(&client, &customers.snapshot(), &LicenseFilter::default(), today);
    assert_eq!(view, View::Empty);
}

#[tokio::test]
async fn client_navigation_after_login() {
    let api = Arc::new(InMemoryLicenseApi::new());
    api.add_account(client_user("c1"), "pw");
    let ctx = AppContext::init(api, Session::new());
    let mut nav = ctx.navigator();

    assert_eq!(nav.navigate("/client/requests"), Access::Loading);

    ctx.login("it@acme.com", "pw").await.unwrap();
    assert_eq!(nav.refresh(), Access::Authorized(Route::Client(ClientPage::Requests)));
    assert_eq!(
        nav.navigate("/admin/pending"),
        Access::Authorized(Route::Client(ClientPage::Dashboard))
    );

    ctx.logout();
    assert_eq!(nav.navigate("/admin/pending"), Access::Authorized(Route::Login));
    assert_ne!(*nav.current(), Route::Admin(AdminPage::Pending));
}

#[test]
fn classifier_window_on_the_real_clock() {
    let today = Utc::now().date_naive();
    assert_eq!(classify(today + Duration::days(30), today), ExpiryStatus::Expiring);
    assert_eq!(classify(today + Duration::days(31), today), ExpiryStatus::Active);
    assert_eq!(classify(today - Duration::days(1), today), ExpiryStatus::Expired);
}
