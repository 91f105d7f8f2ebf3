//! Tests for the membership client

use super::*;
use crate::decode::MemorySink;
use crate::temporal::parse_timestamp;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::{Arc, Mutex};

/// Serves fixed pages per endpoint; a missing page is an empty envelope
#[derive(Default)]
struct FakeApi {
    pages: HashMap<String, Vec<Value>>,
    failures: HashMap<String, u32>,
    requests: Arc<Mutex<Vec<PageRequest>>>,
}

impl FakeApi {
    fn with_pages(mut self, endpoint: &str, pages: Vec<Value>) -> Self {
        self.pages.insert(endpoint.to_string(), pages);
        self
    }

    /// Fail with an API error when `page` of `endpoint` is requested
    fn failing_at(mut self, endpoint: &str, page: u32) -> Self {
        self.failures.insert(endpoint.to_string(), page);
        self
    }
}

impl PageSource for FakeApi {
    fn fetch(&self, request: &PageRequest) -> Result<crate::pagination::Envelope> {
        self.requests.lock().unwrap().push(request.clone());
        let page = request.page.unwrap_or(0);

        if self.failures.get(&request.endpoint) == Some(&page) {
            return Err(Error::api("Temporarily unavailable"));
        }

        let body = self
            .pages
            .get(&request.endpoint)
            .and_then(|pages| pages.get(page as usize))
            .cloned()
            .unwrap_or_else(|| json!({"_total": 0}));
        crate::pagination::Envelope::from_value(body)
    }
}

fn client(api: FakeApi) -> (MemberClient, Arc<Mutex<Vec<PageRequest>>>) {
    let requests = Arc::clone(&api.requests);
    let client = MemberClient::new(Box::new(api), Box::new(MemorySink::new()));
    (client, requests)
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ============================================================================
// Listing Tests
// ============================================================================

#[test]
fn test_users_keyed_by_login() {
    let api = FakeApi::default().with_pages(
        endpoints::USERS,
        vec![json!({
            "1": {"user_id": "1", "login": "alice", "added": "2023-05-01 10:00:00"},
            "2": {"user_id": "2", "login": "bob", "added": ""},
            "_total": 2
        })],
    );
    let (client, requests) = client(api);

    let users = client.users(&Params::new()).into_result().unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(users["alice"].user_id, 1);
    assert_eq!(
        users["alice"].added.map(|t| t.to_string()),
        Some("2023-05-01 10:00:00".to_string())
    );
    assert!(users["bob"].added.is_none());

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].page, Some(0));
    assert_eq!(requests[0].count, DEFAULT_PAGE_SIZE);
}

#[test]
fn test_invoices_with_nested_children() {
    let api = FakeApi::default().with_pages(
        endpoints::INVOICES,
        vec![json!({
            "0": {
                "invoice_id": "55",
                "user_id": "1",
                "nested": {
                    "invoice-payments": [{"invoice_payment_id": "9", "amount": "12.50"}],
                    "invoice-items": [{"item_title": "Native"}, {"item_title": "Mobile"}],
                    "access": [{"access_id": "3"}]
                }
            },
            "_total": 1
        })],
    );
    let (client, _) = client(api);

    let params = Params::new()
        .with_nested("invoice-payments")
        .with_nested("invoice-items")
        .with_nested("access");
    let invoices = client.invoices(&params).into_result().unwrap();

    let invoice = &invoices[&55];
    assert_eq!(invoice.nested.invoice_payments[0].amount, 12.5);
    let titles: Vec<&str> = invoice
        .nested
        .invoice_items
        .iter()
        .map(|i| i.item_title.as_str())
        .collect();
    assert_eq!(titles, vec!["Native", "Mobile"]);
    assert_eq!(invoice.nested.access[0].access_id, 3);
}

#[test]
fn test_payments_and_products_keyed_by_id() {
    let api = FakeApi::default()
        .with_pages(
            endpoints::PAYMENTS,
            vec![json!({
                "a": {"invoice_payment_id": 7, "amount": "3.00", "refunded": "0"},
                "_total": 1
            })],
        )
        .with_pages(
            endpoints::PRODUCTS,
            vec![json!({
                "a": {"product_id": "4", "title": "Native"},
                "_total": 1
            })],
        );
    let (client, _) = client(api);

    let payments = client.payments(&Params::new()).into_result().unwrap();
    assert_eq!(payments[&7].amount, 3.0);
    assert!(!payments[&7].refunded);

    let products = client.products(&Params::new()).into_result().unwrap();
    assert_eq!(products[&4].title, "Native");
}

#[test]
fn test_filters_reach_the_source() {
    let (client, requests) = client(FakeApi::default());

    let params = Params::new().with_filter("status", "1");
    let _ = client.users(&params);

    let requests = requests.lock().unwrap();
    assert_eq!(requests[0].endpoint, "users");
    assert_eq!(requests[0].params.filter["status"], "1");
}

#[test]
fn test_page_size_is_forwarded() {
    let (client, requests) = client(FakeApi::default());
    let client = client.with_page_size(25);

    let _ = client.products(&Params::new());
    assert_eq!(requests.lock().unwrap()[0].count, 25);
}

#[test]
fn test_partial_listing_on_error() {
    let mut page0 = serde_json::Map::new();
    page0.insert("_total".to_string(), json!(2));
    page0.insert("1".to_string(), json!({"product_id": 1}));
    page0.insert("2".to_string(), json!({"product_id": 2}));

    let api = FakeApi::default()
        .with_pages(endpoints::PRODUCTS, vec![Value::Object(page0)])
        .failing_at(endpoints::PRODUCTS, 1);
    let (client, _) = client(api);
    let client = client.with_page_size(2);

    let listing = client.products(&Params::new());
    assert_eq!(listing.records.len(), 2);
    assert!(listing.error.unwrap().is_api());
}

// ============================================================================
// Access Tests
// ============================================================================

fn access_pages() -> Vec<Value> {
    vec![json!({
        "1": {"access_id": 1, "user_id": 10, "expire_date": "2024-06-09"},
        "2": {"access_id": 2, "user_id": 10, "expire_date": "2024-06-10"},
        "3": {"access_id": 3, "user_id": 11, "expire_date": "2025-01-01"},
        "4": {"access_id": 4, "user_id": 12, "expire_date": ""},
        "_total": 4
    })]
}

#[test]
fn test_accesses_active_only_drops_yesterday() {
    let api = FakeApi::default().with_pages(endpoints::ACCESS, access_pages());
    let (client, _) = client(api);

    let active = client
        .accesses_on(&Params::new(), true, day(2024, 6, 10))
        .into_result()
        .unwrap();

    let ids: Vec<i64> = active[&10].iter().map(|a| a.access_id).collect();
    assert_eq!(ids, vec![2]);
    assert_eq!(active[&11].len(), 1);
    assert!(!active.contains_key(&12));
}

#[test]
fn test_accesses_without_filter_keep_everything() {
    let api = FakeApi::default().with_pages(endpoints::ACCESS, access_pages());
    let (client, _) = client(api);

    let all = client
        .accesses_on(&Params::new(), false, day(2024, 6, 10))
        .into_result()
        .unwrap();

    let ids: Vec<i64> = all[&10].iter().map(|a| a.access_id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(all[&12].len(), 1);
}

// ============================================================================
// Membership Tests
// ============================================================================

fn membership_pages() -> Vec<Value> {
    vec![json!({
        "1": {
            "login": "alice",
            "nested": {"access": [
                {"access_id": 1, "expire_date": "2024-06-09"},
                {"access_id": 2, "expire_date": "2024-12-31"}
            ]}
        },
        "2": {"login": "bob"},
        "3": {"login": "carol", "nested": {"access": []}},
        "_total": 3
    })]
}

#[test]
fn test_memberships_request_access_nested() {
    let (client, requests) = client(FakeApi::default());

    let _ = client.memberships_on(
        &Params::new().with_nested("access"),
        false,
        day(2024, 6, 10),
    );

    let requests = requests.lock().unwrap();
    assert_eq!(requests[0].params.nested, vec!["access".to_string()]);
}

#[test]
fn test_memberships_active_only() {
    let api = FakeApi::default().with_pages(endpoints::USERS, membership_pages());
    let (client, _) = client(api);

    let memberships = client
        .memberships_on(&Params::new(), true, day(2024, 6, 10))
        .into_result()
        .unwrap();

    // bob has no nested wrapper and is skipped
    assert_eq!(memberships.len(), 2);
    let ids: Vec<i64> = memberships["alice"]
        .accesses
        .iter()
        .map(|a| a.access_id)
        .collect();
    assert_eq!(ids, vec![2]);
    assert!(memberships["carol"].accesses.is_empty());
}

#[test]
fn test_memberships_all_accesses() {
    let api = FakeApi::default().with_pages(endpoints::USERS, membership_pages());
    let (client, _) = client(api);

    let memberships = client
        .memberships_on(&Params::new(), false, day(2024, 6, 10))
        .into_result()
        .unwrap();

    assert_eq!(memberships.len(), 3);
    assert_eq!(memberships["alice"].accesses.len(), 2);
    assert!(memberships["bob"].accesses.is_empty());
    assert_eq!(memberships["bob"].user.login, "bob");
}

// ============================================================================
// Product Category Tests
// ============================================================================

#[test]
fn test_product_categories_inverted() {
    let api = FakeApi::default().with_pages(
        endpoints::PRODUCT_CATEGORIES,
        vec![json!({
            "1": ["10", "11"],
            "2": ["10", "bad"],
            "x": ["12"],
            "3": "not-a-list",
            "_total": 4
        })],
    );
    let requests = Arc::clone(&api.requests);
    let sink = Arc::new(MemorySink::new());

    struct Shared(Arc<MemorySink>);
    impl DiagnosticSink for Shared {
        fn report(&self, diagnostic: Diagnostic) {
            self.0.report(diagnostic);
        }
    }

    let client = MemberClient::new(Box::new(api), Box::new(Shared(Arc::clone(&sink))));
    let categories = client.product_categories().into_result().unwrap();

    assert_eq!(categories[&10], BTreeSet::from([1, 2]));
    assert_eq!(categories[&11], BTreeSet::from([1]));
    assert!(!categories.contains_key(&12));

    let reported: Vec<String> = sink.warnings().into_iter().map(|d| d.key).collect();
    assert_eq!(reported.len(), 3);
    assert!(reported.contains(&"2".to_string()));
    assert!(reported.contains(&"3".to_string()));
    assert!(reported.contains(&"x".to_string()));

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].page, None);
}

#[test]
fn test_product_categories_error() {
    let api = FakeApi::default().failing_at(endpoints::PRODUCT_CATEGORIES, 0);
    let (client, _) = client(api);

    let listing = client.product_categories();
    assert!(listing.records.is_empty());
    assert!(listing.error.is_some());
}

// ============================================================================
// Expired User Tests
// ============================================================================

#[test]
fn test_expired_users() {
    let api = FakeApi::default()
        .with_pages(
            endpoints::USERS,
            vec![json!({
                "1": {"user_id": 1, "login": "old"},
                "2": {"user_id": 2, "login": "recent"},
                "3": {"user_id": 3, "login": "active"},
                "4": {"user_id": 4, "login": "nothing"},
                "_total": 4
            })],
        )
        .with_pages(
            endpoints::ACCESS,
            vec![json!({
                "1": {"access_id": 1, "user_id": 1, "expire_date": "2024-01-01"},
                "2": {"access_id": 2, "user_id": 1, "expire_date": "2024-02-01"},
                "3": {"access_id": 3, "user_id": 2, "expire_date": "2024-06-05"},
                "4": {"access_id": 4, "user_id": 3, "expire_date": "2024-02-01"},
                "5": {"access_id": 5, "user_id": 3, "expire_date": "2025-01-01"},
                "_total": 5
            })],
        );
    let (client, _) = client(api);
    let now = parse_timestamp("2024-06-10 12:00:00").unwrap();

    let expired = client.expired_users_at(30, now).into_result().unwrap();

    let mut logins: Vec<&str> = expired.keys().map(String::as_str).collect();
    logins.sort_unstable();
    assert_eq!(logins, vec!["nothing", "old"]);
    assert_eq!(
        expired["old"].expired_at.map(|t| t.to_string()),
        Some("2024-02-01 00:00:00".to_string())
    );
    assert!(expired["nothing"].expired_at.is_none());
}

#[test]
fn test_expired_users_carries_error() {
    let api = FakeApi::default()
        .with_pages(
            endpoints::USERS,
            vec![json!({"1": {"user_id": 1, "login": "old"}, "_total": 1})],
        )
        .failing_at(endpoints::ACCESS, 0);
    let (client, _) = client(api);
    let now = parse_timestamp("2024-06-10 12:00:00").unwrap();

    let listing = client.expired_users_at(30, now);
    assert_eq!(listing.records.len(), 1);
    assert!(listing.error.unwrap().is_api());
}

// ============================================================================
// Database Tests
// ============================================================================

#[test]
fn test_reports_need_database() {
    let (client, _) = client(FakeApi::default());
    let err = client
        .payments_by_date(day(2024, 3, 1), "Native", "")
        .unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
}

#[test]
fn test_reports_use_attached_database() {
    let engine = DatabaseEngine::in_memory().unwrap();
    engine
        .execute_batch(
            "CREATE TABLE am_user (user_id INTEGER, login VARCHAR);
             CREATE TABLE am_invoice_item (invoice_id INTEGER, item_title VARCHAR, item_description VARCHAR);
             CREATE TABLE am_invoice_payment (invoice_id INTEGER, user_id INTEGER, dattm TIMESTAMP,
                 amount DOUBLE, refund_dattm TIMESTAMP, refund_amount DOUBLE);
             INSERT INTO am_user VALUES (1, 'alice');
             INSERT INTO am_invoice_item VALUES (100, 'Native plan', 'Monthly');
             INSERT INTO am_invoice_payment VALUES (100, 1, '2024-03-01 09:00:00', 10.0, NULL, NULL);",
        )
        .unwrap();
    let (client, _) = client(FakeApi::default());
    let client = client.with_database(engine);

    let payments = client
        .payments_by_date(day(2024, 3, 1), "Native", "")
        .unwrap();
    assert_eq!(payments["alice"].amount, Some(10.0));
    assert!(client.refunds_by_date(day(2024, 3, 1), "Native").unwrap().is_empty());
}
