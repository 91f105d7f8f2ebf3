//! Tests for pagination module

use super::*;
use crate::decode::{DiagnosticKind, MemorySink};
use crate::error::{Error, Result};
use crate::models::{Access, User};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Serves scripted responses and records every request
struct ScriptedSource {
    responses: Mutex<VecDeque<Result<Value>>>,
    requests: Mutex<Vec<PageRequest>>,
}

impl ScriptedSource {
    fn new(responses: Vec<Result<Value>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl PageSource for ScriptedSource {
    fn fetch(&self, request: &PageRequest) -> Result<Envelope> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Other("no more scripted pages".to_string())));
        next.and_then(Envelope::from_value)
    }
}

/// Page of `rows` users starting at `first`, plus `_total`
fn user_page(first: usize, rows: usize) -> Value {
    let mut page = serde_json::Map::new();
    for i in first..first + rows {
        page.insert(
            i.to_string(),
            json!({"user_id": i, "login": format!("user{i}")}),
        );
    }
    page.insert("_total".to_string(), json!(rows));
    Value::Object(page)
}

// ============================================================================
// Params and Request Tests
// ============================================================================

#[test]
fn test_query_pairs_wire_order() {
    let params = Params::new()
        .with_filter("login", "alice")
        .with_nested("access")
        .with_nested("invoice-payments");
    let request = PageRequest::page("users", params, 2, 50);

    assert_eq!(
        request.query_pairs(),
        vec![
            ("_filter[login]".to_string(), "alice".to_string()),
            ("_nested[]".to_string(), "access".to_string()),
            ("_nested[]".to_string(), "invoice-payments".to_string()),
            ("_page".to_string(), "2".to_string()),
            ("_count".to_string(), "50".to_string()),
        ]
    );
}

#[test]
fn test_single_request_has_no_page_params() {
    let request = PageRequest::single("product-product-category", Params::new());
    assert!(request.query_pairs().is_empty());
}

#[test]
fn test_push_nested_is_idempotent() {
    let mut params = Params::new().with_nested("access");
    params.push_nested("access");
    assert_eq!(params.nested, vec!["access".to_string()]);
}

// ============================================================================
// Envelope Tests
// ============================================================================

#[test]
fn test_envelope_skips_total() {
    let envelope = Envelope::from_value(user_page(0, 2)).unwrap();

    assert_eq!(envelope.len(), 3);
    assert_eq!(envelope.total(), Some(2));
    let keys: Vec<&str> = envelope.rows().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["0", "1"]);
}

#[test]
fn test_envelope_api_error() {
    let err = Envelope::from_value(json!({"error": true, "message": "Invalid API key"}))
        .unwrap_err();
    assert!(err.is_api());
    assert_eq!(err.to_string(), "API error: Invalid API key");
}

#[test]
fn test_envelope_error_false_is_data() {
    let envelope = Envelope::from_value(json!({"error": false, "_total": 0})).unwrap();
    assert_eq!(envelope.len(), 2);
}

#[test]
fn test_envelope_rejects_non_object() {
    let err = Envelope::from_value(json!([1, 2])).unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
    assert!(err.to_string().contains("array"));
}

// ============================================================================
// Termination Tests
// ============================================================================

#[test]
fn test_two_fetches_when_second_page_is_short() {
    // Page 0: 3 rows + _total = page_size + 1 entries, so continue
    let source = ScriptedSource::new(vec![Ok(user_page(0, 3)), Ok(user_page(3, 1))]);
    let sink = MemorySink::new();
    let paginator = Paginator::new(&source, &sink).with_page_size(3);

    let listing = paginator.collect_keyed::<User, _>(
        "users",
        &Params::new(),
        |u| u.login.clone(),
        |_| true,
    );

    assert!(listing.is_complete());
    assert_eq!(listing.records.len(), 4);
    let pages: Vec<Option<u32>> = source.requests().iter().map(|r| r.page).collect();
    assert_eq!(pages, vec![Some(0), Some(1)]);
    assert!(source.requests().iter().all(|r| r.count == 3));
}

#[test]
fn test_single_fetch_when_first_page_is_short() {
    let source = ScriptedSource::new(vec![Ok(user_page(0, 2))]);
    let sink = MemorySink::new();
    let paginator = Paginator::new(&source, &sink).with_page_size(3);

    let listing =
        paginator.collect_keyed::<User, _>("users", &Params::new(), |u| u.user_id, |_| true);

    assert!(listing.is_complete());
    assert_eq!(source.requests().len(), 1);
}

#[test]
fn test_missing_total_ends_one_page_early() {
    let mut full_page = user_page(0, 3);
    full_page.as_object_mut().unwrap().remove("_total");
    let source = ScriptedSource::new(vec![Ok(full_page), Ok(user_page(3, 1))]);
    let sink = MemorySink::new();
    let paginator = Paginator::new(&source, &sink).with_page_size(3);

    let listing =
        paginator.collect_keyed::<User, _>("users", &Params::new(), |u| u.user_id, |_| true);

    assert_eq!(listing.records.len(), 3);
    assert_eq!(source.requests().len(), 1);
}

#[test]
fn test_zero_page_size_uses_default() {
    let source = ScriptedSource::new(vec![]);
    let sink = MemorySink::new();
    let paginator = Paginator::new(&source, &sink).with_page_size(0);
    assert_eq!(paginator.page_size(), DEFAULT_PAGE_SIZE);
}

// ============================================================================
// Merge Tests
// ============================================================================

#[test]
fn test_later_page_overwrites_same_key() {
    let page0 = json!({
        "1": {"user_id": 1, "login": "alice", "email": "old@example.com"},
        "2": {"user_id": 2, "login": "bob", "email": "bob@example.com"},
        "_total": 2
    });
    let page1 = json!({
        "3": {"user_id": 1, "login": "alice", "email": "new@example.com"},
        "_total": 1
    });
    let source = ScriptedSource::new(vec![Ok(page0), Ok(page1)]);
    let sink = MemorySink::new();
    let paginator = Paginator::new(&source, &sink).with_page_size(2);

    let listing = paginator.collect_keyed::<User, _>(
        "users",
        &Params::new(),
        |u| u.login.clone(),
        |_| true,
    );

    let users = listing.into_result().unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users["alice"].email, "new@example.com");
    assert_eq!(users["bob"].email, "bob@example.com");
}

#[test]
fn test_grouping_keeps_fetch_order() {
    let page0 = json!({
        "10": {"access_id": 10, "user_id": 1},
        "11": {"access_id": 11, "user_id": 2},
        "_total": 2
    });
    let page1 = json!({
        "12": {"access_id": 12, "user_id": 1},
        "_total": 1
    });
    let source = ScriptedSource::new(vec![Ok(page0), Ok(page1)]);
    let sink = MemorySink::new();
    let paginator = Paginator::new(&source, &sink).with_page_size(2);

    let listing = paginator.collect_grouped::<Access, _>(
        "access",
        &Params::new(),
        |a| a.user_id,
        |_| true,
    );

    let groups = listing.into_result().unwrap();
    let ids: Vec<i64> = groups[&1].iter().map(|a| a.access_id).collect();
    assert_eq!(ids, vec![10, 12]);
    assert_eq!(groups[&2].len(), 1);
}

#[test]
fn test_keep_predicate_filters_rows() {
    let source = ScriptedSource::new(vec![Ok(user_page(0, 4))]);
    let sink = MemorySink::new();
    let paginator = Paginator::new(&source, &sink);

    let listing = paginator.collect_keyed::<User, _>(
        "users",
        &Params::new(),
        |u| u.user_id,
        |u| u.user_id % 2 == 0,
    );

    let mut ids: Vec<i64> = listing.records.into_keys().collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![0, 2]);
}

#[test]
fn test_malformed_row_is_skipped_and_reported() {
    let page = json!({
        "1": {"user_id": 1, "login": "alice"},
        "2": "garbage",
        "_total": 2
    });
    let source = ScriptedSource::new(vec![Ok(page)]);
    let sink = MemorySink::new();
    let paginator = Paginator::new(&source, &sink);

    let listing =
        paginator.collect_keyed::<User, _>("users", &Params::new(), |u| u.user_id, |_| true);

    assert_eq!(listing.records.len(), 1);
    let warnings = sink.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].key, "2");
    assert_eq!(warnings[0].kind, DiagnosticKind::MalformedRow);
}

// ============================================================================
// Partial Result Tests
// ============================================================================

#[test]
fn test_error_returns_accumulated_rows() {
    let source = ScriptedSource::new(vec![
        Ok(user_page(0, 2)),
        Err(Error::http_status(502, "Bad Gateway")),
    ]);
    let sink = MemorySink::new();
    let paginator = Paginator::new(&source, &sink).with_page_size(2);

    let listing =
        paginator.collect_keyed::<User, _>("users", &Params::new(), |u| u.user_id, |_| true);

    assert!(!listing.is_complete());
    let (users, error) = listing.into_parts();
    assert_eq!(users.len(), 2);
    assert!(error.unwrap().is_transport());
    assert_eq!(source.requests().len(), 2);
}

#[test]
fn test_api_error_on_first_page() {
    let source = ScriptedSource::new(vec![Ok(json!({
        "error": true,
        "message": "Access denied"
    }))]);
    let sink = MemorySink::new();
    let paginator = Paginator::new(&source, &sink);

    let listing =
        paginator.collect_keyed::<User, _>("users", &Params::new(), |u| u.user_id, |_| true);

    assert!(listing.records.is_empty());
    assert!(listing.error.as_ref().unwrap().is_api());
}

#[test]
fn test_listing_map_keeps_error() {
    let listing = Listing::partial(vec![1, 2], Error::api("denied"));
    let mapped = listing.map(|v| v.len());
    assert_eq!(mapped.records, 2);
    assert!(mapped.into_result().is_err());
}

#[test]
fn test_fold_rows_sees_raw_rows() {
    let source = ScriptedSource::new(vec![Ok(user_page(0, 2))]);
    let sink = MemorySink::new();
    let paginator = Paginator::new(&source, &sink);

    let listing = paginator.fold_rows("users", &Params::new(), Vec::new(), |acc, key, _| {
        acc.push(key.to_string());
    });

    assert_eq!(listing.records, vec!["0".to_string(), "1".to_string()]);
}
