//! Identity header handling for both endpoints.

mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

const MATCH_PATH: &str = "/api/reconciliation/match";
const CONFIRM_PATH: &str = "/api/reconciliation/confirm";

#[tokio::test]
async fn missing_user_header_is_unauthorized() {
    let router = test_router(Arc::new(InMemoryLedger::default()));
    let tenant_id = Uuid::new_v4().to_string();

    let body = json!({ "transactions": [{ "date": "2024-01-01", "amount": 10.00 }] });
    let (status, response) = post_json(&router, MATCH_PATH, Some(&tenant_id), None, &body).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(response["error"].as_str().unwrap().contains("X-User-ID"));
}

#[tokio::test]
async fn missing_tenant_header_is_a_bad_request() {
    let router = test_router(Arc::new(InMemoryLedger::default()));

    let body = json!({ "transactions": [{ "date": "2024-01-01", "amount": 10.00 }] });
    let (status, response) = post_json(&router, MATCH_PATH, None, Some(TEST_USER), &body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response["error"].as_str().unwrap().contains("X-Tenant-ID"));
}

#[tokio::test]
async fn malformed_tenant_header_is_a_bad_request() {
    let router = test_router(Arc::new(InMemoryLedger::default()));

    let body = json!({ "transactions": [{ "date": "2024-01-01", "amount": 10.00 }] });
    let (status, response) =
        post_json(&router, MATCH_PATH, Some("acme-corp"), Some(TEST_USER), &body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response["error"].as_str().unwrap().contains("UUID"));
}

#[tokio::test]
async fn identity_is_checked_before_the_body_is_read() {
    let router = test_router(Arc::new(InMemoryLedger::default()));

    // Body is invalid too; the missing user header must win.
    let body = json!({ "bogus": true });
    let (status, _) = post_json(&router, MATCH_PATH, None, None, &body).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn confirm_requires_identity_headers_too() {
    let router = test_router(Arc::new(InMemoryLedger::default()));

    let body = json!({ "journalEntryId": Uuid::new_v4().to_string() });
    let (status, _) = post_json(&router, CONFIRM_PATH, None, None, &body).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = post_json(&router, CONFIRM_PATH, None, Some(TEST_USER), &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
