use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use ledger_service::{
    db::{self, MemoryStore},
    routes,
    services::{AccountDefaults, AccountService, TransactionProcessor},
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot`
use uuid::Uuid;

fn app() -> Router {
    let (accounts, transactions) = db::shared(MemoryStore::new());
    let processor = Arc::new(TransactionProcessor::new(accounts.clone(), transactions));
    let service = Arc::new(AccountService::new(accounts, AccountDefaults::default()));
    routes::router(processor, service)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, value)
}

async fn open_account(app: &Router, balance: &str, daily_limit: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/v1/accounts",
        Some(json!({ "balance": balance, "daily_limit": daily_limit })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_string()
}

async fn post_transaction(app: &Router, account_id: &str, kind: &str, amount: Value) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/v1/transactions",
        Some(json!({ "account_id": account_id, "kind": kind, "amount": amount })),
    )
    .await
}

async fn balance(app: &Router, account_id: &str) -> String {
    let (status, body) = send(app, "GET", &format!("/v1/accounts/{account_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    body["balance"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let (status, body) = send(&app, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ok"));
}

#[tokio::test]
async fn test_deposit_is_approved() {
    let app = app();
    let account = open_account(&app, "500.00", "1000.00").await;

    let (status, body) = post_transaction(&app, &account, "DEPOSIT", json!("100.00")).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["state"], "APPROVED");
    assert_eq!(body["kind"], "DEPOSIT");
    assert_eq!(body["amount"], "100.00");
    assert_eq!(balance(&app, &account).await, "600.00");
}

#[tokio::test]
async fn test_withdrawal_is_approved() {
    let app = app();
    let account = open_account(&app, "500.00", "1000.00").await;

    let (status, body) = post_transaction(&app, &account, "withdrawal", json!(200)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["amount"], "-200");
    assert_eq!(balance(&app, &account).await, "300.00");
}

#[tokio::test]
async fn test_number_amount_keeps_every_digit() {
    let app = app();
    let account = open_account(&app, "500.00", "1000.00").await;
    let body: Value = serde_json::from_str(&format!(
        r#"{{"account_id": "{account}", "kind": "DEPOSIT", "amount": 0.1234567890123456789}}"#
    ))
    .unwrap();

    let (status, body) = send(&app, "POST", "/v1/transactions", Some(body)).await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["amount"], "0.1234567890123456789");
    assert_eq!(balance(&app, &account).await, "500.1234567890123456789");
}

#[tokio::test]
async fn test_deposit_past_representable_balance() {
    let app = app();
    let max = Decimal::MAX.to_string();
    let account = open_account(&app, &max, &max).await;

    let (status, body) = post_transaction(&app, &account, "DEPOSIT", json!("1")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_amount");
    assert_eq!(balance(&app, &account).await, max);
}

#[tokio::test]
async fn test_limit_exceeded() {
    let app = app();
    let account = open_account(&app, "500.00", "1000.00").await;

    let (status, body) = post_transaction(&app, &account, "DEPOSIT", json!("1500.00")).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "limit_exceeded");
    assert_eq!(balance(&app, &account).await, "500.00");
}

#[tokio::test]
async fn test_insufficient_funds() {
    let app = app();
    let account = open_account(&app, "500.00", "1000.00").await;

    let (status, body) = post_transaction(&app, &account, "WITHDRAWAL", json!("600.00")).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "insufficient_funds");

    let (_, listed) = send(&app, "GET", &format!("/v1/transactions/{account}"), None).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn test_invalid_amount() {
    let app = app();
    let account = open_account(&app, "500.00", "1000.00").await;

    let (status, body) = post_transaction(&app, &account, "DEPOSIT", json!("cien")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_amount");
}

#[tokio::test]
async fn test_unknown_account() {
    let app = app();
    let missing = Uuid::new_v4().to_string();

    let (status, body) = post_transaction(&app, &missing, "DEPOSIT", json!("10")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "account_not_found");

    let (status, _) = send(&app, "GET", &format!("/v1/transactions/{missing}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "GET", &format!("/v1/reports/{missing}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "GET", &format!("/v1/accounts/{missing}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_path_identifier() {
    let app = app();
    let (status, body) = send(&app, "GET", "/v1/reports/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_identifier");
}

#[tokio::test]
async fn test_report() {
    let app = app();
    let account = open_account(&app, "500.00", "1000.00").await;
    post_transaction(&app, &account, "DEPOSIT", json!("100.00")).await;
    post_transaction(&app, &account, "WITHDRAWAL", json!("40.00")).await;
    // refused, so not counted
    post_transaction(&app, &account, "WITHDRAWAL", json!("5000.00")).await;

    let (status, body) = send(&app, "GET", &format!("/v1/reports/{account}"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_deposits"], "100.00");
    assert_eq!(body["total_withdrawals"], "40.00");
    let average: Decimal = body["average_balance"].as_str().unwrap().parse().unwrap();
    assert_eq!(average, dec!(30));
    assert_eq!(body["deposit_count"], 1);
    assert_eq!(body["withdrawal_count"], 1);
    assert_eq!(body["transactions"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_get_single_transaction() {
    let app = app();
    let account = open_account(&app, "0", "100").await;
    let id = Uuid::new_v4().to_string();

    let (status, _) = send(
        &app,
        "POST",
        "/v1/transactions",
        Some(json!({ "account_id": account, "kind": "DEPOSIT", "amount": "5", "id": id, "state": "PENDING" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, "GET", &format!("/v1/transactions/{account}/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);

    let (status, body) = send(
        &app,
        "POST",
        "/v1/transactions",
        Some(json!({ "account_id": account, "kind": "DEPOSIT", "amount": "5", "id": id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "duplicate_transaction");

    let other = Uuid::new_v4();
    let (status, body) = send(&app, "GET", &format!("/v1/transactions/{account}/{other}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "transaction_not_found");
}

#[tokio::test]
async fn test_submitted_state_must_be_pending() {
    let app = app();
    let account = open_account(&app, "0", "100").await;

    let (status, body) = send(
        &app,
        "POST",
        "/v1/transactions",
        Some(json!({ "account_id": account, "kind": "DEPOSIT", "amount": "5", "state": "APPROVED" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_state");
}

#[tokio::test]
async fn test_accounts_by_owner() {
    let app = app();
    let owner = Uuid::new_v4().to_string();
    let (status, created) = send(&app, "POST", "/v1/accounts", Some(json!({ "owner_id": owner }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["balance"], "0.00");
    assert_eq!(created["daily_limit"], "2000.00");

    let (status, body) = send(&app, "GET", &format!("/v1/accounts?owner_id={owner}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([created]));
}

#[tokio::test]
async fn test_negative_opening_balance_is_refused() {
    let app = app();
    let (status, body) = send(&app, "POST", "/v1/accounts", Some(json!({ "balance": "-1" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_amount");
}
