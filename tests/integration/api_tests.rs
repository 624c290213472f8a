//! API integration tests
//!
//! The router is driven in-process over the in-memory store.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use bibliotech_server::{
    config::{AppConfig, StorageBackend},
    create_router,
    repository::Repository,
    services::Services,
    AppState,
};

fn app() -> Router {
    let mut config = AppConfig::default();
    config.database.backend = StorageBackend::Memory;
    let services = Services::new(Repository::in_memory(), &config.circulation);
    create_router(AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    })
}

/// Send a request and return the status with the parsed JSON body
async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(format!("/api/v1{}", uri));
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Failed to send request");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Failed to parse response")
    };
    (status, body)
}

async fn create_book(app: &Router, copies: i32) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/books",
        Some(json!({
            "title": "El túnel",
            "isbn": "978-84-376-0488-0",
            "publication_year": 1948,
            "language": "Español",
            "total_copies": copies
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["available_copies"], copies);
    body["id"].as_i64().expect("No id in response")
}

async fn available_copies(app: &Router, book_id: i64) -> i64 {
    let (_, body) = send(app, Method::GET, &format!("/books/{}", book_id), None).await;
    body["available_copies"].as_i64().expect("No available_copies in response")
}

#[tokio::test]
async fn test_health_check() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["storage"], "memory");
}

#[tokio::test]
async fn test_create_book_rejects_empty_title() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/books",
        Some(json!({ "title": "", "total_copies": 1 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");
}

#[tokio::test]
async fn test_late_return_creates_fine() {
    let app = app();
    let book_id = create_book(&app, 1).await;

    let (status, loan) = send(
        &app,
        Method::POST,
        "/loans",
        Some(json!({
            "book_id": book_id,
            "member_id": 2,
            "employee_id": 1,
            "due_date": "2024-01-01T00:00:00Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(loan["status"], "active");
    assert_eq!(available_copies(&app, book_id).await, 0);

    let loan_id = loan["id"].as_i64().expect("No loan id");
    let (status, outcome) = send(
        &app,
        Method::POST,
        &format!("/loans/{}/return", loan_id),
        Some(json!({ "return_date": "2024-01-04T00:00:00Z" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["loan"]["status"], "returned");
    assert_eq!(outcome["already_returned"], false);
    assert_eq!(outcome["fine"]["amount"], 6.0);
    assert_eq!(outcome["fine"]["status"], "pending");
    assert_eq!(available_copies(&app, book_id).await, 1);

    // A second return changes nothing
    let (status, again) = send(&app, Method::POST, &format!("/loans/{}/return", loan_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["already_returned"], true);
    assert_eq!(available_copies(&app, book_id).await, 1);

    let (_, fines) = send(&app, Method::GET, &format!("/fines?loan_id={}", loan_id), None).await;
    assert_eq!(fines.as_array().map(Vec::len), Some(1));

    let fine_id = fines[0]["id"].as_i64().expect("No fine id");
    let (status, paid) = send(&app, Method::POST, &format!("/fines/{}/pay", fine_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["status"], "paid");
    assert!(paid["payment_date"].is_string());
}

#[tokio::test]
async fn test_issue_without_copies_is_conflict() {
    let app = app();
    let book_id = create_book(&app, 0).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/loans",
        Some(json!({ "book_id": book_id, "member_id": 2, "employee_id": 1 })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "NoCopiesAvailable");
}

#[tokio::test]
async fn test_reservation_lifecycle() {
    let app = app();
    let book_id = create_book(&app, 1).await;

    let (status, reservation) = send(
        &app,
        Method::POST,
        "/reservations",
        Some(json!({ "book_id": book_id, "member_id": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reservation["status"], "pending");
    let id = reservation["id"].as_i64().expect("No reservation id");

    let (status, confirmed) = send(&app, Method::POST, &format!("/reservations/{}/confirm", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["status"], "confirmed");
    assert_eq!(available_copies(&app, book_id).await, 0);

    let (status, converted) = send(
        &app,
        Method::POST,
        &format!("/reservations/{}/loan", id),
        Some(json!({ "employee_id": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(converted["reservation"]["status"], "completed");
    assert_eq!(converted["loan"]["reservation_id"], id);
    assert_eq!(available_copies(&app, book_id).await, 0);
}

#[tokio::test]
async fn test_confirm_without_copies_is_conflict() {
    let app = app();
    let book_id = create_book(&app, 0).await;

    let (_, reservation) = send(
        &app,
        Method::POST,
        "/reservations",
        Some(json!({ "book_id": book_id, "member_id": 3 })),
    )
    .await;
    let id = reservation["id"].as_i64().expect("No reservation id");

    let (status, body) = send(&app, Method::POST, &format!("/reservations/{}/confirm", id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "NoCopiesAvailable");

    let (_, stored) = send(&app, Method::GET, &format!("/reservations/{}", id), None).await;
    assert_eq!(stored["status"], "pending");
}

#[tokio::test]
async fn test_batch_reservation_shares_group_code() {
    let app = app();
    let first = create_book(&app, 1).await;
    let second = create_book(&app, 2).await;

    let (status, created) = send(
        &app,
        Method::POST,
        "/reservations/batch",
        Some(json!({ "member_id": 4, "book_ids": [first, second] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let code = created[0]["group_code"].as_str().expect("No group code").to_string();
    assert!(code.starts_with("RES-"));
    assert_eq!(created[1]["group_code"], code.as_str());

    let (_, grouped) = send(&app, Method::GET, &format!("/reservations?group_code={}", code), None).await;
    assert_eq!(grouped.as_array().map(Vec::len), Some(2));

    let (status, _) = send(
        &app,
        Method::POST,
        "/reservations/batch",
        Some(json!({ "member_id": 4, "book_ids": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_member_summary() {
    let app = app();
    let book_id = create_book(&app, 2).await;

    send(
        &app,
        Method::POST,
        "/loans",
        Some(json!({ "book_id": book_id, "member_id": 7, "employee_id": 1 })),
    )
    .await;

    let (status, summary) = send(&app, Method::GET, "/members/7/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["active_loans"], 1);
    assert_eq!(summary["pending_fines"], 0);

    let (_, stats) = send(&app, Method::GET, "/stats", None).await;
    assert_eq!(stats["total_copies"], 2);
    assert_eq!(stats["available_copies"], 1);
}

#[tokio::test]
async fn test_unknown_loan_is_not_found() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/loans/42", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NoSuchData");
}
