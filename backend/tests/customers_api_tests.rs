//! End-to-end tests for the customer HTTP API, driven in-process.

#![cfg(feature = "http-server")]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use customerdb::db::repositories::LocalRepository;
use customerdb::db::repository::{CustomerRepository, ErrorContext, RepositoryError, RepositoryResult};
use customerdb::http::router::MAX_BODY_BYTES;
use customerdb::http::{create_router, AppState};
use customerdb::models::{Customer, CustomerId, UniqueField};

fn app() -> (Router, LocalRepository) {
    let repo = LocalRepository::new();
    let router = create_router(AppState::new(Arc::new(repo.clone())));
    (router, repo)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn test_customer() -> Value {
    json!({
        "username": "test",
        "email": "test@gmail.com",
        "password": "testpassword",
        "firstName": "First Name",
        "lastName": "Last Name"
    })
}

#[tokio::test]
async fn test_example_scenario() {
    let (app, _) = app();

    let (status, body) = send_json(&app, Method::POST, "/customers", Some(test_customer())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 1);
    assert_eq!(body["username"], "test");
    assert!(body.get("password").is_none());

    let (status, body) = send_json(&app, Method::POST, "/customers", Some(test_customer())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "EMAIL_CONFLICT");

    let (status, body) = send_json(&app, Method::GET, "/customers/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "test@gmail.com");

    let (status, bytes) = send(&app, Method::GET, "/customers/3", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(bytes.is_empty());

    let mut update = test_customer();
    update["id"] = json!(1);
    update["lastName"] = json!("No last name");
    let (status, body) = send_json(&app, Method::PUT, "/customers", Some(update)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lastName"], "No last name");

    let (_, body) = send_json(&app, Method::GET, "/customers/1", None).await;
    assert_eq!(body["lastName"], "No last name");
}

#[tokio::test]
async fn test_register_ignores_client_id_and_hides_password() {
    let (app, repo) = app();
    let mut payload = test_customer();
    payload["id"] = json!(99);

    let (status, body) = send_json(&app, Method::POST, "/customers", Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 1);
    assert!(body.get("password").is_none());
    assert!(body.get("passwordDigest").is_none());

    let stored = repo.find_by_username("test").await.unwrap().unwrap();
    assert!(stored.matches_password("testpassword"));
}

#[tokio::test]
async fn test_register_duplicate_username_is_conflict() {
    let (app, repo) = app();
    send_json(&app, Method::POST, "/customers", Some(test_customer())).await;

    let mut other = test_customer();
    other["email"] = json!("other@gmail.com");
    let (status, body) = send_json(&app, Method::POST, "/customers", Some(other)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "USERNAME_CONFLICT");
    assert_eq!(repo.customer_count(), 1);
}

#[tokio::test]
async fn test_register_rejects_missing_or_empty_identity_fields() {
    let (app, repo) = app();
    let cases = [
        ("email", Value::Null, "Email should not be null"),
        ("email", json!(""), "Email should not be empty"),
        ("email", json!("not-an-email"), "Email should be a valid email address"),
        ("username", Value::Null, "Username should not be null"),
        ("username", json!(""), "Username should not be empty"),
    ];

    for (field, value, message) in cases {
        let mut payload = test_customer();
        payload[field] = value;
        let (status, body) = send_json(&app, Method::POST, "/customers", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{field}");
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["message"], message);
        assert_eq!(body["errors"][0]["field"], field);
    }
    assert_eq!(repo.customer_count(), 0);
}

#[tokio::test]
async fn test_register_without_password_is_accepted() {
    let (app, _) = app();
    let (status, _) = send_json(
        &app,
        Method::POST,
        "/customers",
        Some(json!({"email": "a@b.com", "username": "a"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let (app, _) = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/customers")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_body_without_json_content_type_is_unsupported_media_type() {
    let (app, repo) = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/customers")
        .body(Body::from(test_customer().to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "UNSUPPORTED_MEDIA_TYPE");
    assert_eq!(repo.customer_count(), 0);
}

#[tokio::test]
async fn test_oversized_body_is_payload_too_large() {
    let (app, repo) = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/customers")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(vec![b' '; 2 * MAX_BODY_BYTES]))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
    assert_eq!(repo.customer_count(), 0);
}

#[tokio::test]
async fn test_list_returns_registered_customers_in_order() {
    let (app, _) = app();
    let (_, body) = send_json(&app, Method::GET, "/customers", None).await;
    assert_eq!(body, json!([]));

    for (email, username) in [("a@x.com", "a"), ("b@x.com", "b")] {
        send_json(
            &app,
            Method::POST,
            "/customers",
            Some(json!({"email": email, "username": username, "password": "secret"})),
        )
        .await;
    }

    let (status, body) = send_json(&app, Method::GET, "/customers", None).await;
    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["username"], "a");
    assert_eq!(list[1]["username"], "b");
    assert!(list.iter().all(|c| c.get("password").is_none()));
}

#[tokio::test]
async fn test_get_by_email() {
    let (app, _) = app();
    send_json(&app, Method::POST, "/customers", Some(test_customer())).await;

    let (status, body) = send_json(&app, Method::GET, "/customers/email/test@gmail.com", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 1);

    let (status, bytes) = send(&app, Method::GET, "/customers/email/nobody@gmail.com", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(bytes.is_empty());

    let (status, _) = send(&app, Method::GET, "/customers/email/", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_non_integer_id_is_bad_request() {
    let (app, _) = app();
    let (status, body) = send_json(&app, Method::GET, "/customers/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_update_unknown_id_is_not_found() {
    let (app, _) = app();
    let mut payload = test_customer();
    payload["id"] = json!(42);

    let (status, bytes) = send(&app, Method::PUT, "/customers", Some(payload)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn test_update_without_id_is_bad_request() {
    let (app, _) = app();
    send_json(&app, Method::POST, "/customers", Some(test_customer())).await;

    let (status, body) = send_json(&app, Method::PUT, "/customers", Some(test_customer())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_update_validates_payload() {
    let (app, _) = app();
    send_json(&app, Method::POST, "/customers", Some(test_customer())).await;

    let mut payload = test_customer();
    payload["id"] = json!(1);
    payload["email"] = json!("");
    let (status, body) = send_json(&app, Method::PUT, "/customers", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_update_collision_with_other_customer_is_conflict() {
    let (app, _) = app();
    send_json(&app, Method::POST, "/customers", Some(test_customer())).await;
    send_json(
        &app,
        Method::POST,
        "/customers",
        Some(json!({"email": "b@x.com", "username": "bob"})),
    )
    .await;

    let (status, body) = send_json(
        &app,
        Method::PUT,
        "/customers",
        Some(json!({"id": 2, "email": "test@gmail.com", "username": "bob"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "EMAIL_CONFLICT");

    let (_, bob) = send_json(&app, Method::GET, "/customers/2", None).await;
    assert_eq!(bob["email"], "b@x.com");
}

#[tokio::test]
async fn test_update_can_change_email_and_keeps_password() {
    let (app, repo) = app();
    send_json(&app, Method::POST, "/customers", Some(test_customer())).await;

    let (status, body) = send_json(
        &app,
        Method::PUT,
        "/customers",
        Some(json!({"id": 1, "email": "new@gmail.com", "username": "test"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "new@gmail.com");
    assert_eq!(body["firstName"], Value::Null);

    let stored = repo.find_by_email("new@gmail.com").await.unwrap().unwrap();
    assert!(stored.matches_password("testpassword"));

    let (status, _) = send(&app, Method::GET, "/customers/email/test@gmail.com", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_reports_database_status() {
    let (app, repo) = app();
    let (status, body) = send_json(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");

    repo.set_healthy(false);
    let (_, body) = send_json(&app, Method::GET, "/health", None).await;
    assert_eq!(body["database"], "disconnected");
}

#[tokio::test]
async fn test_storage_failure_is_internal_error() {
    let (app, repo) = app();
    repo.set_healthy(false);

    let (status, body) = send_json(&app, Method::GET, "/customers", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "REPOSITORY_ERROR");
}

/// Store that sees no existing customers but refuses every write, as when a
/// concurrent registration commits between the pre-check and the insert.
struct LosingRaceRepository {
    field: UniqueField,
}

#[async_trait::async_trait]
impl CustomerRepository for LosingRaceRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }

    async fn save(&self, _customer: &Customer) -> RepositoryResult<Customer> {
        Err(RepositoryError::conflict(self.field, ErrorContext::new("save")))
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Customer>> {
        Ok(Vec::new())
    }

    async fn find_by_id(&self, _id: CustomerId) -> RepositoryResult<Option<Customer>> {
        Ok(None)
    }

    async fn find_by_email(&self, _email: &str) -> RepositoryResult<Option<Customer>> {
        Ok(None)
    }

    async fn find_by_username(&self, _username: &str) -> RepositoryResult<Option<Customer>> {
        Ok(None)
    }
}

#[tokio::test]
async fn test_conflict_raised_by_store_on_write_is_conflict() {
    let repo = LosingRaceRepository {
        field: UniqueField::Username,
    };
    let app = create_router(AppState::new(Arc::new(repo)));

    let (status, body) = send_json(&app, Method::POST, "/customers", Some(test_customer())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "USERNAME_CONFLICT");
}
