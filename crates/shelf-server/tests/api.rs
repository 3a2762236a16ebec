//! Router-level tests for the library API.
//!
//! Every test builds the full application around an in-memory store seeded
//! with one author, two books and three rates, and a clock fixed at
//! 09-08-2023 14:05:03, then drives it with `oneshot` requests.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::NaiveDate;
use serde_json::{Value, json};
use shelf_core::{FixedClock, RecordId};
use shelf_rules::{Credentials, RuleEngine};
use shelf_server::{AppState, ServerConfig, app};
use shelf_store::{Database, Store, StoreConfig};
use tower::util::ServiceExt; // for `oneshot`

const NOW: &str = "09-08-2023 14:05:03";
const ADMIN: &str = "Basic YWRtaW46YWRtaW4=";

// ============================================================================
// Fixtures
// ============================================================================

fn seed() -> Database {
    Database::from_json(
        r#"{
            "authors": [
                {"id": 1, "name": "Octavia Butler", "inserted": "01-01-2020 09:00:00", "modified": "01-01-2020 09:00:00"}
            ],
            "books": [
                {"id": 1, "author_id": 1, "title": "Kindred", "inserted": "02-01-2020 09:00:00", "modified": "02-01-2020 09:00:00"},
                {"id": 2, "author_id": 1, "title": "Dawn", "inserted": "03-01-2020 09:00:00", "modified": "03-01-2020 09:00:00"}
            ],
            "rates": [
                {"id": 1, "book_id": 1, "rate": 4},
                {"id": 2, "book_id": 1, "rate": 2},
                {"id": 3, "book_id": 2, "rate": 5}
            ]
        }"#,
    )
    .unwrap()
}

fn engine() -> RuleEngine {
    let at = NaiveDate::from_ymd_opt(2023, 8, 9)
        .unwrap()
        .and_hms_opt(14, 5, 3)
        .unwrap();
    RuleEngine::new(Credentials::default(), Arc::new(FixedClock(at)))
}

fn setup() -> (Router, Store) {
    let store = Store::in_memory(seed());
    let state = AppState::with_engine(store.clone(), ServerConfig::default(), engine());
    (app(state), store)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    auth: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn error(message: &str) -> Value {
    json!({ "error": message })
}

// ============================================================================
// PATCH
// ============================================================================

#[tokio::test]
async fn test_patch_is_always_405() {
    let (app, _) = setup();

    for uri in ["/books/1", "/authors", "/rates/3", "/nowhere"] {
        let (status, body) =
            send(&app, Method::PATCH, uri, Some(json!({"title": "x"})), Some(ADMIN)).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{uri}");
        assert_eq!(body, error("Method not allowed"));
    }
}

// ============================================================================
// Books
// ============================================================================

#[tokio::test]
async fn test_post_book_stamps_and_stores() {
    let (app, store) = setup();

    let (status, body) = send(
        &app,
        Method::POST,
        "/books",
        Some(json!({"author_id": 1, "title": "Parable of the Sower"})),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], json!(3));
    assert_eq!(body["inserted"], json!(NOW));
    assert_eq!(body["modified"], json!(NOW));

    let stored = store.get("books", RecordId(3)).await.unwrap();
    assert_eq!(stored["inserted"], stored["modified"]);
    assert_eq!(stored["title"], json!("Parable of the Sower"));
    assert!(!stored.contains_key("average_rate"));
}

#[tokio::test]
async fn test_post_book_rejections() {
    let (app, store) = setup();

    let cases = [
        (json!({}), StatusCode::UNPROCESSABLE_ENTITY, "Missing required field - author_id"),
        (json!({"author_id": 1}), StatusCode::UNPROCESSABLE_ENTITY, "Missing required field - title"),
        (json!({"author_id": 7, "title": "Fledgling"}), StatusCode::FORBIDDEN, "Invalid author_id"),
    ];
    for (body, expected_status, message) in cases {
        let (status, response) = send(&app, Method::POST, "/books", Some(body), None).await;
        assert_eq!(status, expected_status);
        assert_eq!(response, error(message));
    }

    assert_eq!(store.list("books").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_post_with_empty_body_reports_first_missing_field() {
    let (app, _) = setup();
    let (status, body) = send(&app, Method::POST, "/books", None, None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, error("Missing required field - author_id"));
}

#[tokio::test]
async fn test_post_malformed_json_is_400() {
    let (app, _) = setup();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/authors")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_put_book_refreshes_modified_only() {
    let (app, store) = setup();

    let (status, body) = send(
        &app,
        Method::PUT,
        "/books/2",
        Some(json!({"author_id": 1, "title": "Dawn (Xenogenesis 1)"})),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], json!(2));
    assert_eq!(body["modified"], json!(NOW));
    assert_eq!(body["inserted"], json!("03-01-2020 09:00:00"));

    let stored = store.get("books", RecordId(2)).await.unwrap();
    assert_eq!(stored["title"], json!("Dawn (Xenogenesis 1)"));
}

#[tokio::test]
async fn test_put_with_id_is_always_403() {
    let (app, store) = setup();

    let bodies = [
        ("/books/1", json!({"id": 1, "author_id": 1, "title": "Kindred"})),
        ("/books/1", json!({"id": 9})),
        ("/authors/1", json!({"id": 1, "name": "O. E. Butler"})),
        ("/rates/1", json!({"id": 1, "book_id": 1, "rate": 3})),
    ];
    for (uri, body) in bodies {
        let (status, response) = send(&app, Method::PUT, uri, Some(body), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
        assert_eq!(response, error("Updating the id of the resource is forbidden"));
    }

    let kindred = store.get("books", RecordId(1)).await.unwrap();
    assert_eq!(kindred["modified"], json!("02-01-2020 09:00:00"));
}

#[tokio::test]
async fn test_put_missing_record_is_404() {
    let (app, _) = setup();
    let (status, body) = send(
        &app,
        Method::PUT,
        "/books/40",
        Some(json!({"author_id": 1, "title": "Unwritten"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, error("Resource not found"));
}

// ============================================================================
// Authors
// ============================================================================

#[tokio::test]
async fn test_post_and_put_author() {
    let (app, _) = setup();

    let (status, body) = send(&app, Method::POST, "/authors", Some(json!({"title": "x"})), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, error("Missing required field - name"));

    let (status, body) = send(&app, Method::POST, "/authors", Some(json!({"name": "N. K. Jemisin"})), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["inserted"], json!(NOW));
    assert_eq!(body["modified"], json!(NOW));

    let (status, body) = send(&app, Method::PUT, "/authors/1", Some(json!({"name": "Octavia E. Butler"})), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["inserted"], json!("01-01-2020 09:00:00"));
    assert_eq!(body["modified"], json!(NOW));
}

#[tokio::test]
async fn test_largest_client_id_does_not_break_later_posts() {
    let (app, store) = setup();

    let (status, body) = send(
        &app,
        Method::POST,
        "/authors",
        Some(json!({"id": i64::MAX, "name": "Last"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], json!(i64::MAX));

    let (status, body) = send(&app, Method::POST, "/authors", Some(json!({"name": "Next"})), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, error("no free id left in authors"));

    let (status, _) = send(&app, Method::POST, "/authors", Some(json!({"id": 5, "name": "Five"})), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(store.list("authors").await.unwrap().len(), 3);
}

// ============================================================================
// Rates
// ============================================================================

#[tokio::test]
async fn test_post_rate_range() {
    let (app, store) = setup();

    let (status, body) = send(&app, Method::POST, "/rates", Some(json!({"book_id": 1, "rate": 7})), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, error("Invalid rate. Value must be between 0 and 5"));

    let (status, body) = send(&app, Method::POST, "/rates", Some(json!({"book_id": 1, "rate": 3})), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["rate"], json!(3));
    assert!(!body.as_object().unwrap().contains_key("inserted"));

    assert_eq!(store.list("rates").await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_post_rate_rejections() {
    let (app, _) = setup();

    let cases = [
        (json!({"rate": 2}), StatusCode::UNPROCESSABLE_ENTITY, "Missing required field - book_id"),
        (json!({"book_id": 1}), StatusCode::UNPROCESSABLE_ENTITY, "Missing required field - rate"),
        (json!({"book_id": 9, "rate": 2}), StatusCode::FORBIDDEN, "Invalid book_id"),
    ];
    for (body, expected_status, message) in cases {
        let (status, response) = send(&app, Method::POST, "/rates", Some(body), None).await;
        assert_eq!(status, expected_status);
        assert_eq!(response, error(message));
    }
}

#[tokio::test]
async fn test_put_rate() {
    let (app, _) = setup();

    let (status, body) = send(&app, Method::PUT, "/rates/1", Some(json!({"book_id": 1, "rate": 5.5})), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, error("Invalid rate. Value must be between 0 and 5"));

    let (status, body) = send(&app, Method::PUT, "/rates/1", Some(json!({"book_id": 2, "rate": 0})), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": 1, "book_id": 2, "rate": 0}));
}

// ============================================================================
// DELETE
// ============================================================================

#[tokio::test]
async fn test_delete_without_credential_is_401_even_for_missing_ids() {
    let (app, store) = setup();

    for uri in ["/books/1", "/books/99", "/authors/1", "/rates/1"] {
        let (status, body) = send(&app, Method::DELETE, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body, error("Unauthorized"));
    }

    let (status, _) = send(&app, Method::DELETE, "/books/1", None, Some("Basic d3Jvbmc6d3Jvbmc=")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(store.list("books").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_delete_with_credential() {
    let (app, store) = setup();

    let (status, body) = send(&app, Method::DELETE, "/books/99", None, Some(ADMIN)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, error("Resource not found"));

    let (status, body) = send(&app, Method::DELETE, "/rates/3", None, Some(ADMIN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
    assert!(store.get("rates", RecordId(3)).await.is_err());

    let (status, body) = send(&app, Method::DELETE, "/books/abc", None, Some(ADMIN)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, error("Invalid id - abc"));
}

#[tokio::test]
async fn test_delete_referenced_author_is_forwarded() {
    let (app, store) = setup();

    let (status, _) = send(&app, Method::DELETE, "/authors/1", None, Some(ADMIN)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(store.list("authors").await.unwrap().is_empty());
    assert_eq!(store.list("books").await.unwrap().len(), 2);
}

// ============================================================================
// Reads
// ============================================================================

#[tokio::test]
async fn test_get_books_enriched_with_average_rate() {
    let (app, _) = setup();

    let (status, body) = send(&app, Method::GET, "/books", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let books = body.as_array().unwrap();
    assert_eq!(books.len(), 2);
    assert_eq!(books[0]["title"], json!("Kindred"));
    assert_eq!(books[0]["average_rate"].as_f64(), Some(3.0));
    assert_eq!(books[1]["average_rate"].as_f64(), Some(5.0));
}

#[tokio::test]
async fn test_get_book_is_single_enriched_object() {
    let (app, _) = setup();

    let (status, body) = send(&app, Method::GET, "/books/1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_object());
    assert_eq!(body["average_rate"].as_f64(), Some(3.0));
}

#[tokio::test]
async fn test_average_follows_rate_changes() {
    let (app, _) = setup();

    let (status, _) = send(&app, Method::POST, "/rates", Some(json!({"book_id": 2, "rate": 0})), None).await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, body) = send(&app, Method::GET, "/books/2", None, None).await;
    assert_eq!(body["average_rate"].as_f64(), Some(2.5));

    send(&app, Method::DELETE, "/rates/3", None, Some(ADMIN)).await;
    send(&app, Method::DELETE, "/rates/4", None, Some(ADMIN)).await;
    let (_, body) = send(&app, Method::GET, "/books/2", None, None).await;
    assert_eq!(body["average_rate"].as_f64(), Some(0.0));
}

#[tokio::test]
async fn test_other_reads_are_not_enriched() {
    let (app, _) = setup();

    let (_, authors) = send(&app, Method::GET, "/authors", None, None).await;
    assert!(authors[0].get("average_rate").is_none());

    let (_, rate) = send(&app, Method::GET, "/rates/1", None, None).await;
    assert_eq!(rate, json!({"id": 1, "book_id": 1, "rate": 4}));
}

#[tokio::test]
async fn test_missing_book_is_404_without_enrichment() {
    let (app, _) = setup();
    let (status, body) = send(&app, Method::GET, "/books/77", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, error("Resource not found"));
}

// ============================================================================
// Pass-through, extras and plumbing
// ============================================================================

#[tokio::test]
async fn test_unmanaged_paths_reach_the_store() {
    let (app, _) = setup();

    let (status, body) = send(&app, Method::POST, "/booksAux", Some(json!({})), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, error("Resource not found"));

    let (status, _) = send(&app, Method::GET, "/books/1/rates", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_db_dumps_collections() {
    let (app, _) = setup();
    let (status, body) = send(&app, Method::GET, "/db", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["books"].as_array().unwrap().len(), 2);
    assert_eq!(body["rates"].as_array().unwrap().len(), 3);
    assert!(body["books"][0].get("average_rate").is_none());
}

#[tokio::test]
async fn test_health() {
    let (app, _) = setup();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"status": "ok", "collections": {"authors": 1, "books": 2, "rates": 3}})
    );
}

#[tokio::test]
async fn test_oversized_body_is_413() {
    let config = ServerConfig {
        max_body_bytes: 32,
        ..ServerConfig::default()
    };
    let store = Store::in_memory(seed());
    let app = app(AppState::with_engine(store.clone(), config, engine()));

    let name = "x".repeat(100);
    let (status, body) = send(&app, Method::POST, "/authors", Some(json!({"name": name})), None).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body, error("Request body too large"));

    let (status, body) = send(&app, Method::PUT, "/books/1", Some(json!({"author_id": 1, "title": name})), None).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body, error("Request body too large"));

    // Stamped, the forwarded body outgrows the limit and is still stored.
    let (status, body) = send(&app, Method::POST, "/authors", Some(json!({"name": "Ann"})), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["inserted"], json!(NOW));
    assert_eq!(store.list("authors").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let (app, _) = setup();

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "abc-123")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "abc-123");
}

#[tokio::test]
async fn test_file_backed_store_persists_accepted_writes() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig {
        db_path: dir.path().join("db.json"),
        create_if_missing: true,
    };
    let store = Store::open(config.clone()).await.unwrap();
    let app = app(AppState::with_engine(store, ServerConfig::default(), engine()));

    let (status, _) = send(&app, Method::POST, "/authors", Some(json!({"name": "Kelly Link"})), None).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&app, Method::POST, "/books", Some(json!({"author_id": 1})), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let reopened = Store::open(config).await.unwrap();
    assert_eq!(reopened.list("authors").await.unwrap().len(), 1);
    assert!(reopened.list("books").await.unwrap().is_empty());
}
