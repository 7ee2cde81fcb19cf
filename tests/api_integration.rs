//! HTTP-level integration tests for the registry API.
//!
//! Each test drives a fresh router over an in-memory store with
//! `tower::ServiceExt::oneshot`.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use company_registry::api::{AppState, build_router};
use company_registry::config::RegistryConfig;
use company_registry::storage::SqliteCompanyStore;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

const BOUNDARY: &str = "registry-test-boundary";

fn app() -> axum::Router {
    let config = RegistryConfig::default()
        .with_environment("testing")
        .with_database_uri("sqlite://:memory:");
    let store = Arc::new(SqliteCompanyStore::in_memory().unwrap());
    build_router(AppState::new(store, &config), config.server.max_upload_bytes)
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn send_json(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let (status, bytes) = send(app, request).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn multipart(field: &str, filename: &str, content: &str) -> Request<Body> {
    multipart_to("/import/csv", field, filename, content)
}

fn multipart_to(uri: &str, field: &str, filename: &str, content: &str) -> Request<Body> {
    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n\
         {content}\r\n\
         --{BOUNDARY}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn create(app: &axum::Router, body: Value) -> Value {
    let (status, company) = send_json(app, "POST", "/companies", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{company}");
    company
}

#[tokio::test]
async fn test_create_and_fetch() {
    let app = app();
    let company = create(
        &app,
        json!({"name": "Acme", "email": "hq@acme.test", "employees_count": 12}),
    )
    .await;

    assert_eq!(company["name"], "Acme");
    assert_eq!(company["is_active"], true);
    assert!(company["id"].as_str().is_some_and(|id| !id.is_empty()));
    assert_eq!(company["created_at"], company["updated_at"]);

    let id = company["id"].as_str().unwrap();
    let (status, fetched) = send_json(&app, "GET", &format!("/companies/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, company);

    let (status, listed) = send_json(&app, "GET", "/companies", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_reports_every_invalid_field() {
    let app = app();
    let (status, body) = send_json(
        &app,
        "POST",
        "/companies",
        Some(json!({"email": "nope", "employees_count": -1})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation error");
    for field in ["name", "email", "employees_count"] {
        assert!(body["errors"][field].is_array(), "missing {field}: {body}");
    }

    let (_, listed) = send_json(&app, "GET", "/companies", None).await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_json_body() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/companies")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let (status, bytes) = send(&app, request).await;
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .starts_with("Invalid JSON body:")
    );
}

#[tokio::test]
async fn test_unknown_company_is_404() {
    let app = app();
    for method in ["GET", "DELETE"] {
        let (status, body) = send_json(&app, method, "/companies/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"message": "Company not found"}));
    }
    let (status, _) = send_json(
        &app,
        "PUT",
        "/companies/missing",
        Some(json!({"name": "Ghost"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_replace_and_patch() {
    let app = app();
    let company = create(&app, json!({"name": "Acme", "city": "Oslo"})).await;
    let uri = format!("/companies/{}", company["id"].as_str().unwrap());

    let (status, patched) =
        send_json(&app, "PATCH", &uri, Some(json!({"email": "x@acme.test"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["city"], "Oslo");
    assert_eq!(patched["email"], "x@acme.test");

    let (status, replaced) = send_json(&app, "PUT", &uri, Some(json!({"name": "Acme AS"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(replaced["name"], "Acme AS");
    assert_eq!(replaced["city"], Value::Null);
    assert_eq!(replaced["created_at"], company["created_at"]);

    let (status, body) = send_json(&app, "PATCH", &uri, Some(json!({"id": "other"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["id"].is_array());
}

#[tokio::test]
async fn test_hierarchy_routes_and_delete_orphans() {
    let app = app();
    let root = create(&app, json!({"name": "Root"})).await;
    let root_id = root["id"].as_str().unwrap();
    let child = create(&app, json!({"name": "Child", "parent_id": root_id})).await;
    let child_id = child["id"].as_str().unwrap();

    let (status, children) =
        send_json(&app, "GET", &format!("/companies/{root_id}/children"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(children[0]["id"], child["id"]);

    let (_, ancestors) =
        send_json(&app, "GET", &format!("/companies/{child_id}/ancestors"), None).await;
    assert_eq!(ancestors[0]["id"], root["id"]);

    let (status, body) = send_json(
        &app,
        "PATCH",
        &format!("/companies/{root_id}"),
        Some(json!({"parent_id": child_id})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["parent_id"].is_array());

    let (status, body) = send_json(&app, "DELETE", &format!("/companies/{root_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (_, orphan) = send_json(&app, "GET", &format!("/companies/{child_id}"), None).await;
    assert_eq!(orphan["parent_id"], Value::Null);
}

#[tokio::test]
async fn test_duplicate_name_rejected() {
    let app = app();
    create(&app, json!({"name": "Acme"})).await;
    let (status, body) = send_json(&app, "POST", "/companies", Some(json!({"name": "Acme"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["name"].is_array());
}

#[tokio::test]
async fn test_import_csv_statuses() {
    let app = app();

    let (status, bytes) = send(&app, multipart("file", "ok.csv", "name\nAlpha\nBeta\n")).await;
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["succeeded"], 2);
    assert_eq!(body["message"], "2 records imported successfully.");

    let (status, bytes) = send(
        &app,
        multipart("file", "mixed.csv", "name,email\nGamma,g@g.test\n,x@y.test\n"),
    )
    .await;
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(status, StatusCode::MULTI_STATUS);
    assert_eq!(body["failed"], 1);
    assert_eq!(body["errors"][0]["index"], 1);
    assert!(body["errors"][0]["errors"]["name"].is_array());

    let (status, bytes) = send(&app, multipart("file", "bad.csv", "name\nAlpha\n")).await;
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["succeeded"], 0);
    assert_eq!(body["message"], "0 records imported, 1 errors.");
}

#[tokio::test]
async fn test_import_request_shape_errors() {
    let app = app();

    let (status, bytes) = send(&app, multipart("upload", "x.csv", "name\nA\n")).await;
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No file part in the request.");

    let (status, bytes) = send(&app, multipart("file", "", "name\nA\n")).await;
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No selected file.");

    let (status, bytes) = send(&app, multipart("file", "x.csv", "title\nA\n")).await;
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .starts_with("Invalid CSV file:")
    );

    let (status, bytes) = send(
        &app,
        multipart_to("/import/json", "file", "x.json", r#"{"name": "A"}"#),
    )
    .await;
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .starts_with("Invalid JSON file:")
    );
}

#[tokio::test]
async fn test_export_then_import_round_trip() {
    let app = app();
    let root = create(&app, json!({"name": "Root", "is_active": false})).await;
    create(
        &app,
        json!({"name": "Leaf, Inc.", "parent_id": root["id"], "employees_count": 3}),
    )
    .await;

    let request = Request::builder()
        .uri("/export/csv")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=export.csv"
    );
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );
    let csv = response.into_body().collect().await.unwrap().to_bytes();
    let csv = String::from_utf8(csv.to_vec()).unwrap();

    let fresh = self::app();
    let (status, bytes) = send(&fresh, multipart("file", "export.csv", &csv)).await;
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["created"], 2);

    let (_, original) = send_json(&app, "GET", "/companies", None).await;
    let (_, imported) = send_json(&fresh, "GET", "/companies", None).await;
    for (a, b) in original
        .as_array()
        .unwrap()
        .iter()
        .zip(imported.as_array().unwrap())
    {
        for field in ["id", "name", "parent_id", "is_active", "employees_count"] {
            assert_eq!(a[field], b[field], "{field}");
        }
    }
}

#[tokio::test]
async fn test_export_json() {
    let app = app();
    create(&app, json!({"name": "Acme"})).await;

    let request = Request::builder()
        .uri("/export/json")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=export.json"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body[0]["name"], "Acme");
}

#[tokio::test]
async fn test_meta_endpoints() {
    let app = app();

    let (status, body) = send_json(&app, "GET", "/version", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"version": env!("CARGO_PKG_VERSION")}));

    let (status, body) = send_json(&app, "GET", "/config", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "FLASK_ENV": "testing",
            "DEBUG": false,
            "DATABASE_URI": "sqlite://:memory:"
        })
    );
}

#[tokio::test]
async fn test_security_headers() {
    let app = app();
    let request = Request::builder()
        .uri("/version")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert_eq!(response.headers()["x-frame-options"], "DENY");
}
