//! Shared test utilities for mintd API tests.

// Allow dead_code because helpers are used across different test files,
// but each test binary is compiled independently.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use mintd_api::http::{create_router, AppState, PRINCIPAL_HEADER};
use mintd_storage::MemoryDataStore;

/// Seeded project ID.
pub const PROJECT: &str = "proj-1";

/// A member of [`PROJECT`].
pub const ALICE: &str = "alice";

/// A caller with no project membership anywhere.
pub const MALLORY: &str = "mallory";

/// Create a storage backend seeded with one project and one member.
pub fn seeded_storage() -> Arc<MemoryDataStore> {
    let storage = MemoryDataStore::new_shared();
    storage.insert_project(PROJECT, &[ALICE]);
    storage
}

/// Create a test app over shared storage.
///
/// Each call builds a fresh router, which is the correct pattern for
/// Axum's `oneshot` testing.
pub fn create_test_app(storage: &Arc<MemoryDataStore>) -> axum::Router {
    create_router(AppState::new(Arc::clone(storage)))
}

/// Send a request and return status + parsed JSON body.
pub async fn send(
    storage: &Arc<MemoryDataStore>,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(PRINCIPAL_HEADER, user);
    }
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = create_test_app(storage).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let parsed = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            json!({ "raw_body": String::from_utf8_lossy(&bytes).to_string() })
        })
    };
    (status, parsed)
}

pub async fn get(
    storage: &Arc<MemoryDataStore>,
    uri: &str,
    user: Option<&str>,
) -> (StatusCode, Value) {
    send(storage, "GET", uri, user, None).await
}

pub async fn post(
    storage: &Arc<MemoryDataStore>,
    uri: &str,
    user: Option<&str>,
    body: Value,
) -> (StatusCode, Value) {
    send(storage, "POST", uri, user, Some(body)).await
}

pub async fn put(
    storage: &Arc<MemoryDataStore>,
    uri: &str,
    user: Option<&str>,
    body: Value,
) -> (StatusCode, Value) {
    send(storage, "PUT", uri, user, Some(body)).await
}

pub async fn delete(
    storage: &Arc<MemoryDataStore>,
    uri: &str,
    user: Option<&str>,
) -> (StatusCode, Value) {
    send(storage, "DELETE", uri, user, None).await
}

/// Create an issuer node as ALICE and return its ID.
pub async fn create_node(storage: &Arc<MemoryDataStore>, label: &str) -> String {
    let (status, body) = post(
        storage,
        &format!("/projects/{PROJECT}/issuer-nodes"),
        Some(ALICE),
        json!({"label": label, "keys": [{"generate": true}], "sigs_required": 1}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "node creation failed: {body}");
    body["id"].as_str().unwrap().to_string()
}

/// Create an asset under a node as ALICE and return its ID.
pub async fn create_asset(storage: &Arc<MemoryDataStore>, node_id: &str, label: &str) -> String {
    let (status, body) = post(
        storage,
        &format!("/issuer-nodes/{node_id}/assets"),
        Some(ALICE),
        json!({"label": label, "definition": {"issuer": "test"}}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "asset creation failed: {body}");
    body["id"].as_str().unwrap().to_string()
}
