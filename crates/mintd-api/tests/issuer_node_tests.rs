//! Issuer-node endpoint tests: creation in both wire shapes, reads,
//! label updates, and deletion.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{create_node, delete, get, post, put, ALICE, PROJECT};

#[tokio::test]
async fn create_with_canonical_payload() {
    let storage = common::seeded_storage();

    let (status, body) = post(
        &storage,
        &format!("/projects/{PROJECT}/issuer-nodes"),
        Some(ALICE),
        json!({
            "label": "treasury",
            "keys": [{"external_key": "xpub-a"}, {"generate": true}],
            "sigs_required": 2,
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["label"], "treasury");
    assert_eq!(body["project_id"], PROJECT);
    assert_eq!(body["sigs_required"], 2);

    let keys = body["keys"].as_array().unwrap();
    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0]["xpub"], "xpub-a");
    assert_eq!(keys[0]["generated"], false);
    assert_eq!(keys[1]["generated"], true);
}

#[tokio::test]
async fn create_with_deprecated_payload() {
    let storage = common::seeded_storage();

    let (status, body) = post(
        &storage,
        &format!("/projects/{PROJECT}/issuer-nodes"),
        Some(ALICE),
        json!({"label": "legacy", "xpubs": ["x1", "x2"], "generate_key": true}),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["sigs_required"], 1);

    let keys = body["keys"].as_array().unwrap();
    assert_eq!(keys.len(), 3);
    assert_eq!(keys[0]["xpub"], "x1");
    assert_eq!(keys[1]["xpub"], "x2");
    assert_eq!(keys[2]["generated"], true);
}

#[tokio::test]
async fn create_with_excessive_threshold_is_rejected() {
    let storage = common::seeded_storage();

    let (status, body) = post(
        &storage,
        &format!("/projects/{PROJECT}/issuer-nodes"),
        Some(ALICE),
        json!({"label": "C", "keys": [{"generate": true}], "sigs_required": 2}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");
}

#[tokio::test]
async fn create_with_malformed_body_is_rejected() {
    let storage = common::seeded_storage();

    let (status, body) = common::send(
        &storage,
        "POST",
        &format!("/projects/{PROJECT}/issuer-nodes"),
        Some(ALICE),
        Some(json!("not an object")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");
}

#[tokio::test]
async fn get_returns_created_node() {
    let storage = common::seeded_storage();
    let node_id = create_node(&storage, "n1").await;

    let (status, body) = get(&storage, &format!("/issuer-nodes/{node_id}"), Some(ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], node_id.as_str());
    assert_eq!(body["label"], "n1");
}

#[tokio::test]
async fn list_returns_all_nodes_in_project() {
    let storage = common::seeded_storage();
    let a = create_node(&storage, "a").await;
    let b = create_node(&storage, "b").await;

    let (status, body) = get(
        &storage,
        &format!("/projects/{PROJECT}/issuer-nodes"),
        Some(ALICE),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["last"].is_null());

    let ids: Vec<&str> = body["issuer_nodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![a.as_str(), b.as_str()]);
}

#[tokio::test]
async fn update_replaces_label() {
    let storage = common::seeded_storage();
    let node_id = create_node(&storage, "before").await;

    let (status, body) = put(
        &storage,
        &format!("/issuer-nodes/{node_id}"),
        Some(ALICE),
        json!({"label": "after"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["label"], "after");

    let (_, fetched) = get(&storage, &format!("/issuer-nodes/{node_id}"), Some(ALICE)).await;
    assert_eq!(fetched["label"], "after");
}

#[tokio::test]
async fn update_without_label_is_rejected() {
    let storage = common::seeded_storage();
    let node_id = create_node(&storage, "n").await;

    let (status, body) = put(
        &storage,
        &format!("/issuer-nodes/{node_id}"),
        Some(ALICE),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");
}

#[tokio::test]
async fn delete_removes_node() {
    let storage = common::seeded_storage();
    let node_id = create_node(&storage, "doomed").await;

    let (status, _) = delete(&storage, &format!("/issuer-nodes/{node_id}"), Some(ALICE)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The ID no longer resolves, so the authorization walk fails and the
    // response collapses to forbidden rather than confirming the deletion.
    let (status, body) = get(&storage, &format!("/issuer-nodes/{node_id}"), Some(ALICE)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");
}
