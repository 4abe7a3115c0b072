//! Word entry API tests.

mod common;

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use common::{FakeAnki, FakeDictionary, TestContext};
use sentences_core::DictionaryEntry;

/// Fresh state holds exactly one selected draft.
#[tokio::test]
async fn test_list_starts_with_one_draft() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server.get("/api/entries").await;

    response.assert_status_ok();
    let body: Value = response.json();
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["status"], "draft");
    assert_eq!(body["selectedId"], entries[0]["id"]);
}

/// Creating prepends the new entry and selects it.
#[tokio::test]
async fn test_create_prepends_and_selects() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let first = ctx.selected_id();

    let response = server.post("/api/entries").await;

    response.assert_status(StatusCode::CREATED);
    let created: Value = response.json();
    let list: Value = server.get("/api/entries").await.json();
    assert_eq!(list["selectedId"], created["id"]);
    assert_eq!(list["entries"][0]["id"], created["id"]);
    assert_eq!(list["entries"][1]["id"], first.as_str());
}

/// Removing the last entry leaves a fresh draft behind.
#[tokio::test]
async fn test_remove_last_entry_synthesizes_draft() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let only = ctx.selected_id();

    let response = server.delete(&format!("/api/entries/{only}")).await;

    response.assert_status_ok();
    let body: Value = response.json();
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_ne!(entries[0]["id"], only.as_str());
    assert_eq!(body["selectedId"], entries[0]["id"]);
}

/// Removing the selected entry selects the new first entry.
#[tokio::test]
async fn test_remove_selected_moves_selection() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let older = ctx.selected_id();
    let newer: Value = server.post("/api/entries").await.json();

    let body: Value = server
        .delete(&format!("/api/entries/{}", newer["id"].as_str().unwrap()))
        .await
        .json();

    assert_eq!(body["selectedId"], older.as_str());
}

#[tokio::test]
async fn test_unknown_entry_is_not_found() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server.get("/api/entries/missing").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"], "not_found");

    server
        .post("/api/entries/missing/select")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .delete("/api/entries/missing")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

/// Definitions are parsed with the preset; re-editing keeps counts by index.
#[tokio::test]
async fn test_definitions_keep_counts_across_edits() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let id = ctx.selected_id();

    let body: Value = server
        .put(&format!("/api/entries/{id}/definitions"))
        .json(&json!({
            "definitionsRaw": "1. to run\n2) to flee\nnot a definition",
            "preset": "2/1",
        }))
        .await
        .json();
    assert_eq!(body["definitions"].as_array().unwrap().len(), 2);
    assert_eq!(body["definitions"][0]["count"], 2);
    assert_eq!(body["definitions"][1]["count"], 1);

    server
        .put(&format!("/api/entries/{id}/definitions/2/count"))
        .json(&json!({ "count": 4 }))
        .await
        .assert_status_ok();

    let body: Value = server
        .put(&format!("/api/entries/{id}/definitions"))
        .json(&json!({ "definitionsRaw": "1. to run\n2. to run away\n3. to extend" }))
        .await
        .json();
    let counts: Vec<u64> = body["definitions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["count"].as_u64().unwrap())
        .collect();
    assert_eq!(counts, vec![2, 4, 1]);
    assert_eq!(body["definitions"][1]["text"], "to run away");
}

#[tokio::test]
async fn test_repeated_definition_number_is_rejected() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let id = ctx.seed_entry(&server, "走る", "1. to run").await;

    let response = server
        .put(&format!("/api/entries/{id}/definitions"))
        .json(&json!({ "definitionsRaw": "1. to run\n1. to flee" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "bad_request");
    assert!(body["message"].as_str().unwrap().contains("number 1"));

    let entry: Value = server.get(&format!("/api/entries/{id}")).await.json();
    assert_eq!(entry["definitionsRaw"], "1. to run");
    assert_eq!(entry["definitions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_count_for_unknown_definition_is_not_found() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let id = ctx.seed_entry(&server, "走る", "1. to run").await;

    server
        .put(&format!("/api/entries/{id}/definitions/9/count"))
        .json(&json!({ "count": 1 }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

/// Clearing discards generated material and returns to draft.
#[tokio::test]
async fn test_clear_returns_entry_to_draft() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let id = ctx.seed_entry(&server, "走る", "1. to run").await;
    server
        .post(&format!("/api/entries/{id}/generate"))
        .await
        .assert_status_ok();

    let body: Value = server.post(&format!("/api/entries/{id}/clear")).await.json();

    assert_eq!(body["status"], "draft");
    assert!(body["sentences"].as_array().unwrap().is_empty());
    assert!(body["generationBatches"].as_array().unwrap().is_empty());
    assert_eq!(body["definitions"].as_array().unwrap().len(), 1);
}

/// Dictionary meanings become numbered definitions and fill the reading.
#[tokio::test]
async fn test_autofill_fills_definitions() {
    let dictionary = FakeDictionary {
        entry: Some(DictionaryEntry {
            reading: Some("はしる".into()),
            meanings: vec!["to run".into(), "to flee".into()],
            external_id: Some((1, 2)),
        }),
    };
    let ctx = TestContext::with(FakeAnki::default(), dictionary);
    ctx.update_settings(|s| s.jpdb_api_key = "jpdb-key".into());
    let server = ctx.server();
    let id = ctx.selected_id();
    server
        .put(&format!("/api/entries/{id}/word"))
        .json(&json!({ "word": "走る" }))
        .await
        .assert_status_ok();

    let response = server.post(&format!("/api/entries/{id}/autofill")).await;

    response.assert_status_ok();
    let outcome: Value = response.json();
    assert_eq!(outcome["outcome"], "filled");
    assert_eq!(outcome["definitions"], 2);

    let entry: Value = server.get(&format!("/api/entries/{id}")).await.json();
    assert_eq!(entry["definitionsRaw"], "1. to run\n2. to flee");
    assert_eq!(entry["reading"], "はしる");
}

/// Without a dictionary key the lookup is skipped and nothing changes.
#[tokio::test]
async fn test_autofill_without_key_is_skipped() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let id = ctx.seed_entry(&server, "走る", "1. to run").await;

    let outcome: Value = server.post(&format!("/api/entries/{id}/autofill")).await.json();

    assert_eq!(outcome["outcome"], "skipped");
    let entry: Value = server.get(&format!("/api/entries/{id}")).await.json();
    assert_eq!(entry["definitionsRaw"], "1. to run");
}
