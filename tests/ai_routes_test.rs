//! AI route tests with a canned text generator in place of the hosted model

mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{create_researcher, setup_server, setup_server_with, CannedGenerator};

#[tokio::test]
async fn test_summarize_text_relays_answer() -> Result<()> {
    let generator = CannedGenerator::new("  A short summary.\n");
    let (server, _dir) = setup_server_with(generator.clone()).await?;

    let response = server
        .post("/api/ai/summarize-text")
        .json(&json!({ "text": "A very long text about lasers." }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["summary"], "A short summary.");
    assert_eq!(generator.calls(), 1);

    Ok(())
}

#[tokio::test]
async fn test_invalid_input_never_reaches_generator() -> Result<()> {
    let generator = CannedGenerator::new("unused");
    let (server, _dir) = setup_server_with(generator.clone()).await?;

    let response = server
        .post("/api/ai/summarize-text")
        .json(&json!({ "text": "   " }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = server
        .post("/api/ai/search-external-grants")
        .json(&json!({ "searchCriteria": { "eligibility": "Anyone" } }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    assert_eq!(generator.calls(), 0);

    Ok(())
}

#[tokio::test]
async fn test_analyze_notes_accepts_fenced_json() -> Result<()> {
    let reply = "```json\n{\"sentiment\": \"Positive\", \"keyThemes\": [\"optics\", \"funding\"], \"summary\": \"Going well.\"}\n```";
    let (server, _dir) = setup_server_with(CannedGenerator::new(reply)).await?;

    let response = server
        .post("/api/ai/analyze-notes")
        .json(&json!({ "notesText": "Mirrors aligned. Proposal submitted." }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["sentiment"], "Positive");
    assert_eq!(body["keyThemes"], json!(["optics", "funding"]));

    Ok(())
}

#[tokio::test]
async fn test_analyze_notes_missing_keys_is_upstream_error() -> Result<()> {
    let (server, _dir) = setup_server_with(CannedGenerator::new("{\"summary\": \"x\"}")).await?;

    let response = server
        .post("/api/ai/analyze-notes")
        .json(&json!({ "notesText": "Some notes" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);

    Ok(())
}

#[tokio::test]
async fn test_global_search_drops_malformed_items() -> Result<()> {
    let reply = r#"[
        {"id": "1", "type": "researcher", "name": "Ada", "matchContext": "works on lasers"},
        {"id": "2", "type": "lab"}
    ]"#;
    let generator = CannedGenerator::new(reply);
    let (server, _dir) = setup_server_with(generator.clone()).await?;
    create_researcher(&server, "Ada", "ada@example.edu").await;

    let response = server
        .post("/api/ai/global-search")
        .json(&json!({ "query": "lasers" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let hits: Vec<Value> = response.json();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["type"], "researcher");

    let prompts = generator.prompts.lock().unwrap();
    assert!(prompts[0].contains("ada@example.edu"));

    Ok(())
}

#[tokio::test]
async fn test_global_search_rejects_non_array_answer() -> Result<()> {
    let (server, _dir) = setup_server_with(CannedGenerator::new("{\"hits\": []}")).await?;

    let response = server
        .post("/api/ai/global-search")
        .json(&json!({ "query": "lasers" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["error"], "UPSTREAM_SERVICE_ERROR");

    Ok(())
}

#[tokio::test]
async fn test_match_researchers_with_empty_store() -> Result<()> {
    let generator = CannedGenerator::new("[]");
    let (server, _dir) = setup_server_with(generator.clone()).await?;

    let response = server
        .post("/api/ai/match-researchers")
        .json(&json!({ "grantDescription": "Photonics instrumentation" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert!(body["matches"].as_array().unwrap().is_empty());
    assert!(body["message"].is_string());
    assert_eq!(generator.calls(), 0);

    Ok(())
}

#[tokio::test]
async fn test_grant_email_requires_known_pi() -> Result<()> {
    let reply = "{\"subject\": \"Congratulations\", \"body\": \"Dear Ada, ...\"}";
    let (server, _dir) = setup_server_with(CannedGenerator::new(reply)).await?;

    let request = |pi_id: i64| {
        json!({
            "grant": { "title": "Quantum Optics", "agency": "NSF", "description": "Photonics" },
            "piId": pi_id
        })
    };

    let response = server
        .post("/api/ai/generate-grant-email")
        .json(&request(42))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let ada = create_researcher(&server, "Ada", "ada@example.edu").await;
    let response = server
        .post("/api/ai/generate-grant-email")
        .json(&request(ada))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["subject"], "Congratulations");

    Ok(())
}

#[tokio::test]
async fn test_unconfigured_generator_is_bad_gateway() -> Result<()> {
    let (server, _dir) = setup_server().await?;

    let response = server
        .post("/api/ai/summarize-text")
        .json(&json!({ "text": "Anything" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["error"], "UPSTREAM_SERVICE_ERROR");

    Ok(())
}
