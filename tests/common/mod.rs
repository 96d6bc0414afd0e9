//! Shared setup for the HTTP-level tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use axum_test::TestServer;
use research_admin::ai::{TextGenerator, UnconfiguredGenerator};
use research_admin::database::setup_database;
use research_admin::errors::AiServiceError;
use research_admin::server::app::{create_app, AppState};
use serde_json::{json, Value};
use tempfile::TempDir;

/// Answers every prompt with the same canned text and records what it was asked.
pub struct CannedGenerator {
    reply: String,
    pub prompts: Mutex<Vec<String>>,
}

impl CannedGenerator {
    pub fn new(reply: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.into(),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }
}

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, AiServiceError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        Ok(self.reply.clone())
    }
}

/// Test server over a file-backed database; keep the `TempDir` alive for the whole test.
pub async fn setup_server_with(ai: Arc<dyn TextGenerator>) -> Result<(TestServer, TempDir)> {
    let dir = TempDir::new()?;
    let path = dir.path().join("research_admin.db");
    let db = setup_database(&path.display().to_string()).await?;

    let app = create_app(AppState::new(db, ai), None)?;
    let server = TestServer::new(app)?;
    Ok((server, dir))
}

pub async fn setup_server() -> Result<(TestServer, TempDir)> {
    setup_server_with(Arc::new(UnconfiguredGenerator)).await
}

pub async fn create(server: &TestServer, path: &str, body: Value) -> Value {
    let response = server.post(path).json(&body).await;
    assert_eq!(
        response.status_code().as_u16(),
        201,
        "POST {} failed: {}",
        path,
        response.text()
    );
    response.json()
}

pub async fn create_researcher(server: &TestServer, name: &str, email: &str) -> i64 {
    let researcher = create(
        server,
        "/api/researchers",
        json!({ "name": name, "email": email, "department": "Physics" }),
    )
    .await;
    researcher["id"].as_i64().unwrap()
}

pub async fn create_project(server: &TestServer, name: &str, lead_id: i64) -> i64 {
    let project = create(
        server,
        "/api/projects",
        json!({ "name": name, "startDate": "2024-01-01", "leadResearcherId": lead_id }),
    )
    .await;
    project["id"].as_i64().unwrap()
}

pub async fn create_grant(server: &TestServer, title: &str, pi_id: i64) -> i64 {
    let grant = create(
        server,
        "/api/grants",
        json!({
            "title": title,
            "agency": "NSF",
            "amount": 250000.0,
            "status": "PENDING",
            "startDate": "2024-01-01",
            "endDate": "2026-12-31",
            "principalInvestigatorId": pi_id
        }),
    )
    .await;
    grant["id"].as_i64().unwrap()
}
