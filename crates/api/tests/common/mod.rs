#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use miso_api::config::ServerConfig;
use miso_api::router::build_app_router;
use miso_api::state::{AppState, Collaborators};
use miso_core::policy::Decision;
use miso_pipeline::error::{GenerationError, PolicyError};
use miso_pipeline::generation::TextGenerator;
use miso_pipeline::policy_gate::PolicyReviewer;
use sqlx::PgPool;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        policy_bypass: false,
        gemini_api_key: None,
        gemini_model: "test-model".to_string(),
        gemini_base_url: "http://127.0.0.1:9".to_string(),
        remote_executor_port: 8000,
        remote_execution_timeout_secs: 10,
    }
}

// ---------------------------------------------------------------------------
// Stub collaborators
// ---------------------------------------------------------------------------

/// Reviewer with a fixed answer, or a failure when `None`.
pub struct StubReviewer(pub Option<Decision>);

#[async_trait]
impl PolicyReviewer for StubReviewer {
    async fn review(&self, _mission: &str) -> Result<Decision, PolicyError> {
        self.0
            .clone()
            .ok_or(PolicyError::Unavailable(GenerationError::EmptyResponse))
    }
}

/// Generator that answers `<prompt>` so chaining is visible in outputs.
pub struct BracketGenerator;

#[async_trait]
impl TextGenerator for BracketGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        Ok(format!("<{prompt}>"))
    }
}

pub fn approving() -> Collaborators {
    Collaborators {
        generator: Some(Arc::new(BracketGenerator)),
        reviewer: Some(Arc::new(StubReviewer(Some(Decision::approve("PROCEED"))))),
    }
}

pub fn vetoing() -> Collaborators {
    Collaborators {
        generator: Some(Arc::new(BracketGenerator)),
        reviewer: Some(Arc::new(StubReviewer(Some(Decision::veto("VETO"))))),
    }
}

pub fn reviewer_down() -> Collaborators {
    Collaborators {
        generator: None,
        reviewer: Some(Arc::new(StubReviewer(None))),
    }
}

// ---------------------------------------------------------------------------
// App builders
// ---------------------------------------------------------------------------

/// Build the full application router with an approving reviewer.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, test_config(), approving())
}

/// Build the full application router with the production middleware stack.
pub fn build_test_app_with(pool: PgPool, config: ServerConfig, collaborators: Collaborators) -> Router {
    let state = AppState::new(pool, config.clone(), collaborators).unwrap();
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Poll `GET /api/v1/missions/{id}` until the mission leaves `pending` and
/// `running`, returning the final payload.
pub async fn wait_for_terminal(app: &Router, mission_id: i64) -> serde_json::Value {
    let uri = format!("/api/v1/missions/{mission_id}");
    for _ in 0..200 {
        let json = body_json(get(app.clone(), &uri).await).await;
        let status = json["data"]["status"].as_str().unwrap().to_string();
        if status == "complete" || status == "error" {
            return json["data"].clone();
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("mission {mission_id} did not finish in time");
}
