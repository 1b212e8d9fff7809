//! HTTP gateway over the check engine.
//!
//! Checks are reloaded from disk on every request.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use intent_core::{load_checks_dir, CheckEngine, CheckResult, CheckSet, CheckSummary};
use serde::Serialize;
use serde_json::json;
use tokio::signal;
use tracing::{info, warn};

use crate::cli::args::ServeArgs;
use crate::exit_codes;

#[derive(Clone)]
pub struct AppState {
    pub engine: CheckEngine,
    pub checks_dir: PathBuf,
}

impl AppState {
    pub fn new(engine: CheckEngine, checks_dir: PathBuf) -> Self {
        Self { engine, checks_dir }
    }

    fn load(&self) -> Result<CheckSet, ApiError> {
        load_checks_dir(&self.checks_dir).map_err(|e| {
            warn!(error = %e, "failed to load checks");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })
    }
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct RunAllResponse {
    pub results: Vec<CheckResult>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/checks", get(list_checks))
        .route("/run/{check_id}", post(run_check))
        .route("/run_all", post(run_all))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

async fn list_checks(State(state): State<AppState>) -> Result<Json<Vec<CheckSummary>>, ApiError> {
    Ok(Json(state.load()?.summaries()))
}

async fn run_check(
    State(state): State<AppState>,
    Path(check_id): Path<String>,
) -> Result<Json<CheckResult>, ApiError> {
    let checks = state.load()?;
    let def = checks
        .find(&check_id)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "check not found"))?;
    Ok(Json(state.engine.evaluate(def).await))
}

async fn run_all(State(state): State<AppState>) -> Result<Json<RunAllResponse>, ApiError> {
    let checks = state.load()?;
    let results = state.engine.evaluate_all(checks.definitions()).await;
    Ok(Json(RunAllResponse { results }))
}

pub async fn run(args: ServeArgs) -> Result<i32> {
    let engine = args.provider.build_engine()?;
    let state = AppState::new(engine, args.checks.checks_dir.clone());

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", args.host, args.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(exit_codes::SUCCESS)
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    info!("shutdown requested");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use intent_core::{EngineSettings, FakeProvider};
    use serde_json::Value;

    const TRENDING: &str = "\
id: trending_palm_springs
description: Palm Springs is trending in US/en-US
severity: high
assert:
  type: contains_title
  title_id: t_palm_springs
target:
  region: US
  locale: en-US
";

    const BOGUS: &str = "id: bogus\nassert:\n  type: bogus_type\n";

    async fn spawn_gateway(checks_dir: PathBuf) -> String {
        let provider = FakeProvider::new().with_trending("US", "en-US", &["t_foo", "t_palm_springs"]);
        let engine = CheckEngine::new(Arc::new(provider), EngineSettings::default());
        let app = router(AppState::new(engine, checks_dir));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn checks_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a_trending.yaml"), TRENDING).unwrap();
        std::fs::write(dir.path().join("b_bogus.yaml"), BOGUS).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_health_and_checks() {
        let dir = checks_dir();
        let base = spawn_gateway(dir.path().to_path_buf()).await;
        let client = reqwest::Client::new();

        let health: Value = client
            .get(format!("{base}/health"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health, json!({ "ok": true }));

        let checks: Value = client
            .get(format!("{base}/checks"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let ids: Vec<&str> = checks
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, ["trending_palm_springs", "bogus"]);
        assert_eq!(checks[0]["assert"]["type"], "contains_title");
    }

    #[tokio::test]
    async fn test_run_single_check() {
        let dir = checks_dir();
        let base = spawn_gateway(dir.path().to_path_buf()).await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{base}/run/trending_palm_springs"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "PASS");
        assert_eq!(body["severity"], "high");
        assert_eq!(body["evidence"]["expected_title_id"], "t_palm_springs");
    }

    #[tokio::test]
    async fn test_unknown_check_is_404() {
        let dir = checks_dir();
        let base = spawn_gateway(dir.path().to_path_buf()).await;

        let resp = reqwest::Client::new()
            .post(format!("{base}/run/nope"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body, json!({ "detail": "check not found" }));
    }

    #[tokio::test]
    async fn test_run_all_keeps_order_and_isolates_errors() {
        let dir = checks_dir();
        let base = spawn_gateway(dir.path().to_path_buf()).await;

        let body: Value = reqwest::Client::new()
            .post(format!("{base}/run_all"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["status"], "PASS");
        assert_eq!(results[1]["check_id"], "bogus");
        assert_eq!(results[1]["status"], "ERROR");
        assert!(results[1]["error"]
            .as_str()
            .unwrap()
            .contains("unknown assertion type"));
    }

    #[tokio::test]
    async fn test_checks_reloaded_per_request() {
        let dir = checks_dir();
        let base = spawn_gateway(dir.path().to_path_buf()).await;
        let client = reqwest::Client::new();

        let resp = client.post(format!("{base}/run/late")).send().await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

        std::fs::write(
            dir.path().join("c_late.yaml"),
            TRENDING.replace("trending_palm_springs", "late"),
        )
        .unwrap();
        let resp = client.post(format!("{base}/run/late")).send().await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_checks_dir_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn_gateway(dir.path().join("missing")).await;

        let resp = reqwest::Client::new()
            .get(format!("{base}/checks"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = resp.json().await.unwrap();
        assert!(body["detail"].as_str().unwrap().contains("missing"));
    }
}
