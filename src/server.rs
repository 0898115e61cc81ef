use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::analysis::AnalysisResult;
use crate::analyze::Analyzer;
use crate::error::AnalyzeError;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AnalyzeRequest {
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub model: String,
}

/// Bind the listening socket. `host` may be an IP literal or a hostname.
pub async fn bind(host: &str, port: u16) -> eyre::Result<TcpListener> {
    TcpListener::bind((host, port))
        .await
        .wrap_err_with(|| format!("failed to bind {host}:{port}"))
}

/// HTTP API: `GET /api/health` and `POST /api/analyze`
pub fn router(analyzer: Analyzer) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health))
        .route("/analyze", post(analyze));

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .with_state(analyzer)
}

pub async fn health(State(analyzer): State<Analyzer>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        model: analyzer.model().to_string(),
    })
}

/// The body is parsed leniently: a missing or malformed body is treated
/// the same as one without a `url`. A blank but non-empty `url` still goes
/// through extraction.
pub async fn analyze(State(analyzer): State<Analyzer>, body: Bytes) -> Result<Json<AnalysisResult>, AnalyzeError> {
    let request: AnalyzeRequest = serde_json::from_slice(&body).unwrap_or_default();
    let url = request
        .url
        .filter(|u| !u.is_empty())
        .ok_or(AnalyzeError::MissingUrl)?;

    analyzer.analyze(&url).await.map(Json)
}
