//! Health check handlers

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AppState;
use proppilot_common::llm::ProviderKind;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub models: ModelAvailability,
}

/// Whether each provider has credentials
#[derive(Serialize)]
pub struct ModelAvailability {
    pub gemini: bool,
    pub groq: bool,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub store: CheckResult,
}

#[derive(Serialize)]
pub struct CheckResult {
    pub status: String,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Liveness probe with provider configuration flags
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let providers = state.pipeline.providers();
    Json(HealthResponse {
        status: "OK".to_string(),
        timestamp: Utc::now(),
        models: ModelAvailability {
            gemini: providers.is_available(ProviderKind::Gemini),
            groq: providers.is_available(ProviderKind::Groq),
        },
    })
}

/// Readiness probe - pings the property store
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let store = state.pipeline.store();
    let start = std::time::Instant::now();

    let store_check = match store.ping().await {
        Ok(()) => CheckResult {
            status: "up".to_string(),
            backend: store.backend().to_string(),
            latency_ms: Some(start.elapsed().as_millis() as u64),
            error: None,
        },
        Err(e) => CheckResult {
            status: "down".to_string(),
            backend: store.backend().to_string(),
            latency_ms: None,
            error: Some(e.to_string()),
        },
    };

    let all_healthy = store_check.status == "up";
    let code = if all_healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        code,
        Json(ReadyResponse {
            status: if all_healthy { "ready" } else { "not_ready" }.to_string(),
            checks: HealthChecks { store: store_check },
        }),
    )
}

/// Prometheus scrape endpoint
pub async fn metrics(State(state): State<AppState>) -> (StatusCode, String) {
    match state.metrics {
        Some(ref handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics disabled\n".to_string()),
    }
}
