//! Chat handler

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::AppJson;
use crate::AppState;
use proppilot_common::{
    context::SearchCriteria,
    db::PropertyRecord,
    errors::{AppError, Result},
    llm::ProviderKind,
};

/// Chat request body
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Missing and blank messages are rejected by the pipeline
    #[serde(default)]
    pub message: String,

    #[validate(length(max = 128))]
    pub session_id: Option<String>,

    /// `gemini` or `groq`
    pub provider_choice: Option<String>,

    /// Legacy switch; `providerChoice` wins when both are sent
    pub use_groq: Option<bool>,
}

impl ChatRequest {
    fn provider(&self) -> Result<Option<ProviderKind>> {
        if let Some(choice) = self.provider_choice.as_deref() {
            return choice.parse().map(Some);
        }
        Ok(self.use_groq.map(|groq| {
            if groq {
                ProviderKind::Groq
            } else {
                ProviderKind::Gemini
            }
        }))
    }
}

/// Chat response body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub message: String,
    pub search_criteria: SearchCriteria,
    pub properties_found: usize,
    pub properties: Vec<PropertyRecord>,
    pub session_id: String,
    pub model: ProviderKind,
}

/// Run one message through the chat pipeline
pub async fn chat(
    State(state): State<AppState>,
    AppJson(request): AppJson<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let expose_details = state.config.expose_error_details();

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: Some("sessionId".to_string()),
    })?;
    let provider = request.provider()?;

    let outcome = state
        .pipeline
        .handle(&request.message, request.session_id.as_deref(), provider)
        .await
        .map_err(|e| e.redact(expose_details))?;

    Ok(Json(ChatResponse {
        message: outcome.response_text,
        search_criteria: outcome.criteria,
        properties_found: outcome.match_count,
        properties: outcome.top_records,
        session_id: outcome.session_id,
        model: outcome.provider_used,
    }))
}
