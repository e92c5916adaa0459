//! Groq client (OpenAI-compatible chat completions)

use super::{http_client, provider_error, CompletionProvider, GenerationParams, ProviderKind};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_MODEL: &str = "llama3-8b-8192";
const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Groq completion client
pub struct GroqProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl GroqProvider {
    pub fn new(
        api_key: Option<String>,
        model: Option<String>,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

#[async_trait]
impl CompletionProvider for GroqProvider {
    async fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| AppError::Provider {
            provider: self.kind().to_string(),
            message: "GROQ_API_KEY is not set".to_string(),
        })?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(provider_error(self.kind(), response).await);
        }

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| AppError::Provider {
                provider: self.kind().to_string(),
                message: "response contained no message content".to_string(),
            })
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Groq
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}
