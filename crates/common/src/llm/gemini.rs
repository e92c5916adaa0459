//! Google Generative Language API client

use super::{http_client, provider_error, CompletionProvider, GenerationParams, ProviderKind};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini completion client
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        (!text.is_empty()).then_some(text)
    }
}

impl GeminiProvider {
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
impl CompletionProvider for GeminiProvider {
    async fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| AppError::Provider {
            provider: self.kind().to_string(),
            message: "GEMINI_API_KEY is not set".to_string(),
        })?;

        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_tokens,
            },
        };

        let response = self
            .client
            .post(format!("{}/{}:generateContent", self.base_url, self.model))
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(provider_error(self.kind(), response).await);
        }

        let body: GenerateResponse = response.json().await?;
        body.into_text().ok_or_else(|| AppError::Provider {
            provider: self.kind().to_string(),
            message: "response contained no candidate text".to_string(),
        })
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let provider = GeminiProvider::new(None, None, None, Duration::from_secs(5)).unwrap();
        assert_eq!(provider.model_name(), "gemini-1.5-flash");
        assert!(!provider.is_configured());
    }

    #[test]
    fn test_request_shape() {
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: "hello" }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.5,
                max_output_tokens: 500,
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 500);
    }

    #[test]
    fn test_response_text_joins_parts() {
        let body: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"there"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(body.into_text().as_deref(), Some("Hello there"));

        let empty: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(empty.into_text().is_none());
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        let provider = GeminiProvider::new(None, None, None, Duration::from_secs(5)).unwrap();
        let params = GenerationParams { temperature: 0.1, max_tokens: 10 };
        let err = provider.complete("hi", &params).await.unwrap_err();
        assert!(matches!(err, AppError::Provider { .. }));
    }

    #[tokio::test]
    async fn test_transport_error_does_not_leak_key() {
        let provider = GeminiProvider::new(
            Some("SECRET_GEMINI_KEY".to_string()),
            None,
            Some("http://127.0.0.1:9".to_string()),
            Duration::from_secs(2),
        )
        .unwrap();
        let params = GenerationParams { temperature: 0.1, max_tokens: 10 };

        let err = provider.complete("hi", &params).await.unwrap_err();
        assert!(matches!(err, AppError::HttpClient(_)));
        assert!(!err.to_string().contains("SECRET_GEMINI_KEY"));
        assert!(!format!("{:?}", err).contains("SECRET_GEMINI_KEY"));
    }
}
