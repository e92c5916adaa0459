//! Text-completion provider abstraction
//!
//! Provides a unified interface over the two supported providers:
//! - Gemini (Google Generative Language API)
//! - Groq (OpenAI-compatible chat completions)
//!
//! Both take a single prompt plus generation parameters and return free text.
//! `ProviderRegistry` selects between them and falls back to whichever one is
//! configured when the requested provider has no API key.

mod gemini;
mod groq;
mod mock;

pub use gemini::GeminiProvider;
pub use groq::GroqProvider;
pub use mock::MockProvider;

use crate::config::LlmConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Supported text-completion providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    Groq,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Gemini, ProviderKind::Groq];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::Groq => "groq",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| AppError::InvalidFormat {
                message: format!("unknown provider '{}'", s),
            })
    }
}

/// Sampling parameters sent with every completion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Trait for text completion
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Complete a single prompt
    async fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String>;

    /// Which provider this is
    fn kind(&self) -> ProviderKind;

    /// Get the model name
    fn model_name(&self) -> &str;

    /// Whether credentials are present
    fn is_configured(&self) -> bool;
}

/// Build the shared HTTP client used by provider implementations
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::Internal {
            message: format!("Failed to create HTTP client: {}", e),
        })
}

/// Read an error response body into a provider error
pub(crate) async fn provider_error(kind: ProviderKind, response: reqwest::Response) -> AppError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    AppError::Provider {
        provider: kind.to_string(),
        message: format!("API error {}: {}", status, body),
    }
}

/// Registered providers plus the default choice
pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, Arc<dyn CompletionProvider>>,
    default_provider: ProviderKind,
}

impl ProviderRegistry {
    pub fn new(default_provider: ProviderKind) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider,
        }
    }

    /// Register a provider, replacing any previous one of the same kind
    pub fn with_provider(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.providers.insert(provider.kind(), provider);
        self
    }

    pub fn default_provider(&self) -> ProviderKind {
        self.default_provider
    }

    pub fn get(&self, kind: ProviderKind) -> Option<Arc<dyn CompletionProvider>> {
        self.providers.get(&kind).cloned()
    }

    /// Registered and holding credentials
    pub fn is_available(&self, kind: ProviderKind) -> bool {
        self.providers
            .get(&kind)
            .is_some_and(|p| p.is_configured())
    }

    /// Pick the provider to serve a request
    ///
    /// The requested (or default) provider wins when available; otherwise the
    /// first other available provider is used. With nothing available the
    /// requested provider is returned unchanged and its calls will fail.
    pub fn resolve(&self, requested: Option<ProviderKind>) -> ProviderKind {
        let requested = requested.unwrap_or(self.default_provider);
        if self.is_available(requested) {
            return requested;
        }

        match ProviderKind::ALL
            .into_iter()
            .find(|kind| *kind != requested && self.is_available(*kind))
        {
            Some(fallback) => {
                info!(
                    requested = %requested,
                    fallback = %fallback,
                    "Requested provider not configured, falling back"
                );
                fallback
            }
            None => {
                warn!(requested = %requested, "No text-completion provider is configured");
                requested
            }
        }
    }

    /// Run one completion against `kind`, recording metrics
    pub async fn complete(
        &self,
        kind: ProviderKind,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String> {
        let provider = self.get(kind).ok_or_else(|| AppError::Configuration {
            message: format!("provider '{}' is not registered", kind),
        })?;

        let start = Instant::now();
        let result = provider.complete(prompt, params).await;
        let elapsed = start.elapsed().as_secs_f64();

        crate::metrics::record_provider(
            elapsed,
            kind.as_str(),
            provider.model_name(),
            result.is_ok(),
        );
        debug!(
            provider = %kind,
            model = provider.model_name(),
            prompt_chars = prompt.len(),
            elapsed_ms = (elapsed * 1000.0) as u64,
            ok = result.is_ok(),
            "Provider call finished"
        );

        result
    }
}

/// Create the provider registry from configuration
pub fn create_registry(config: &LlmConfig) -> Result<ProviderRegistry> {
    let timeout = Duration::from_secs(config.timeout_secs);

    let gemini = GeminiProvider::new(
        config.gemini.api_key.clone().filter(|_| config.gemini.has_api_key()),
        config.gemini.model.clone(),
        config.gemini.base_url.clone(),
        timeout,
    )?;
    let groq = GroqProvider::new(
        config.groq.api_key.clone().filter(|_| config.groq.has_api_key()),
        config.groq.model.clone(),
        config.groq.base_url.clone(),
        timeout,
    )?;

    info!(
        gemini = gemini.is_configured(),
        groq = groq.is_configured(),
        default = %config.default_provider,
        "Text-completion providers initialised"
    );

    Ok(ProviderRegistry::new(config.default_provider)
        .with_provider(Arc::new(gemini))
        .with_provider(Arc::new(groq)))
}
