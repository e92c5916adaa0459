//! Configuration management for PropPilot services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/{APP_ENV}.toml)
//! - Default values

use crate::llm::ProviderKind;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Property store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Text-completion provider configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Chat pipeline tuning
    #[serde(default)]
    pub chat: ChatConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Deployment environment; diagnostics are exposed only in `development`.
    /// Defaults to `production`.
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Backend: postgres or memory
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// Database URL (postgres backend only)
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Run embedded migrations on startup
    #[serde(default = "default_enabled")]
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Provider used when a request does not name one
    #[serde(default = "default_provider")]
    pub default_provider: ProviderKind,

    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub gemini: ProviderConfig,

    #[serde(default)]
    pub groq: ProviderConfig,
}

impl LlmConfig {
    /// Fill missing API keys from the plain `GEMINI_API_KEY` / `GROQ_API_KEY` variables
    fn apply_key_fallbacks(&mut self) {
        if !self.gemini.has_api_key() {
            self.gemini.api_key = std::env::var("GEMINI_API_KEY").ok();
        }
        if !self.groq.has_api_key() {
            self.groq.api_key = std::env::var("GROQ_API_KEY").ok();
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// API key; the provider counts as unconfigured without one
    pub api_key: Option<String>,

    /// Model override
    pub model: Option<String>,

    /// API base URL override
    pub base_url: Option<String>,
}

impl ProviderConfig {
    /// Whether an API key has been supplied
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatConfig {
    /// Turns retained per session
    #[serde(default = "default_context_turns")]
    pub context_turns: usize,

    /// Turns injected into the synthesis prompt
    #[serde(default = "default_prompt_turns")]
    pub prompt_turns: usize,

    /// Maximum records fetched per chat message
    #[serde(default = "default_search_limit")]
    pub search_limit: u64,

    /// Records shown to the provider and returned to the caller
    #[serde(default = "default_top_results")]
    pub top_results: usize,

    /// Maximum message length in characters
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error) or a full EnvFilter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Expose Prometheus metrics on /metrics
    #[serde(default = "default_enabled")]
    pub metrics_enabled: bool,

    /// Service name attached to the startup span and log lines
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 3000 }
fn default_environment() -> String { "production".to_string() }
fn default_request_timeout() -> u64 { 60 }
fn default_store_backend() -> String { "postgres".to_string() }
fn default_database_url() -> String { "postgres://localhost/properties".to_string() }
fn default_max_connections() -> u32 { 20 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 10 }
fn default_provider() -> ProviderKind { ProviderKind::Groq }
fn default_llm_timeout() -> u64 { 30 }
fn default_context_turns() -> usize { 10 }
fn default_prompt_turns() -> usize { 3 }
fn default_search_limit() -> u64 { 20 }
fn default_top_results() -> usize { 5 }
fn default_max_message_length() -> usize { 2000 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_service_name() -> String { "proppilot".to_string() }
fn default_enabled() -> bool { true }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        // An unset APP_ENV never exposes diagnostics
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| default_environment());

        let config = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", i64::from(default_port()))?
            .set_default("server.environment", env.as_str())?
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // e.g., APP__LLM__GROQ__API_KEY=gsk_...
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut app: AppConfig = config.try_deserialize()?;
        app.llm.apply_key_fallbacks();
        Ok(app)
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Whether diagnostic error details may be returned to callers
    pub fn expose_error_details(&self) -> bool {
        self.server.environment.eq_ignore_ascii_case("development")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            url: default_database_url(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            run_migrations: default_enabled(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            timeout_secs: default_llm_timeout(),
            gemini: ProviderConfig::default(),
            groq: ProviderConfig::default(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            context_turns: default_context_turns(),
            prompt_turns: default_prompt_turns(),
            search_limit: default_search_limit(),
            top_results: default_top_results(),
            max_message_length: default_max_message_length(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_enabled: default_enabled(),
            service_name: default_service_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.llm.default_provider, ProviderKind::Groq);
        assert!(config.llm.groq.model.is_none());
        assert_eq!(config.chat.context_turns, 10);
        assert_eq!(config.chat.prompt_turns, 3);
        assert_eq!(config.chat.search_limit, 20);
        assert_eq!(config.chat.top_results, 5);
    }

    #[test]
    fn test_blank_api_key_is_unconfigured() {
        let mut provider = ProviderConfig::default();
        assert!(!provider.has_api_key());
        provider.api_key = Some("   ".to_string());
        assert!(!provider.has_api_key());
        provider.api_key = Some("key".to_string());
        assert!(provider.has_api_key());
    }

    #[test]
    fn test_default_config_hides_error_details() {
        let config = AppConfig::default();
        assert_eq!(config.server.environment, "production");
        assert!(!config.expose_error_details());
    }

    #[test]
    fn test_error_details_only_in_development() {
        let mut config = AppConfig::default();
        config.server.environment = "development".to_string();
        assert!(config.expose_error_details());
        config.server.environment = "production".to_string();
        assert!(!config.expose_error_details());
    }
}
