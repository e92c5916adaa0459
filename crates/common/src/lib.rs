//! PropPilot Common Library
//!
//! Shared code for the PropPilot services including:
//! - Property store models, filters and repositories
//! - Text-completion provider abstraction
//! - The conversational search pipeline
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod config;
pub mod context;
pub mod db;
pub mod errors;
pub mod llm;
pub mod metrics;

// Re-export commonly used types
pub use config::AppConfig;
pub use context::{ChatOutcome, ContextStore, PipelineOrchestrator, SearchCriteria};
pub use db::{PropertyRecord, PropertyStore};
pub use errors::{AppError, Result};
pub use llm::{CompletionProvider, ProviderKind, ProviderRegistry};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
