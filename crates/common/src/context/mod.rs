//! Conversational search core
//!
//! The chat pipeline that sits between the HTTP layer and the providers:
//! - Criteria extraction from free text
//! - Criteria to store filter translation
//! - Bounded per-session conversation context
//! - Response synthesis
//! - Orchestration of the above per message

mod conversation;
mod criteria;
mod extractor;
mod pipeline;
mod query_builder;
mod synthesizer;

pub use conversation::{ContextStore, ConversationTurn, DEFAULT_MAX_TURNS};
pub use criteria::{PropertyType, SearchCriteria};
pub use extractor::{CriteriaExtractor, EXTRACTION_PARAMS};
pub use pipeline::{ChatOutcome, PipelineOrchestrator};
pub use query_builder::QueryBuilder;
pub use synthesizer::{ResponseSynthesizer, SynthesisOptions, FALLBACK_RESPONSE, SYNTHESIS_PARAMS};
