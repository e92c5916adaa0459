//! Chat pipeline: extraction, query, store lookup and synthesis per message

use crate::config::ChatConfig;
use crate::context::conversation::ContextStore;
use crate::context::criteria::SearchCriteria;
use crate::context::extractor::CriteriaExtractor;
use crate::context::query_builder::QueryBuilder;
use crate::context::synthesizer::{ResponseSynthesizer, SynthesisOptions};
use crate::db::{Page, PropertyRecord, PropertyStore};
use crate::errors::{AppError, Result};
use crate::llm::{ProviderKind, ProviderRegistry};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

/// Result of handling one chat message
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatOutcome {
    pub response_text: String,
    pub criteria: SearchCriteria,
    /// Records returned by the store lookup
    pub match_count: usize,
    pub top_records: Vec<PropertyRecord>,
    pub session_id: String,
    pub provider_used: ProviderKind,
}

/// Sequences the pipeline stages for each incoming message
pub struct PipelineOrchestrator {
    providers: Arc<ProviderRegistry>,
    store: Arc<dyn PropertyStore>,
    extractor: CriteriaExtractor,
    synthesizer: ResponseSynthesizer,
    config: ChatConfig,
}

impl PipelineOrchestrator {
    pub fn new(
        providers: Arc<ProviderRegistry>,
        store: Arc<dyn PropertyStore>,
        context: Arc<ContextStore>,
        config: ChatConfig,
    ) -> Self {
        let options = SynthesisOptions {
            prompt_turns: config.prompt_turns,
            top_results: config.top_results,
        };
        Self {
            extractor: CriteriaExtractor::new(Arc::clone(&providers)),
            synthesizer: ResponseSynthesizer::new(Arc::clone(&providers), context, options),
            providers,
            store,
            config,
        }
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    pub fn store(&self) -> &Arc<dyn PropertyStore> {
        &self.store
    }

    fn validate(&self, message: &str) -> Result<()> {
        if message.trim().is_empty() {
            return Err(AppError::Validation {
                message: "Message is required".to_string(),
                field: Some("message".to_string()),
            });
        }
        if message.chars().count() > self.config.max_message_length {
            return Err(AppError::Validation {
                message: format!(
                    "Message exceeds {} characters",
                    self.config.max_message_length
                ),
                field: Some("message".to_string()),
            });
        }
        Ok(())
    }

    /// Handle one chat message
    ///
    /// Invalid input is rejected before any stage runs. Extraction and
    /// synthesis recover on their own; a store failure aborts the turn as
    /// `OperationFailed`.
    #[instrument(skip(self, message))]
    pub async fn handle(
        &self,
        message: &str,
        session_key: Option<&str>,
        provider: Option<ProviderKind>,
    ) -> Result<ChatOutcome> {
        self.validate(message)?;

        let start = Instant::now();
        let provider = self.providers.resolve(provider);
        let session_key = session_key.map(str::trim).filter(|k| !k.is_empty());

        let criteria = self.extractor.extract(message, provider).await;

        let filter = QueryBuilder::build(&criteria);
        debug!(filter = %filter.to_document(), "Built property filter");

        let results = match self
            .store
            .find(&filter, Page::first(self.config.search_limit))
            .await
        {
            Ok(results) => results,
            Err(e) => {
                error!(error = %e, backend = self.store.backend(), "Property lookup failed");
                crate::metrics::record_pipeline(
                    start.elapsed().as_secs_f64(),
                    provider.as_str(),
                    "failed",
                );
                return Err(AppError::operation_failed(&e));
            }
        };

        let response_text = self
            .synthesizer
            .synthesize(message, &results, &criteria, provider, session_key)
            .await;

        let session_id = session_key
            .map(str::to_string)
            .unwrap_or_else(|| format!("session_{}", Uuid::new_v4()));

        info!(
            provider = %provider,
            matches = results.len(),
            criteria_fields = filter.clause_count().saturating_sub(1),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Chat message handled"
        );
        crate::metrics::record_pipeline(start.elapsed().as_secs_f64(), provider.as_str(), "ok");

        let match_count = results.len();
        let top_records = results.into_iter().take(self.config.top_results).collect();

        Ok(ChatOutcome {
            response_text,
            criteria,
            match_count,
            top_records,
            session_id,
            provider_used: provider,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::synthesizer::FALLBACK_RESPONSE;
    use crate::db::{InMemoryStore, PropertyFilter, PropertyStatus};
    use crate::llm::MockProvider;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingStore {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PropertyStore for FailingStore {
        async fn find(&self, _: &PropertyFilter, _: Page) -> Result<Vec<PropertyRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::DatabaseConnection {
                message: "connection refused".to_string(),
            })
        }

        async fn count(&self, _: &PropertyFilter) -> Result<u64> {
            Ok(0)
        }

        async fn ping(&self) -> Result<()> {
            Ok(())
        }

        fn backend(&self) -> &'static str {
            "failing"
        }
    }

    fn listing(i: i64, location: &str, bedrooms: u32) -> PropertyRecord {
        PropertyRecord {
            id: Uuid::new_v4(),
            title: format!("Listing {}", i),
            description: String::new(),
            price: 4_000_000.0 + i as f64,
            location: location.to_string(),
            property_type: "Apartment".to_string(),
            status: PropertyStatus::Available,
            bedrooms,
            halls: 1,
            bathrooms: 1,
            area: Some(800.0),
            furnished: false,
            parking: true,
            balcony: true,
            features: vec![],
            images: vec![],
            contact_info: None,
            created_at: Utc::now() - Duration::minutes(i),
        }
    }

    fn orchestrator(
        mock: Arc<MockProvider>,
        store: Arc<dyn PropertyStore>,
    ) -> (PipelineOrchestrator, Arc<ContextStore>) {
        let providers = Arc::new(ProviderRegistry::new(ProviderKind::Groq).with_provider(mock));
        let context = Arc::new(ContextStore::default());
        let orchestrator = PipelineOrchestrator::new(
            providers,
            store,
            Arc::clone(&context),
            ChatConfig::default(),
        );
        (orchestrator, context)
    }

    #[tokio::test]
    async fn test_full_turn_against_memory_store() {
        let mut records: Vec<PropertyRecord> =
            (0..8).map(|i| listing(i, "Powai, Mumbai", 2)).collect();
        records.push(listing(9, "Pune", 2));
        records.push(listing(10, "Mumbai", 3));
        let store = Arc::new(InMemoryStore::with_records(records));

        let mock = Arc::new(
            MockProvider::new(ProviderKind::Groq)
                .reply(r#"{"location": "mumbai", "bedrooms": 2, "maxPrice": 5000000}"#)
                .reply("Here are 8 homes in Mumbai."),
        );
        let (orchestrator, context) = orchestrator(mock.clone(), store);

        let outcome = orchestrator
            .handle("2bhk in Mumbai under 50L", Some("abc"), None)
            .await
            .unwrap();

        assert_eq!(outcome.response_text, "Here are 8 homes in Mumbai.");
        assert_eq!(outcome.match_count, 8);
        assert_eq!(outcome.top_records.len(), 5);
        assert_eq!(outcome.top_records[0].title, "Listing 0");
        assert_eq!(outcome.session_id, "abc");
        assert_eq!(outcome.provider_used, ProviderKind::Groq);
        assert_eq!(mock.call_count(), 2);
        assert_eq!(context.history("abc").await.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_message_rejected_before_any_stage() {
        let mock = Arc::new(MockProvider::new(ProviderKind::Groq).reply("{}"));
        let store = Arc::new(FailingStore { calls: AtomicUsize::new(0) });
        let (orchestrator, _) = orchestrator(mock.clone(), store.clone());

        for message in ["", "   \n\t"] {
            let err = orchestrator.handle(message, None, None).await.unwrap_err();
            assert!(matches!(err, AppError::Validation { .. }));
        }
        assert_eq!(mock.call_count(), 0);
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_overlong_message_rejected() {
        let mock = Arc::new(MockProvider::new(ProviderKind::Groq).reply("{}"));
        let (orchestrator, _) = orchestrator(mock.clone(), Arc::new(InMemoryStore::new()));

        let message = "a".repeat(2001);
        let err = orchestrator.handle(&message, None, None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_skips_synthesis() {
        let mock = Arc::new(MockProvider::new(ProviderKind::Groq).reply(r#"{"type": "villa"}"#));
        let store = Arc::new(FailingStore { calls: AtomicUsize::new(0) });
        let (orchestrator, context) = orchestrator(mock.clone(), store.clone());

        let err = orchestrator
            .handle("villa in Goa", Some("s1"), None)
            .await
            .unwrap_err();

        match err {
            AppError::OperationFailed { details } => {
                assert!(details.unwrap().contains("connection refused"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
        // extraction only
        assert_eq!(mock.call_count(), 1);
        assert!(context.history("s1").await.is_empty());
    }

    #[tokio::test]
    async fn test_provider_failures_still_produce_outcome() {
        let mock = Arc::new(MockProvider::new(ProviderKind::Groq).fail("timeout"));
        let store = Arc::new(InMemoryStore::with_records(vec![listing(1, "Delhi", 1)]));
        let (orchestrator, _) = orchestrator(mock, store);

        let outcome = orchestrator.handle("anything", None, None).await.unwrap();
        assert!(outcome.criteria.is_empty());
        assert_eq!(outcome.match_count, 1);
        assert_eq!(outcome.response_text, FALLBACK_RESPONSE);
    }

    #[tokio::test]
    async fn test_generated_session_key_records_no_context() {
        let mock = Arc::new(MockProvider::new(ProviderKind::Groq).reply("{}"));
        let (orchestrator, context) = orchestrator(mock, Arc::new(InMemoryStore::new()));

        let outcome = orchestrator.handle("hello", None, None).await.unwrap();
        assert!(outcome.session_id.starts_with("session_"));
        assert_eq!(context.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_falls_back_to_configured_provider() {
        let gemini = Arc::new(MockProvider::new(ProviderKind::Gemini).reply("{}"));
        let groq = Arc::new(MockProvider::new(ProviderKind::Groq).configured(false));
        let providers = Arc::new(
            ProviderRegistry::new(ProviderKind::Groq)
                .with_provider(gemini.clone())
                .with_provider(groq.clone()),
        );
        let orchestrator = PipelineOrchestrator::new(
            providers,
            Arc::new(InMemoryStore::new()),
            Arc::new(ContextStore::default()),
            ChatConfig::default(),
        );

        let outcome = orchestrator
            .handle("hi", None, Some(ProviderKind::Groq))
            .await
            .unwrap();
        assert_eq!(outcome.provider_used, ProviderKind::Gemini);
        assert_eq!(gemini.call_count(), 2);
        assert_eq!(groq.call_count(), 0);
    }
}
