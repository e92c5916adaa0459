//! Criteria extraction from free-text messages
//!
//! The provider is asked for a bare JSON object. Replies are often wrapped in
//! prose or code fences, so the span from the first `{` to the last `}` is
//! taken and parsed as-is. Malformed JSON is never repaired.

use crate::context::criteria::SearchCriteria;
use crate::llm::{GenerationParams, ProviderKind, ProviderRegistry};
use regex_lite::Regex;
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// Sampling used for extraction
pub const EXTRACTION_PARAMS: GenerationParams = GenerationParams {
    temperature: 0.1,
    max_tokens: 500,
};

/// Turns a user message into `SearchCriteria`
pub struct CriteriaExtractor {
    providers: Arc<ProviderRegistry>,
}

impl CriteriaExtractor {
    pub fn new(providers: Arc<ProviderRegistry>) -> Self {
        Self { providers }
    }

    /// Extract criteria; any failure yields empty criteria
    pub async fn extract(&self, message: &str, provider: ProviderKind) -> SearchCriteria {
        let prompt = build_prompt(message);

        let reply = match self
            .providers
            .complete(provider, &prompt, &EXTRACTION_PARAMS)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!(provider = %provider, error = %e, "Criteria extraction failed");
                crate::metrics::record_extraction(provider.as_str(), "failed");
                return SearchCriteria::default();
            }
        };

        match parse_reply(&reply) {
            Some(criteria) => {
                let outcome = if criteria.is_empty() { "empty" } else { "extracted" };
                crate::metrics::record_extraction(provider.as_str(), outcome);
                debug!(provider = %provider, ?criteria, "Extracted search criteria");
                criteria
            }
            None => {
                warn!(
                    provider = %provider,
                    reply_chars = reply.len(),
                    "Extraction reply held no parsable JSON object"
                );
                crate::metrics::record_extraction(provider.as_str(), "failed");
                SearchCriteria::default()
            }
        }
    }
}

fn json_span() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?s)\{.*\}").ok())
        .as_ref()
}

/// Parse a provider reply; `None` when no JSON object can be read from it
pub fn parse_reply(reply: &str) -> Option<SearchCriteria> {
    let span = json_span()?.find(reply)?;
    let value: Value = serde_json::from_str(span.as_str()).ok()?;
    value
        .is_object()
        .then(|| SearchCriteria::from_value(&value))
}

/// Extraction prompt with field rules and worked examples
pub fn build_prompt(message: &str) -> String {
    format!(
        r#"You are a property search assistant. Extract search criteria from this user message and return ONLY a valid JSON object.

User message: "{message}"

Extract these fields if mentioned (include only if explicitly stated or strongly implied):
- location: string (city, area, neighborhood, locality)
- type: string (apartment, house, villa, studio, penthouse, townhouse, condo, duplex)
- minPrice: number (minimum budget in your currency)
- maxPrice: number (maximum budget in your currency)
- bedrooms: number (number of bedrooms: 1, 2, 3, etc.)
- halls: number (number of halls/living rooms)
- bathrooms: number (number of bathrooms)
- status: string (available, sold, rented, pending)
- features: array of strings (parking, gym, pool, garden, security, etc.)
- furnished: boolean (if furnished/unfurnished is mentioned)
- parking: boolean (if parking is mentioned)
- balcony: boolean (if balcony is mentioned)
- minArea: number (minimum area in sq ft)
- maxArea: number (maximum area in sq ft)

Examples:
- "2 bedroom apartment in Mumbai under 50 lakhs" → {{"location": "Mumbai", "type": "apartment", "bedrooms": 2, "maxPrice": 5000000}}
- "furnished house with parking" → {{"furnished": true, "parking": true, "type": "house"}}
- "villa in Gurgaon" → {{"type": "villa", "location": "Gurgaon"}}

Return ONLY the JSON object, no other text:"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::criteria::PropertyType;
    use crate::llm::MockProvider;

    fn registry(mock: Arc<MockProvider>) -> Arc<ProviderRegistry> {
        Arc::new(ProviderRegistry::new(ProviderKind::Groq).with_provider(mock))
    }

    #[test]
    fn test_parse_fenced_reply() {
        let reply = "Sure! Here you go:\n```json\n{\"type\": \"villa\", \"location\": \"Gurgaon\"}\n```";
        let criteria = parse_reply(reply).unwrap();
        assert_eq!(criteria.property_type, Some(PropertyType::Villa));
        assert_eq!(criteria.location.as_deref(), Some("Gurgaon"));
    }

    #[test]
    fn test_parse_takes_first_to_last_brace() {
        // two objects: the combined span is not valid JSON
        assert!(parse_reply("{\"a\": 1} and {\"b\": 2}").is_none());
        assert!(parse_reply("no json here").is_none());
        assert!(parse_reply("{\"bedrooms\": 2,}").is_none());
    }

    #[test]
    fn test_prompt_embeds_message_and_examples() {
        let prompt = build_prompt("3 bhk in Pune");
        assert!(prompt.contains("User message: \"3 bhk in Pune\""));
        assert!(prompt.contains(r#"{"type": "villa", "location": "Gurgaon"}"#));
    }

    #[tokio::test]
    async fn test_extract_uses_low_temperature() {
        let mock = Arc::new(
            MockProvider::new(ProviderKind::Groq)
                .reply(r#"{"location": "Mumbai", "bedrooms": 2, "maxPrice": 5000000}"#),
        );
        let extractor = CriteriaExtractor::new(registry(mock.clone()));

        let criteria = extractor.extract("2bhk in Mumbai", ProviderKind::Groq).await;
        assert_eq!(criteria.bedrooms, Some(2));
        assert_eq!(mock.params(), vec![EXTRACTION_PARAMS]);
    }

    #[tokio::test]
    async fn test_extract_never_fails() {
        let mock = Arc::new(
            MockProvider::new(ProviderKind::Groq)
                .fail("connection reset")
                .reply("I could not understand that"),
        );
        let extractor = CriteriaExtractor::new(registry(mock));

        assert!(extractor.extract("hi", ProviderKind::Groq).await.is_empty());
        assert!(extractor.extract("hi", ProviderKind::Groq).await.is_empty());
        // unregistered provider
        assert!(extractor.extract("hi", ProviderKind::Gemini).await.is_empty());
    }
}
