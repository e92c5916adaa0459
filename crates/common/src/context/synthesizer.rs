//! Response Synthesizer - Turns search results into a conversational reply
//!
//! Provides:
//! - No-results prompts that suggest how to relax the search
//! - Results prompts built from a compact projection of the top listings
//! - Recent-turn context injection for sessions
//! - A fixed apology when the provider cannot answer

use crate::context::conversation::{ContextStore, ConversationTurn};
use crate::context::criteria::SearchCriteria;
use crate::db::{PropertyRecord, PropertyStatus};
use crate::llm::{GenerationParams, ProviderKind, ProviderRegistry};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Reply used whenever synthesis fails
pub const FALLBACK_RESPONSE: &str = "I'm sorry, I'm having trouble processing your request right now. Please try again or contact our support team.";

/// Sampling used for synthesis
pub const SYNTHESIS_PARAMS: GenerationParams = GenerationParams {
    temperature: 0.7,
    max_tokens: 1000,
};

/// Synthesis options
#[derive(Debug, Clone)]
pub struct SynthesisOptions {
    /// Prior turns injected into the prompt
    pub prompt_turns: usize,

    /// Listings shown to the provider
    pub top_results: usize,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            prompt_turns: 3,
            top_results: 5,
        }
    }
}

/// Listing fields shown to the provider
#[derive(Debug, Serialize)]
struct ListingSummary<'a> {
    id: Uuid,
    title: &'a str,
    price: f64,
    location: &'a str,
    #[serde(rename = "type")]
    property_type: &'a str,
    bedrooms: u32,
    halls: u32,
    bathrooms: u32,
    area: Option<f64>,
    features: &'a [String],
    furnished: bool,
    parking: bool,
    status: PropertyStatus,
}

impl<'a> From<&'a PropertyRecord> for ListingSummary<'a> {
    fn from(record: &'a PropertyRecord) -> Self {
        Self {
            id: record.id,
            title: &record.title,
            price: record.price,
            location: &record.location,
            property_type: &record.property_type,
            bedrooms: record.bedrooms,
            halls: record.halls,
            bathrooms: record.bathrooms,
            area: record.area,
            features: &record.features,
            furnished: record.furnished,
            parking: record.parking,
            status: record.status,
        }
    }
}

/// Synthesizer for chat replies
pub struct ResponseSynthesizer {
    providers: Arc<ProviderRegistry>,
    context: Arc<ContextStore>,
    options: SynthesisOptions,
}

impl ResponseSynthesizer {
    pub fn new(
        providers: Arc<ProviderRegistry>,
        context: Arc<ContextStore>,
        options: SynthesisOptions,
    ) -> Self {
        Self {
            providers,
            context,
            options,
        }
    }

    /// Produce the reply text; never fails
    ///
    /// With a session key, recent turns are injected into the prompt and the
    /// new turn is recorded once the provider has answered. Failed turns are
    /// not recorded.
    pub async fn synthesize(
        &self,
        message: &str,
        results: &[PropertyRecord],
        criteria: &SearchCriteria,
        provider: ProviderKind,
        session_key: Option<&str>,
    ) -> String {
        let history = match session_key {
            Some(key) => self.context.recent(key, self.options.prompt_turns).await,
            None => Vec::new(),
        };
        let prompt = self.build_prompt(message, results, criteria, &history);

        match self
            .providers
            .complete(provider, &prompt, &SYNTHESIS_PARAMS)
            .await
        {
            Ok(response) => {
                if let Some(key) = session_key {
                    self.context
                        .append(key, ConversationTurn::new(message, response.as_str()))
                        .await;
                }
                let outcome = if results.is_empty() { "no_results" } else { "results" };
                crate::metrics::record_synthesis(provider.as_str(), outcome);
                debug!(
                    provider = %provider,
                    results = results.len(),
                    context_turns = history.len(),
                    "Response synthesized"
                );
                response
            }
            Err(e) => {
                warn!(provider = %provider, error = %e, "Response synthesis failed");
                crate::metrics::record_synthesis(provider.as_str(), "fallback");
                FALLBACK_RESPONSE.to_string()
            }
        }
    }

    /// Build the synthesis prompt
    fn build_prompt(
        &self,
        message: &str,
        results: &[PropertyRecord],
        criteria: &SearchCriteria,
        history: &[ConversationTurn],
    ) -> String {
        let mut prompt = context_prefix(history);
        let criteria_json = serde_json::to_string(criteria).unwrap_or_else(|_| "{}".to_string());

        if results.is_empty() {
            prompt.push_str(&format!(
                r#"Current user message: "{message}"
Search criteria extracted: {criteria_json}

No properties were found matching the user's criteria. As a helpful property assistant, provide a conversational response that:

1. Acknowledges their specific request
2. Explains why no results were found (be specific about the criteria)
3. Suggests practical alternatives:
   - Adjusting budget range
   - Considering nearby locations
   - Looking at different property types
   - Modifying room requirements
4. Ask what they'd like to adjust in their search
5. Keep the tone friendly and helpful

Make it conversational, not robotic."#
            ));
            return prompt;
        }

        let top: Vec<ListingSummary<'_>> = results
            .iter()
            .take(self.options.top_results)
            .map(ListingSummary::from)
            .collect();
        let listings = serde_json::to_string_pretty(&top).unwrap_or_else(|_| "[]".to_string());

        prompt.push_str(&format!(
            r#"Current user message: "{message}"
Search criteria: {criteria_json}

Found {count} matching properties. Here are the top results:
{listings}

As a professional property consultant, provide a response that:

1. Acknowledges their request naturally
2. Summarizes the search results (mention total count)
3. Highlight 2-3 most relevant properties with key details:
   - Title, price, location
   - Bedrooms, bathrooms, area if available
   - Notable features
4. Mention why these properties match their criteria
5. Ask if they want:
   - More details about specific properties
   - To see more options
   - To refine their search
   - Contact information for any property

Keep the response conversational, helpful, and professional. Use Indian Rupees format for prices (₹)."#,
            count = results.len(),
        ));
        prompt
    }
}

fn context_prefix(history: &[ConversationTurn]) -> String {
    if history.is_empty() {
        return String::new();
    }

    let mut prefix = String::from("Previous conversation:\n");
    for turn in history {
        prefix.push_str(&format!(
            "User: {}\nAssistant: {}\n",
            turn.user_message, turn.response
        ));
    }
    prefix.push('\n');
    prefix
}
