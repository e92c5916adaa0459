use super::{CompletionProvider, GenerationParams, ProviderKind};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Scripted provider for development and testing
///
/// Replies are consumed in order; once the script runs out the last reply is
/// repeated. Every prompt is recorded so callers can assert on it.
pub struct MockProvider {
    kind: ProviderKind,
    configured: bool,
    replies: Mutex<VecDeque<Result<String>>>,
    last_reply: Mutex<Option<String>>,
    prompts: Mutex<Vec<(String, GenerationParams)>>,
}

impl MockProvider {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            configured: true,
            replies: Mutex::new(VecDeque::new()),
            last_reply: Mutex::new(None),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn configured(mut self, configured: bool) -> Self {
        self.configured = configured;
        self
    }

    /// Queue a successful reply
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()));
        self
    }

    /// Queue a failed call
    pub fn fail(self, message: impl Into<String>) -> Self {
        let error = AppError::Provider {
            provider: self.kind.to_string(),
            message: message.into(),
        };
        self.push(Err(error));
        self
    }

    fn push(&self, reply: Result<String>) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
    }

    /// Prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.iter().map(|(prompt, _)| prompt.clone()).collect())
            .unwrap_or_default()
    }

    /// Generation parameters received so far
    pub fn params(&self) -> Vec<GenerationParams> {
        self.prompts
            .lock()
            .map(|p| p.iter().map(|(_, params)| *params).collect())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or_default()
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    async fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push((prompt.to_string(), *params));
        }

        let next = self.replies.lock().ok().and_then(|mut r| r.pop_front());
        match next {
            Some(Ok(text)) => {
                if let Ok(mut last) = self.last_reply.lock() {
                    *last = Some(text.clone());
                }
                Ok(text)
            }
            Some(Err(e)) => Err(e),
            None => self
                .last_reply
                .lock()
                .ok()
                .and_then(|last| last.clone())
                .ok_or_else(|| AppError::Provider {
                    provider: self.kind.to_string(),
                    message: "mock provider has no scripted reply".to_string(),
                }),
        }
    }

    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn model_name(&self) -> &str {
        "mock"
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}
