//! The analysis interface: one system/user prompt pair in, raw model text out.
//!
//! Concrete backends live in [`crate::providers`]. The orchestrator only sees
//! `Arc<dyn AnalysisClient>`.

use crate::error::AnalysisError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// A hosted LLM completion service that returns raw text.
#[async_trait]
pub trait AnalysisClient: Send + Sync {
    /// Submit the prompt pair and return the model's raw response text.
    async fn analyze(&self, system_prompt: &str, user_prompt: &str)
    -> Result<String, AnalysisError>;

    /// Identifier recorded in `ResearchResult::model_identifier`.
    fn model_identifier(&self) -> String;
}

/// A prompt pair captured by [`MockAnalysisClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPrompt {
    pub system: String,
    pub user: String,
}

/// A mock analysis client for testing.
///
/// Returns queued responses in FIFO order; once the queue is empty every call
/// returns the fallback response, or an `ApiRequest` error if none is set.
pub struct MockAnalysisClient {
    model: String,
    responses: Mutex<VecDeque<Result<String, AnalysisError>>>,
    fallback: Option<String>,
    delay: Option<Duration>,
    prompts: Mutex<Vec<RecordedPrompt>>,
}

impl MockAnalysisClient {
    pub fn new() -> Self {
        Self {
            model: "mock-model".to_string(),
            responses: Mutex::new(VecDeque::new()),
            fallback: None,
            delay: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that always returns the given text.
    pub fn with_response(text: &str) -> Self {
        Self {
            fallback: Some(text.to_string()),
            ..Self::new()
        }
    }

    /// Sleep before answering, to exercise timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Override the reported model name.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Queue a successful response for the next call.
    pub fn queue_response(&self, text: &str) {
        if let Ok(mut q) = self.responses.lock() {
            q.push_back(Ok(text.to_string()));
        }
    }

    /// Queue an error for the next call.
    pub fn queue_error(&self, error: AnalysisError) {
        if let Ok(mut q) = self.responses.lock() {
            q.push_back(Err(error));
        }
    }

    /// Prompts received so far, in call order.
    pub fn recorded_prompts(&self) -> Vec<RecordedPrompt> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl Default for MockAnalysisClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalysisClient for MockAnalysisClient {
    async fn analyze(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, AnalysisError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(RecordedPrompt {
                system: system_prompt.to_string(),
                user: user_prompt.to_string(),
            });
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let queued = self.responses.lock().ok().and_then(|mut q| q.pop_front());
        match (queued, &self.fallback) {
            (Some(result), _) => result,
            (None, Some(text)) => Ok(text.clone()),
            (None, None) => Err(AnalysisError::ApiRequest {
                message: "MockAnalysisClient has no queued responses".to_string(),
            }),
        }
    }

    fn model_identifier(&self) -> String {
        self.model.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_returns_queue_then_fallback() {
        let mock = MockAnalysisClient::with_response("fallback");
        mock.queue_response("first");
        assert_eq!(mock.analyze("s", "u").await.unwrap(), "first");
        assert_eq!(mock.analyze("s", "u").await.unwrap(), "fallback");
        assert_eq!(mock.recorded_prompts().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_empty_queue_errors() {
        let mock = MockAnalysisClient::new();
        let err = mock.analyze("s", "u").await.unwrap_err();
        assert!(matches!(err, AnalysisError::ApiRequest { .. }));
    }

    #[tokio::test]
    async fn test_mock_queued_error() {
        let mock = MockAnalysisClient::with_response("ok");
        mock.queue_error(AnalysisError::AuthFailed {
            provider: "mock".into(),
        });
        assert!(matches!(
            mock.analyze("s", "u").await,
            Err(AnalysisError::AuthFailed { .. })
        ));
        assert_eq!(mock.analyze("s", "u").await.unwrap(), "ok");
    }

    #[test]
    fn test_mock_model_identifier() {
        let mock = MockAnalysisClient::new().with_model("gpt-test");
        assert_eq!(mock.model_identifier(), "gpt-test");
    }
}
