//! Brain module: LLM provider abstraction.
//!
//! Defines the `LlmProvider` trait for model-agnostic chat completions and a
//! `MockLlmProvider` used as a synthetic model in tests and dry runs.

use crate::error::LlmError;
use crate::types::{CompletionRequest, CompletionResponse, Message, TokenUsage};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Trait for LLM providers.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Perform a full completion and return the response.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Return the model name.
    fn model_name(&self) -> &str;

    /// Return the context window size for this provider/model.
    fn context_window(&self) -> usize {
        128_000
    }
}

type Responder = dyn Fn(&CompletionRequest) -> Result<String, LlmError> + Send + Sync;

/// A mock LLM provider for testing.
///
/// Answers from a FIFO queue of canned results, or from a responder closure
/// when one is installed. The closure form is order-independent, which makes
/// it the right choice for concurrent callers.
pub struct MockLlmProvider {
    model: String,
    responses: Mutex<Vec<Result<CompletionResponse, LlmError>>>,
    responder: Option<Box<Responder>>,
    requests: Mutex<Vec<CompletionRequest>>,
    calls: AtomicUsize,
    context_window: usize,
}

impl MockLlmProvider {
    pub fn new() -> Self {
        Self {
            model: "mock-model".to_string(),
            responses: Mutex::new(Vec::new()),
            responder: None,
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            context_window: 128_000,
        }
    }

    /// Override the reported model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the reported context window.
    pub fn with_context_window(mut self, tokens: usize) -> Self {
        self.context_window = tokens;
        self
    }

    /// Create a MockLlmProvider that always returns the given text.
    pub fn with_response(text: &str) -> Self {
        let owned = text.to_string();
        Self::with_responder(move |_| Ok(owned.clone()))
    }

    /// Create a MockLlmProvider whose replies are computed from each request.
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&CompletionRequest) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        Self {
            responder: Some(Box::new(responder)),
            ..Self::new()
        }
    }

    /// Queue a response to be returned by the next `complete` call.
    pub fn queue_response(&self, response: CompletionResponse) {
        self.lock_responses().push(Ok(response));
    }

    /// Queue a plain text reply.
    pub fn queue_text(&self, text: &str) {
        self.queue_response(Self::text_response(text));
    }

    /// Queue an error to be returned by the next `complete` call.
    pub fn queue_error(&self, error: LlmError) {
        self.lock_responses().push(Err(error));
    }

    /// Create a simple text response for testing.
    pub fn text_response(text: &str) -> CompletionResponse {
        CompletionResponse {
            message: Message::assistant(text),
            usage: TokenUsage {
                input_tokens: 100,
                output_tokens: 50,
            },
            model: "mock-model".to_string(),
            finish_reason: Some("stop".to_string()),
        }
    }

    /// Number of `complete` calls received so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn lock_responses(
        &self,
    ) -> std::sync::MutexGuard<'_, Vec<Result<CompletionResponse, LlmError>>> {
        self.responses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MockLlmProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());

        if let Some(responder) = &self.responder {
            return responder(&request).map(|text| Self::text_response(&text));
        }

        let mut responses = self.lock_responses();
        if responses.is_empty() {
            Ok(MockLlmProvider::text_response(
                "I'm a mock LLM. No queued responses available.",
            ))
        } else {
            responses.remove(0)
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn context_window(&self) -> usize {
        self.context_window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_queue_is_fifo() {
        let provider = MockLlmProvider::new();
        provider.queue_text("first");
        provider.queue_text("second");

        let a = provider.complete(CompletionRequest::default()).await.unwrap();
        let b = provider.complete(CompletionRequest::default()).await.unwrap();
        assert_eq!(a.text(), "first");
        assert_eq!(b.text(), "second");
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_fallback_when_queue_empty() {
        let provider = MockLlmProvider::new();
        let resp = provider.complete(CompletionRequest::default()).await.unwrap();
        assert!(resp.text().contains("No queued responses"));
    }

    #[tokio::test]
    async fn test_mock_queued_error() {
        let provider = MockLlmProvider::new();
        provider.queue_error(LlmError::Connection {
            message: "reset by peer".into(),
        });
        let err = provider
            .complete(CompletionRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Connection { .. }));
    }

    #[tokio::test]
    async fn test_mock_responder_sees_request() {
        let provider = MockLlmProvider::with_responder(|req| {
            Ok(req
                .messages
                .last()
                .map(|m| m.content.to_uppercase())
                .unwrap_or_default())
        });
        let req = CompletionRequest::from_messages(vec![Message::user("echo")]);
        let resp = provider.complete(req).await.unwrap();
        assert_eq!(resp.text(), "ECHO");
        assert_eq!(provider.requests().len(), 1);
    }

    #[test]
    fn test_mock_model_name() {
        let provider = MockLlmProvider::new().with_model("judge-model");
        assert_eq!(provider.model_name(), "judge-model");
    }

    #[test]
    fn test_mock_context_window() {
        assert_eq!(MockLlmProvider::new().context_window(), 128_000);
        let provider = MockLlmProvider::new().with_context_window(4_096);
        assert_eq!(provider.context_window(), 4_096);
    }
}
