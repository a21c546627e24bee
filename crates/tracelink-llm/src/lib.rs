//! Tracelink LLM Provider Layer
//!
//! LLM oracle clients and the generic rate-limited call wrapper used by the
//! link adjudicator and the gap explainer.
//!
//! # Architecture
//!
//! This crate provides implementations of the `LlmProvider` trait from
//! `tracelink-domain`. Callers own the provider instance and pass it to the
//! components that need it; nothing here is global.
//!
//! # Providers
//!
//! - `MockProvider`: Scripted provider for testing
//! - `OllamaProvider`: Local Ollama API integration
//!
//! # Examples
//!
//! ```
//! use tracelink_llm::MockProvider;
//! use tracelink_domain::traits::LlmProvider;
//!
//! let provider = MockProvider::new("{\"selected_targets\": []}");
//! let result = provider.generate("test prompt").unwrap();
//! assert_eq!(result, "{\"selected_targets\": []}");
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod ollama;
pub mod rate_limit;
pub mod tracker;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracelink_domain::traits::LlmProvider as LlmProviderTrait;

pub use config::LlmConfig;
pub use ollama::OllamaProvider;
pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use tracker::ApiCallTracker;

/// Provider handle shared between the components that call the oracle
pub type SharedProvider = Arc<dyn LlmProviderTrait<Error = LlmError> + Send + Sync>;

/// Call `provider` through `limiter` without blocking the async runtime
///
/// Providers are synchronous, so each attempt runs on the blocking pool.
/// With a `schema` the structured-output endpoint is used.
pub async fn generate_limited(
    limiter: &mut RateLimiter,
    provider: &SharedProvider,
    prompt: &str,
    schema: Option<&str>,
) -> Result<String, LlmError> {
    let prompt: Arc<str> = Arc::from(prompt);
    let schema: Option<Arc<str>> = schema.map(Arc::from);

    limiter
        .call_with_retry(|| {
            let provider = Arc::clone(provider);
            let prompt = Arc::clone(&prompt);
            let schema = schema.clone();
            async move {
                tokio::task::spawn_blocking(move || match schema {
                    Some(schema) => provider.generate_structured(&prompt, &schema),
                    None => provider.generate(&prompt),
                })
                .await
                .map_err(|e| LlmError::Other(format!("Oracle task failed: {}", e)))
                .and_then(|result| result)
            }
        })
        .await
}

/// Errors that can occur during LLM operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Request did not complete in time
    #[error("Request timed out")]
    Timeout,

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl LlmError {
    /// Whether retrying the same call may succeed
    ///
    /// Rate limits, timeouts and connection failures are transient; all
    /// other errors propagate without retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LlmError::Communication(_) | LlmError::Timeout | LlmError::RateLimitExceeded
        )
    }
}

/// Mock LLM provider for deterministic testing
///
/// Replies are resolved in order:
/// 1. the next entry of the scripted queue, if any;
/// 2. the first registered response whose key occurs in the prompt;
/// 3. the default response.
///
/// # Examples
///
/// ```
/// use tracelink_llm::{LlmError, MockProvider};
/// use tracelink_domain::traits::LlmProvider;
///
/// let mut provider = MockProvider::default();
/// provider.add_response("HLR-001", "first");
/// provider.enqueue_error(LlmError::RateLimitExceeded);
///
/// assert!(provider.generate("Source: HLR-001").is_err());
/// assert_eq!(provider.generate("Source: HLR-001").unwrap(), "first");
/// assert_eq!(provider.call_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    responses: Arc<Mutex<Vec<(String, Result<String, LlmError>)>>>,
    queue: Arc<Mutex<VecDeque<Result<String, LlmError>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(Vec::new())),
            queue: Arc::new(Mutex::new(VecDeque::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Reply with `response` to prompts containing `key`
    pub fn add_response(&mut self, key: impl Into<String>, response: impl Into<String>) {
        locked(&self.responses).push((key.into(), Ok(response.into())));
    }

    /// Fail prompts containing `key`
    pub fn add_error(&mut self, key: impl Into<String>, error: LlmError) {
        locked(&self.responses).push((key.into(), Err(error)));
    }

    /// Script the next reply regardless of prompt
    pub fn enqueue_response(&mut self, response: impl Into<String>) {
        locked(&self.queue).push_back(Ok(response.into()));
    }

    /// Script the next failure regardless of prompt
    pub fn enqueue_error(&mut self, error: LlmError) {
        locked(&self.queue).push_back(Err(error));
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        locked(&self.prompts).len()
    }

    /// Prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        locked(&self.prompts).clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl LlmProviderTrait for MockProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        locked(&self.prompts).push(prompt.to_string());

        if let Some(scripted) = locked(&self.queue).pop_front() {
            return scripted;
        }

        let responses = locked(&self.responses);
        if let Some((_, reply)) = responses.iter().find(|(key, _)| prompt.contains(key.as_str())) {
            return reply.clone();
        }

        Ok(self.default_response.clone())
    }

    fn generate_structured(&self, prompt: &str, _schema: &str) -> Result<String, Self::Error> {
        self.generate(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        assert_eq!(provider.generate("any prompt").unwrap(), "Test response");
    }

    #[test]
    fn test_mock_provider_keyed_responses() {
        let mut provider = MockProvider::default();
        provider.add_response("HLR-001", "one");
        provider.add_response("HLR-002", "two");

        assert_eq!(provider.generate("Source HLR-001 text").unwrap(), "one");
        assert_eq!(provider.generate("Source HLR-002 text").unwrap(), "two");
        assert_eq!(provider.generate("unknown").unwrap(), "Default mock response");
    }

    #[test]
    fn test_mock_provider_queue_takes_precedence() {
        let mut provider = MockProvider::new("default");
        provider.add_response("x", "keyed");
        provider.enqueue_error(LlmError::Timeout);
        provider.enqueue_response("scripted");

        assert_eq!(provider.generate("x").unwrap_err(), LlmError::Timeout);
        assert_eq!(provider.generate("x").unwrap(), "scripted");
        assert_eq!(provider.generate("x").unwrap(), "keyed");
    }

    #[test]
    fn test_mock_provider_call_history() {
        let provider = MockProvider::new("test");
        assert_eq!(provider.call_count(), 0);

        provider.generate("prompt1").unwrap();
        provider.generate("prompt2").unwrap();
        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.prompts(), vec!["prompt1", "prompt2"]);
    }

    #[test]
    fn test_mock_provider_error() {
        let mut provider = MockProvider::default();
        provider.add_error("bad", LlmError::ModelNotAvailable("m".into()));

        let result = provider.generate("a bad prompt");
        assert!(matches!(result, Err(LlmError::ModelNotAvailable(_))));
    }

    #[test]
    fn test_mock_provider_clone_shares_state() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.generate("test").unwrap();

        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
    }

    #[tokio::test]
    async fn test_generate_limited_retries_transient_errors() {
        let mut mock = MockProvider::new("ok");
        mock.enqueue_error(LlmError::RateLimitExceeded);
        let provider: SharedProvider = Arc::new(mock.clone());
        let mut limiter = RateLimiter::new(RateLimitConfig::unthrottled());

        let reply = generate_limited(&mut limiter, &provider, "prompt", Some("{}"))
            .await
            .unwrap();
        assert_eq!(reply, "ok");
        assert_eq!(mock.call_count(), 2);
        assert_eq!(limiter.retries(), 1);
    }

    #[tokio::test]
    async fn test_generate_limited_propagates_permanent_errors() {
        let mut mock = MockProvider::new("ok");
        mock.enqueue_error(LlmError::InvalidResponse("bad".into()));
        let provider: SharedProvider = Arc::new(mock.clone());
        let mut limiter = RateLimiter::new(RateLimitConfig::unthrottled());

        let err = generate_limited(&mut limiter, &provider, "prompt", None)
            .await
            .unwrap_err();
        assert_eq!(err, LlmError::InvalidResponse("bad".into()));
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn test_transient_classification() {
        assert!(LlmError::RateLimitExceeded.is_transient());
        assert!(LlmError::Timeout.is_transient());
        assert!(LlmError::Communication("reset".into()).is_transient());
        assert!(!LlmError::InvalidResponse("x".into()).is_transient());
        assert!(!LlmError::ModelNotAvailable("x".into()).is_transient());
        assert!(!LlmError::Other("x".into()).is_transient());
    }
}
