//! Ollama Provider Implementation
//!
//! Provides integration with Ollama's local LLM API.
//!
//! # Features
//!
//! - Async HTTP communication with Ollama API
//! - Configurable endpoint, model and sampling options
//! - JSON mode for structured replies (`generate_structured`)
//! - Error classification so the rate limiter can retry transient failures
//!
//! Retries are not performed here; wrap calls in
//! [`RateLimiter`](crate::RateLimiter).
//!
//! # Examples
//!
//! ```no_run
//! use tracelink_llm::{LlmConfig, OllamaProvider};
//!
//! let provider = OllamaProvider::new(&LlmConfig::default()).unwrap();
//! ```

use crate::config::LlmConfig;
use crate::LlmError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::runtime::{Handle, Runtime};
use tracelink_domain::traits::LlmProvider as LlmProviderTrait;
use tracing::debug;

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default timeout for LLM requests (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Ollama API provider for local LLM inference
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
    client: reqwest::Client,
    executor: Executor,
}

/// Where the blocking trait methods drive the async client
enum Executor {
    /// Runtime that was current at construction
    Shared(Handle),
    /// Private runtime for callers outside tokio
    Owned(Runtime),
}

impl Executor {
    fn block_on<F: Future>(&self, future: F) -> F::Output {
        match self {
            Executor::Shared(handle) => handle.block_on(future),
            Executor::Owned(runtime) => runtime.block_on(future),
        }
    }
}

/// Request body for Ollama generate API
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f64,
    num_predict: u32,
}

/// Response from Ollama generate API
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// The blocking [`LlmProvider`](LlmProviderTrait) methods run on the
    /// tokio runtime current at construction; they must then be called from
    /// a blocking context such as `tokio::task::spawn_blocking`. Outside a
    /// runtime the provider builds its own.
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| LlmError::Other(format!("Failed to build HTTP client: {}", e)))?;

        let executor = match Handle::try_current() {
            Ok(handle) => Executor::Shared(handle),
            Err(_) => Executor::Owned(
                tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .map_err(|e| LlmError::Other(format!("Failed to start runtime: {}", e)))?,
            ),
        };

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client,
            executor,
        })
    }

    /// Model this provider talks to
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate text using Ollama API
    ///
    /// # Errors
    ///
    /// - `RateLimitExceeded` on HTTP 429
    /// - `ModelNotAvailable` on HTTP 404
    /// - `Timeout` when the request times out
    /// - `Communication` on connection failures and server errors
    /// - `InvalidResponse` when the body cannot be decoded
    pub async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.request(prompt, None).await
    }

    async fn request(&self, prompt: &str, format: Option<&str>) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.endpoint);

        let request_body = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            format,
            options: OllamaOptions {
                temperature: self.temperature,
                num_predict: self.max_tokens,
            },
        };

        debug!("POST {} ({} prompt chars)", url, prompt.len());

        let response = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimitExceeded);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmError::ModelNotAvailable(self.model.clone()));
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = format!("HTTP {}: {}", status, error_text);
            return Err(if status.is_server_error() {
                LlmError::Communication(message)
            } else {
                LlmError::Other(message)
            });
        }

        let body = response
            .json::<OllamaGenerateResponse>()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
        Ok(body.response)
    }
}

fn classify_transport_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::Communication(format!("Request failed: {}", e))
    }
}

impl LlmProviderTrait for OllamaProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        self.executor.block_on(self.request(prompt, None))
    }

    fn generate_structured(&self, prompt: &str, _schema: &str) -> Result<String, Self::Error> {
        // Ollama's JSON mode constrains syntax only; the schema is in the prompt
        self.executor.block_on(self.request(prompt, Some("json")))
    }
}
