//! Configuration for LLM providers

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection and sampling settings for the LLM oracle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Use the LLM at all; when false linking is heuristic-only
    pub enabled: bool,

    /// Provider endpoint
    pub endpoint: String,

    /// Model name
    pub model: String,

    /// Sampling temperature
    pub temperature: f64,

    /// Maximum tokens to generate per call
    pub max_tokens: u32,

    /// HTTP request timeout (seconds)
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: crate::ollama::DEFAULT_ENDPOINT.to_string(),
            model: "llama3.1".to_string(),
            temperature: 0.1,
            max_tokens: 2000,
            request_timeout_secs: crate::ollama::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl LlmConfig {
    /// HTTP request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.endpoint.trim().is_empty() {
            return Err("endpoint must not be empty".to_string());
        }
        if self.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err("temperature must be within [0.0, 2.0]".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}
