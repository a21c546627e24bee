//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Artifact construction error
    #[error("Artifact error: {0}")]
    Domain(#[from] tracelink_domain::DomainError),

    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(#[from] tracelink_llm::LlmError),

    /// Similarity index error
    #[error("Index error: {0}")]
    Store(#[from] tracelink_store::StoreError),

    /// Text extraction setup error
    #[error("Extraction error: {0}")]
    Gatekeeper(#[from] tracelink_gatekeeper::GatekeeperError),

    /// Linking error
    #[error("Linking error: {0}")]
    Linker(#[from] tracelink_linker::LinkerError),

    /// Analysis error
    #[error("Analysis error: {0}")]
    Analyzer(#[from] tracelink_analyzer::AnalyzerError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}
