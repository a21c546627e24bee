//! Error types for the analyzer

use thiserror::Error;

/// Errors raised while building or analysing a trace graph
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyzerError {
    /// Invalid analysis configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A link endpoint is not in the artifact set
    #[error("Link {link_id} references unknown artifact {artifact_id}")]
    UnknownArtifact {
        /// Offending link
        link_id: String,
        /// Missing endpoint
        artifact_id: String,
    },
}
