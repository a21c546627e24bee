//! Domain error types

use std::fmt;

/// Errors raised when a domain record violates its construction invariants
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Artifact identifier is empty or blank
    EmptyId,

    /// Artifact text is empty or blank
    EmptyText {
        /// Identifier of the offending artifact
        id: String,
    },

    /// Unknown artifact type string
    UnknownKind(String),

    /// Two artifacts share one identifier
    DuplicateId(String),

    /// Referenced artifact does not exist
    UnknownArtifact(String),

    /// Operation requires an artifact of a different kind
    WrongKind {
        /// Identifier of the offending artifact
        id: String,
        /// Kind the operation expected
        expected: String,
        /// Kind the artifact actually has
        actual: String,
    },

    /// Confidence outside [0.0, 1.0] or not finite
    InvalidConfidence(f64),

    /// Stored link status disagrees with the status its confidence implies
    StatusMismatch {
        /// Identifier of the offending link
        id: String,
        /// Confidence recorded on the link
        confidence: f64,
    },
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::EmptyId => write!(f, "artifact id must not be empty"),
            DomainError::EmptyText { id } => write!(f, "artifact {} has empty text", id),
            DomainError::UnknownKind(kind) => write!(f, "unknown artifact type: {}", kind),
            DomainError::DuplicateId(id) => write!(f, "duplicate artifact id: {}", id),
            DomainError::UnknownArtifact(id) => write!(f, "unknown artifact: {}", id),
            DomainError::WrongKind { id, expected, actual } => write!(
                f,
                "artifact {} has type {}, expected {}",
                id, actual, expected
            ),
            DomainError::InvalidConfidence(value) => {
                write!(f, "confidence {} is outside [0.0, 1.0]", value)
            }
            DomainError::StatusMismatch { id, confidence } => write!(
                f,
                "link {} has a status inconsistent with confidence {}",
                id, confidence
            ),
        }
    }
}

impl std::error::Error for DomainError {}
