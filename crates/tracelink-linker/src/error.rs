//! Error types for the linker

use thiserror::Error;
use tracelink_domain::DomainError;
use tracelink_gatekeeper::GatekeeperError;
use tracelink_llm::LlmError;

/// Errors that abort a linking run
///
/// Oracle failures are not among them: they degrade to heuristic
/// acceptance and are counted in the run statistics.
#[derive(Error, Debug)]
pub enum LinkerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid signal or gate configuration
    #[error(transparent)]
    Gatekeeper(#[from] GatekeeperError),

    /// A link could not be constructed
    #[error("Invalid link: {0}")]
    Domain(#[from] DomainError),

    /// A response repair pattern failed to compile
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

/// Why an adjudication produced no usable selection
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdjudicationError {
    /// The oracle call failed after retries
    #[error("Oracle call failed: {0}")]
    Oracle(#[from] LlmError),

    /// The response was not the expected JSON shape
    #[error("Malformed JSON: {0}")]
    MalformedJson(String),

    /// A confidence was not a finite number in [0, 1]
    #[error("Invalid confidence for {target_id}: {value}")]
    InvalidConfidence {
        /// Target the confidence was given for
        target_id: String,
        /// Raw value as received
        value: String,
    },

    /// A selected id is not among the submitted candidates
    #[error("Unknown target: {0}")]
    UnknownTarget(String),

    /// No selection passed validation and the confidence floor
    #[error("No accepted targets")]
    NoAcceptedTargets,
}

impl From<serde_json::Error> for AdjudicationError {
    fn from(e: serde_json::Error) -> Self {
        AdjudicationError::MalformedJson(e.to_string())
    }
}

/// Why an oracle split was discarded in favour of the atomic fallback
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecompositionError {
    /// The oracle call failed after retries
    #[error("Oracle call failed: {0}")]
    Oracle(#[from] LlmError),

    /// The response was not the expected JSON shape
    #[error("Malformed JSON: {0}")]
    MalformedJson(String),

    /// The response named no parts
    #[error("No sub-requirements returned")]
    Empty,

    /// A part has a blank text, a bad suffix, or repeats a suffix
    #[error("Invalid sub-requirement {suffix:?}: {reason}")]
    InvalidPart {
        /// Suffix as received
        suffix: String,
        /// What is wrong with it
        reason: String,
    },
}

impl From<serde_json::Error> for DecompositionError {
    fn from(e: serde_json::Error) -> Self {
        DecompositionError::MalformedJson(e.to_string())
    }
}

/// Why a source artifact produced no candidates at all
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CandidateError {
    /// The similarity oracle holds no embedding for the source
    #[error("No embedding for {0}")]
    MissingEmbedding(String),

    /// The similarity search failed
    #[error("Similarity search failed for {source_id}: {message}")]
    Search {
        /// Source artifact
        source_id: String,
        /// Oracle error text
        message: String,
    },
}
