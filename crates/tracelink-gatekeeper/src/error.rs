//! Gatekeeper error types

use thiserror::Error;

/// Errors that can occur during gatekeeper operations
#[derive(Error, Debug)]
pub enum GatekeeperError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Extraction pattern failed to compile
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),
}
