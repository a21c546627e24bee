//! Tracelink Domain Layer
//!
//! This crate contains the core model of the traceability system: the typed
//! records every other layer exchanges, the pure identifier lookups, and the
//! trait interfaces for the collaborators the linking engine consumes.
//!
//! ## Key Concepts
//!
//! - **Artifact**: A requirement or implementation variable at one layer of
//!   the hierarchy (`SYSTEM_REQ → SYSTEM_REQ_DECOMPOSED → HLR → LLR → CODE_VAR`)
//! - **Link**: A directed, confidence-scored relationship between two artifacts
//! - **Gap**: A detected traceability defect with an assigned severity
//! - **Id hierarchy**: Parent references implied by structured identifiers
//!
//! ## Architecture
//!
//! - Minimal external dependencies (uuid for link ids, serde for records)
//! - Pure business logic only
//! - Oracle implementations (similarity, LLM) live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod artifact;
pub mod error;
pub mod gap;
pub mod id_hierarchy;
pub mod link;
pub mod traits;

// Re-exports for convenience
pub use artifact::{Artifact, ArtifactKind, ArtifactSet, ExtractedSignals, Quantity, QuantityValue};
pub use error::DomainError;
pub use gap::{ChainClass, Gap, GapKind, GapReasoning, GapSubject, Severity};
pub use id_hierarchy::IdHierarchy;
pub use link::{Link, LinkMethod, LinkStatus, LinkType, MatchDetails, OracleVerdict, SignalBreakdown};
