//! Tracelink Linker
//!
//! Establishes trace links between adjacent layers of the requirement
//! hierarchy.
//!
//! # Overview
//!
//! Undecomposed system requirements are first split into atomic parts.
//! Linking then runs one layer at a time. System requirements are linked to
//! their decomposed parts deterministically; each lower layer is linked by
//! scoring similarity-oracle neighbours with independent text signals,
//! gating them, and optionally letting an LLM adjudicator choose among the
//! survivors.
//!
//! # Architecture
//!
//! ```text
//! SYSTEM_REQ → Decomposer → SYSTEM_REQ_DECOMPOSED parts
//! Artifact → SimilarityOracle → CandidateGenerator → [Adjudicator] → Links
//!                                 (SignalScorer + QualityGate)
//! ```
//!
//! # Key Features
//!
//! - **Decomposition**: complexity heuristic, LLM split, single-part fallback
//! - **Multi-signal scoring**: embedding, keyword, quantity, variable name, id hierarchy
//! - **Quality gating**: one strong signal or several corroborating ones
//! - **LLM adjudication**: rate-limited, validated, with heuristic fallback
//! - **Run statistics**: per-layer counters and oracle usage
//!
//! # Example Usage
//!
//! ```no_run
//! use tracelink_domain::{Artifact, ArtifactKind, ArtifactSet};
//! use tracelink_linker::{LayerLinker, LinkingConfig};
//! use tracelink_store::EmbeddingIndex;
//! use tracelink_store::embedding::HashingEmbeddingModel;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let artifacts = ArtifactSet::from_artifacts(vec![
//!     Artifact::new("HLR-001", ArtifactKind::Hlr, "Monitor brake pressure")?,
//!     Artifact::new("LLR-001", ArtifactKind::Llr, "Sample brake pressure at 100 Hz")?,
//! ])?;
//! let oracle = EmbeddingIndex::build(HashingEmbeddingModel::new(384), &artifacts)?;
//!
//! let mut linker = LayerLinker::new(&oracle, LinkingConfig::default())?;
//! let run = linker.establish_all_links(&artifacts).await?;
//!
//! println!("{}", run.stats.summary());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod adjudicator;
pub mod candidates;
pub mod config;
pub mod decomposer;
pub mod error;
pub mod linker;
pub mod parser;
pub mod prompt;
pub mod rationale;
pub mod stats;

#[cfg(test)]
mod tests;

pub use adjudicator::{AcceptedTarget, Adjudicator, LINK_SELECTION};
pub use candidates::{Candidate, CandidateBatch, CandidateGenerator};
pub use config::{Layer, LayerThresholds, LinkingConfig};
pub use decomposer::{Decomposer, DecompositionRun, DecompositionStats, DECOMPOSITION};
pub use error::{AdjudicationError, CandidateError, DecompositionError, LinkerError};
pub use linker::{LayerLinker, LinkRun};
pub use stats::{LayerStats, LinkingStats};
