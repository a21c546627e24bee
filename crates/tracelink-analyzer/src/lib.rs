//! Tracelink Analyzer
//!
//! Graph, coverage and gap analysis over a link set.
//!
//! # Overview
//!
//! The analyzer rebuilds a [`TraceGraph`] from links, enumerates every
//! root-to-leaf chain below each system requirement, classifies those
//! chains against the fixed type hierarchy, and reports coverage, orphans
//! and severity-ranked gaps. A [`GapExplainer`] can attach LLM explanations
//! to the gaps afterwards.
//!
//! # Architecture
//!
//! ```text
//! Links → TraceGraph → ChainClassifier ─┐
//!                    → CoverageAnalyzer ─┼→ GapDetector → AnalysisReport → [GapExplainer]
//! ```
//!
//! # Example Usage
//!
//! ```
//! use tracelink_analyzer::{AnalysisConfig, TraceAnalyzer};
//! use tracelink_domain::{Artifact, ArtifactKind, ArtifactSet};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let artifacts = ArtifactSet::from_artifacts(vec![
//!     Artifact::new("SYS-001", ArtifactKind::SystemReq, "Prevent wheel skid")?,
//! ])?;
//!
//! let report = TraceAnalyzer::new(AnalysisConfig::default())?.analyze(&artifacts, &[])?;
//! assert_eq!(report.gap_summary.critical, 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod analyzer;
pub mod chains;
pub mod config;
pub mod coverage;
pub mod error;
pub mod gaps;
pub mod graph;
pub mod reasoning;
pub mod report;


pub use analyzer::TraceAnalyzer;
pub use chains::{enumerate_backward, enumerate_forward, ChainClassifier, ChainTally, ClassifiedChain};
pub use config::{AnalysisConfig, ConfidenceBand, ConfidenceBands};
pub use coverage::{CoverageAnalyzer, CoverageMetrics, KindCoverage, OrphanEntry, OrphanReport};
pub use error::AnalyzerError;
pub use gaps::GapDetector;
pub use graph::TraceGraph;
pub use reasoning::{GapExplainer, NearMiss, GAP_REASONING};
pub use report::{AnalysisReport, GapSummary, LinkQuality, LowLevelSection, QualityMetrics};

/// `part` as a percentage of `total` (0 when `total` is 0)
pub(crate) fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}
