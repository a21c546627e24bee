//! Tracelink Gatekeeper
//!
//! Scores candidate links and decides which ones are worth keeping.
//!
//! The Gatekeeper provides:
//! - Signal computation (keyword overlap, quantity match, variable name, id boost)
//! - Combined weighted scoring
//! - A two-tier quality gate that demands corroborating evidence
//! - Text signal extraction for artifacts ingested without it
//!
//! # Examples
//!
//! ```
//! use tracelink_domain::{Artifact, ArtifactKind};
//! use tracelink_gatekeeper::{QualityGate, QualityGateConfig, SignalScorer};
//!
//! let hlr = Artifact::new("HLR-001-A", ArtifactKind::Hlr, "Compute wheel slip ratio").unwrap();
//! let llr = Artifact::new("LLR-001-A-1", ArtifactKind::Llr, "Wheel slip ratio computed each frame").unwrap();
//!
//! let scorer = SignalScorer::default();
//! let signals = scorer.score(&hlr, &llr, 0.42, false);
//! let gate = QualityGate::new(QualityGateConfig::default());
//! assert!(gate.evaluate(&signals).is_accepted());
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod gate;
mod signals;
pub mod text;

pub use config::{IdBoostConfig, QualityGateConfig, ScoringWeights};
pub use error::GatekeeperError;
pub use gate::{GateDecision, QualityGate, RejectionReason};
pub use signals::{normalize_unit, SignalScorer};
pub use text::TextExtractor;
