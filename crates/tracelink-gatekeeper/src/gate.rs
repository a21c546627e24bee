//! Two-tier candidate quality gate
//!
//! A candidate passes outright on one unambiguously strong text signal.
//! Otherwise it needs several independent moderate signals to agree, since
//! a single weak similarity hit between short technical sentences is
//! usually noise.

use crate::QualityGateConfig;
use tracelink_domain::SignalBreakdown;

/// Outcome of gating one candidate
#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    /// Accepted on a strong signal
    StrongPass {
        /// Which strong rule fired
        rule: &'static str,
    },

    /// Accepted on corroborating moderate signals
    ModeratePass {
        /// Moderate signals present
        signals: Vec<&'static str>,
    },

    /// Rejected
    Rejected(RejectionReason),
}

impl GateDecision {
    /// Whether the candidate may be kept
    pub fn is_accepted(&self) -> bool {
        !matches!(self, GateDecision::Rejected(_))
    }
}

/// Reasons for rejection
#[derive(Debug, Clone, PartialEq)]
pub enum RejectionReason {
    /// Combined score under the floor
    BelowScoreFloor {
        /// Candidate's combined score
        score: f64,
        /// Configured floor
        floor: f64,
    },

    /// Not enough moderate signals
    InsufficientEvidence {
        /// Moderate signals present
        present: Vec<&'static str>,
        /// Moderate signals required
        required: usize,
    },
}

/// Applies the quality policy to scored candidates
#[derive(Debug, Clone, Default)]
pub struct QualityGate {
    config: QualityGateConfig,
}

impl QualityGate {
    /// Create a gate with the given configuration
    pub fn new(config: QualityGateConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &QualityGateConfig {
        &self.config
    }

    /// Evaluate a candidate's signals
    pub fn evaluate(&self, signals: &SignalBreakdown) -> GateDecision {
        let c = &self.config;

        if signals.combined_score < c.min_combined_score {
            return GateDecision::Rejected(RejectionReason::BelowScoreFloor {
                score: signals.combined_score,
                floor: c.min_combined_score,
            });
        }

        if signals.keyword_score > c.strong_keyword {
            return GateDecision::StrongPass { rule: "keyword" };
        }
        if signals.embedding_similarity > c.strong_embedding {
            return GateDecision::StrongPass { rule: "embedding" };
        }
        if signals.embedding_similarity > c.combined_embedding
            && signals.keyword_score > c.combined_keyword
        {
            return GateDecision::StrongPass {
                rule: "embedding+keyword",
            };
        }

        let present = self.moderate_signals(signals);
        if present.len() >= c.min_moderate_signals {
            GateDecision::ModeratePass { signals: present }
        } else {
            GateDecision::Rejected(RejectionReason::InsufficientEvidence {
                present,
                required: c.min_moderate_signals,
            })
        }
    }

    /// Names of the moderate signals a candidate shows
    pub fn moderate_signals(&self, signals: &SignalBreakdown) -> Vec<&'static str> {
        let c = &self.config;
        let checks = [
            ("embedding", signals.embedding_similarity > c.moderate_embedding),
            ("keyword", signals.keyword_score > c.moderate_keyword),
            ("quantity", signals.quantity_match),
            ("name", signals.name_score > c.moderate_name),
            ("id_boost", signals.id_boost > c.moderate_id_boost),
        ];
        checks
            .into_iter()
            .filter(|(_, present)| *present)
            .map(|(name, _)| name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(embedding: f64, keyword: f64, combined: f64) -> SignalBreakdown {
        SignalBreakdown {
            embedding_similarity: embedding,
            keyword_score: keyword,
            combined_score: combined,
            ..SignalBreakdown::default()
        }
    }

    #[test]
    fn test_strong_keyword_pass() {
        let gate = QualityGate::default();
        assert_eq!(
            gate.evaluate(&signals(0.0, 0.25, 0.1)),
            GateDecision::StrongPass { rule: "keyword" }
        );
    }

    #[test]
    fn test_strong_embedding_pass() {
        let gate = QualityGate::default();
        assert_eq!(
            gate.evaluate(&signals(0.31, 0.0, 0.14)),
            GateDecision::StrongPass { rule: "embedding" }
        );
    }

    #[test]
    fn test_combined_strong_pass() {
        let gate = QualityGate::default();
        assert_eq!(
            gate.evaluate(&signals(0.21, 0.13, 0.13)),
            GateDecision::StrongPass {
                rule: "embedding+keyword"
            }
        );
    }

    #[test]
    fn test_moderate_pass_needs_two_signals() {
        let gate = QualityGate::default();

        let single = signals(0.15, 0.0, 0.07);
        assert!(matches!(
            gate.evaluate(&single),
            GateDecision::Rejected(RejectionReason::InsufficientEvidence { required: 2, .. })
        ));

        let mut corroborated = single.clone();
        corroborated.quantity_match = true;
        corroborated.combined_score = 0.22;
        assert_eq!(
            gate.evaluate(&corroborated),
            GateDecision::ModeratePass {
                signals: vec!["embedding", "quantity"]
            }
        );
    }

    #[test]
    fn test_id_boost_counts_as_moderate_signal() {
        let gate = QualityGate::default();
        let mut s = signals(0.13, 0.0, 0.36);
        s.id_boost = 0.3;
        assert!(gate.evaluate(&s).is_accepted());
    }

    #[test]
    fn test_score_floor_rejects_first() {
        let gate = QualityGate::default();
        assert!(matches!(
            gate.evaluate(&signals(0.0, 0.9, 0.01)),
            GateDecision::Rejected(RejectionReason::BelowScoreFloor { .. })
        ));
    }

    #[test]
    fn test_permissive_accepts_single_signal() {
        let gate = QualityGate::new(QualityGateConfig::permissive());
        assert!(gate.evaluate(&signals(0.15, 0.0, 0.07)).is_accepted());
    }

    #[test]
    fn test_thresholds_are_strict_inequalities() {
        let gate = QualityGate::default();
        // Exactly at the strong thresholds does not pass on its own
        let at = signals(0.30, 0.20, 0.19);
        assert_eq!(
            gate.evaluate(&at),
            GateDecision::StrongPass {
                rule: "embedding+keyword"
            }
        );
        let at_embedding_only = signals(0.30, 0.0, 0.135);
        assert!(matches!(
            gate.evaluate(&at_embedding_only),
            GateDecision::Rejected(_)
        ));
    }
}
