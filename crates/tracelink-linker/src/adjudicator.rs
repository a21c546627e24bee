//! LLM adjudication of candidate links

use crate::candidates::Candidate;
use crate::config::LinkingConfig;
use crate::error::{AdjudicationError, LinkerError};
use crate::parser::{ResponseRepair, Selection};
use crate::prompt::{SelectionPrompt, RESPONSE_SCHEMA};
use tracelink_domain::{Artifact, ArtifactSet, OracleVerdict};
use tracelink_llm::{generate_limited, ApiCallTracker, RateLimitConfig, RateLimiter, SharedProvider};
use tracing::{debug, warn};

/// Purpose label for link selection calls
pub const LINK_SELECTION: &str = "link_selection";

/// A candidate the oracle accepted
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedTarget {
    /// The generator's candidate
    pub candidate: Candidate,

    /// The oracle's verdict on it
    pub verdict: OracleVerdict,
}

/// Submits ranked candidates to the LLM oracle and validates its choice
pub struct Adjudicator {
    provider: SharedProvider,
    limiter: RateLimiter,
    tracker: ApiCallTracker,
    repair: ResponseRepair,
    max_candidates: usize,
    confidence_floor: f64,
}

impl Adjudicator {
    /// Create an adjudicator over a shared provider
    pub fn new(
        provider: SharedProvider,
        rate_limit: RateLimitConfig,
        config: &LinkingConfig,
    ) -> Result<Self, LinkerError> {
        rate_limit.validate().map_err(LinkerError::Config)?;
        Ok(Self {
            provider,
            limiter: RateLimiter::new(rate_limit),
            tracker: ApiCallTracker::new(),
            repair: ResponseRepair::new()?,
            max_candidates: config.llm_max_candidates,
            confidence_floor: config.llm_confidence_floor,
        })
    }

    /// Oracle usage so far
    pub fn tracker(&self) -> &ApiCallTracker {
        &self.tracker
    }

    /// Ask the oracle which of `candidates` implement `source`
    ///
    /// Only the best `llm_max_candidates` are submitted. A selection is
    /// kept when it names a submitted candidate and its confidence reaches
    /// the floor; if none is kept the result is
    /// [`AdjudicationError::NoAcceptedTargets`].
    pub async fn adjudicate(
        &mut self,
        source: &Artifact,
        candidates: &[Candidate],
        artifacts: &ArtifactSet,
    ) -> Result<Vec<AcceptedTarget>, AdjudicationError> {
        let submitted = &candidates[..candidates.len().min(self.max_candidates)];
        let prompt = SelectionPrompt::new(source, submitted, artifacts).build();

        let response =
            match generate_limited(&mut self.limiter, &self.provider, &prompt, Some(RESPONSE_SCHEMA))
                .await
            {
                Ok(response) => {
                    self.tracker
                        .record_call(LINK_SELECTION, prompt.len(), response.len());
                    response
                }
                Err(e) => {
                    self.tracker.record_failure(LINK_SELECTION, prompt.len());
                    return Err(e.into());
                }
            };

        let selection = self.repair.parse(&response)?;
        self.validate(&source.id, selection, submitted)
    }

    fn validate(
        &self,
        source_id: &str,
        selection: Selection,
        submitted: &[Candidate],
    ) -> Result<Vec<AcceptedTarget>, AdjudicationError> {
        let mut accepted: Vec<AcceptedTarget> = Vec::new();

        for selected in selection.selected {
            let candidate = match submitted.iter().find(|c| c.target_id == selected.target_id) {
                Some(candidate) => candidate,
                None => {
                    warn!(
                        "{}: {}",
                        source_id,
                        AdjudicationError::UnknownTarget(selected.target_id)
                    );
                    continue;
                }
            };
            if selected.confidence < self.confidence_floor {
                debug!(
                    "{} -> {} below oracle confidence floor ({:.2})",
                    source_id, selected.target_id, selected.confidence
                );
                continue;
            }
            if accepted.iter().any(|a| a.candidate.target_id == selected.target_id) {
                continue;
            }
            accepted.push(AcceptedTarget {
                candidate: candidate.clone(),
                verdict: OracleVerdict {
                    confidence: selected.confidence,
                    reasoning: selected.reasoning,
                },
            });
        }

        if accepted.is_empty() {
            return Err(AdjudicationError::NoAcceptedTargets);
        }
        debug!(
            "{}: oracle accepted {} of {} candidates ({} rejected explicitly)",
            source_id,
            accepted.len(),
            submitted.len(),
            selection.rejected.len()
        );
        Ok(accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tracelink_domain::{ArtifactKind, SignalBreakdown};
    use tracelink_llm::{LlmError, MockProvider};

    fn artifacts() -> ArtifactSet {
        ArtifactSet::from_artifacts(vec![
            Artifact::new("HLR-001", ArtifactKind::Hlr, "Monitor brake pressure").unwrap(),
            Artifact::new("LLR-001", ArtifactKind::Llr, "Sample brake pressure").unwrap(),
            Artifact::new("LLR-002", ArtifactKind::Llr, "Filter brake pressure").unwrap(),
        ])
        .unwrap()
    }

    fn candidate(id: &str, score: f64) -> Candidate {
        Candidate {
            target_id: id.to_string(),
            score,
            signals: SignalBreakdown {
                combined_score: score,
                ..SignalBreakdown::default()
            },
        }
    }

    fn adjudicator(mock: &MockProvider) -> Adjudicator {
        let provider: SharedProvider = Arc::new(mock.clone());
        Adjudicator::new(provider, RateLimitConfig::unthrottled(), &LinkingConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_accepts_selection_above_floor() {
        let mock = MockProvider::new(
            r#"{"selected_targets": [
                {"target_id": "LLR-001", "reasoning": "samples the pressure", "confidence": 0.9},
                {"target_id": "LLR-002", "reasoning": "weak", "confidence": 0.4}
            ]}"#,
        );
        let mut adjudicator = adjudicator(&mock);
        let artifacts = artifacts();
        let source = artifacts.get("HLR-001").unwrap();

        let accepted = adjudicator
            .adjudicate(source, &[candidate("LLR-001", 0.5), candidate("LLR-002", 0.4)], &artifacts)
            .await
            .unwrap();

        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].candidate.target_id, "LLR-001");
        assert_eq!(accepted[0].verdict.confidence, 0.9);
        assert_eq!(accepted[0].verdict.reasoning, "samples the pressure");
        assert_eq!(adjudicator.tracker().total_calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_target_is_dropped() {
        let mock = MockProvider::new(
            r#"{"selected_targets": [{"target_id": "LLR-999", "reasoning": "?", "confidence": 0.95}]}"#,
        );
        let mut adjudicator = adjudicator(&mock);
        let artifacts = artifacts();
        let source = artifacts.get("HLR-001").unwrap();

        let result = adjudicator
            .adjudicate(source, &[candidate("LLR-001", 0.5), candidate("LLR-002", 0.4)], &artifacts)
            .await;
        assert_eq!(result.unwrap_err(), AdjudicationError::NoAcceptedTargets);
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let mock = MockProvider::new("I think LLR-001 is best.");
        let mut adjudicator = adjudicator(&mock);
        let artifacts = artifacts();
        let source = artifacts.get("HLR-001").unwrap();

        let result = adjudicator
            .adjudicate(source, &[candidate("LLR-001", 0.5), candidate("LLR-002", 0.4)], &artifacts)
            .await;
        assert!(matches!(result, Err(AdjudicationError::MalformedJson(_))));
    }

    #[tokio::test]
    async fn test_oracle_failure_is_recorded() {
        let mut mock = MockProvider::default();
        mock.add_error("HLR-001", LlmError::ModelNotAvailable("llama".into()));
        let mut adjudicator = adjudicator(&mock);
        let artifacts = artifacts();
        let source = artifacts.get("HLR-001").unwrap();

        let result = adjudicator
            .adjudicate(source, &[candidate("LLR-001", 0.5), candidate("LLR-002", 0.4)], &artifacts)
            .await;
        assert!(matches!(result, Err(AdjudicationError::Oracle(LlmError::ModelNotAvailable(_)))));
        assert_eq!(adjudicator.tracker().total_failures(), 1);
    }

    #[tokio::test]
    async fn test_only_top_candidates_are_submitted() {
        let mock = MockProvider::new(r#"{"selected_targets": []}"#);
        let config = LinkingConfig {
            llm_max_candidates: 1,
            ..LinkingConfig::default()
        };
        let provider: SharedProvider = Arc::new(mock.clone());
        let mut adjudicator =
            Adjudicator::new(provider, RateLimitConfig::unthrottled(), &config).unwrap();
        let artifacts = artifacts();
        let source = artifacts.get("HLR-001").unwrap();

        let result = adjudicator
            .adjudicate(source, &[candidate("LLR-001", 0.5), candidate("LLR-002", 0.4)], &artifacts)
            .await;

        assert_eq!(result.unwrap_err(), AdjudicationError::NoAcceptedTargets);
        let prompt = &mock.prompts()[0];
        assert!(prompt.contains("1. LLR-001"));
        assert!(!prompt.contains("LLR-002"));
    }

    #[test]
    fn test_invalid_rate_limit_is_rejected() {
        let provider: SharedProvider = Arc::new(MockProvider::default());
        let rate_limit = RateLimitConfig {
            max_retries: 0,
            ..RateLimitConfig::unthrottled()
        };
        assert!(matches!(
            Adjudicator::new(provider, rate_limit, &LinkingConfig::default()),
            Err(LinkerError::Config(_))
        ));
    }
}
