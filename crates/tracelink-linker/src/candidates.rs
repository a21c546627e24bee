//! Candidate generation for one source artifact

use crate::config::{Layer, LinkingConfig};
use crate::error::CandidateError;
use std::fmt::Display;
use tracelink_domain::traits::SimilarityOracle;
use tracelink_domain::{Artifact, ArtifactSet, SignalBreakdown};
use tracelink_gatekeeper::{GateDecision, QualityGate, SignalScorer};
use tracing::debug;

/// A scored target that cleared the quality gate
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Target artifact
    pub target_id: String,

    /// Combined score
    pub score: f64,

    /// Full signal breakdown
    pub signals: SignalBreakdown,
}

/// Candidates for one source, plus how many neighbours were scored
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateBatch {
    /// Accepted candidates, best first
    pub candidates: Vec<Candidate>,

    /// Neighbours of the target kind that were scored
    pub evaluated: usize,
}

/// Queries the similarity oracle and keeps gated, scored neighbours
pub struct CandidateGenerator<'a, O: SimilarityOracle> {
    oracle: &'a O,
    scorer: SignalScorer,
    gate: QualityGate,
    embedding_threshold: f32,
    top_k: usize,
    max_candidates: usize,
}

impl<'a, O> CandidateGenerator<'a, O>
where
    O: SimilarityOracle,
    O::Error: Display,
{
    /// Create a generator over `oracle`
    pub fn new(oracle: &'a O, config: &LinkingConfig) -> Self {
        Self {
            oracle,
            scorer: SignalScorer::new(config.weights.clone(), config.id_boost.clone()),
            gate: QualityGate::new(config.quality_gate.clone()),
            embedding_threshold: config.embedding_threshold as f32,
            top_k: config.top_k,
            max_candidates: config.max_candidates(),
        }
    }

    /// Candidates for `source` in one stage
    ///
    /// Neighbours of the wrong kind, the source itself, and ids absent from
    /// `artifacts` are dropped before scoring. A candidate is kept when the
    /// gate accepts it and its combined score reaches `floor`.
    pub fn generate(
        &self,
        source: &Artifact,
        layer: Layer,
        artifacts: &ArtifactSet,
        floor: f64,
    ) -> Result<CandidateBatch, CandidateError> {
        let query = self
            .oracle
            .embedding_of(&source.id)
            .ok_or_else(|| CandidateError::MissingEmbedding(source.id.clone()))?;

        let neighbours = self
            .oracle
            .search(query, self.top_k * 2, self.embedding_threshold)
            .map_err(|e| CandidateError::Search {
                source_id: source.id.clone(),
                message: e.to_string(),
            })?;

        let target_kind = layer.target_kind();
        let mut batch = CandidateBatch::default();

        for (target_id, similarity) in neighbours {
            if target_id == source.id {
                continue;
            }
            let target = match artifacts.get(&target_id) {
                Some(target) if target.kind == target_kind => target,
                _ => continue,
            };

            batch.evaluated += 1;
            let signals =
                self.scorer
                    .score(source, target, f64::from(similarity), layer.uses_name_signal());

            match self.gate.evaluate(&signals) {
                GateDecision::Rejected(reason) => {
                    debug!("Gate rejected {} -> {}: {:?}", source.id, target_id, reason);
                }
                _ if signals.combined_score < floor => {
                    debug!(
                        "{} -> {} below layer floor ({:.3} < {:.3})",
                        source.id, target_id, signals.combined_score, floor
                    );
                }
                _ => batch.candidates.push(Candidate {
                    target_id,
                    score: signals.combined_score,
                    signals,
                }),
            }
        }

        batch.candidates.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.target_id.cmp(&b.target_id))
        });
        batch.candidates.truncate(self.max_candidates);

        debug!(
            "{}: {} candidates from {} scored neighbours",
            source.id,
            batch.candidates.len(),
            batch.evaluated
        );
        Ok(batch)
    }
}
