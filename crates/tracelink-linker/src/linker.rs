//! The four-stage linking pipeline

use crate::adjudicator::{AcceptedTarget, Adjudicator};
use crate::candidates::{Candidate, CandidateGenerator};
use crate::config::{Layer, LinkingConfig};
use crate::error::LinkerError;
use crate::rationale::build_rationale;
use crate::stats::LinkingStats;
use std::fmt::Display;
use tracelink_domain::traits::SimilarityOracle;
use tracelink_domain::{Artifact, ArtifactKind, ArtifactSet, Link, LinkMethod, MatchDetails};
use tracelink_llm::ApiCallTracker;
use tracing::{debug, info, warn};

/// Result of a linking run
#[derive(Debug, Clone)]
pub struct LinkRun {
    /// Links in creation order
    pub links: Vec<Link>,

    /// Per-stage counters
    pub stats: LinkingStats,

    /// Oracle usage
    pub api_calls: ApiCallTracker,
}

/// Links artifacts one layer at a time
///
/// 1. `SYSTEM_REQ → SYSTEM_REQ_DECOMPOSED` from pre-populated children
/// 2. `SYSTEM_REQ_DECOMPOSED → HLR`
/// 3. `HLR → LLR`
/// 4. `LLR → CODE_VAR`
///
/// Stages 2 to 4 score oracle neighbours and, when an adjudicator is
/// attached, let the LLM choose among them.
pub struct LayerLinker<'a, O: SimilarityOracle> {
    generator: CandidateGenerator<'a, O>,
    config: LinkingConfig,
    adjudicator: Option<Adjudicator>,
}

impl<'a, O> LayerLinker<'a, O>
where
    O: SimilarityOracle,
    O::Error: Display,
{
    /// Create a heuristic-only linker
    pub fn new(oracle: &'a O, config: LinkingConfig) -> Result<Self, LinkerError> {
        config.validate()?;
        Ok(Self {
            generator: CandidateGenerator::new(oracle, &config),
            config,
            adjudicator: None,
        })
    }

    /// Attach an LLM adjudicator
    pub fn with_adjudicator(mut self, adjudicator: Adjudicator) -> Self {
        self.adjudicator = Some(adjudicator);
        self
    }

    /// Active configuration
    pub fn config(&self) -> &LinkingConfig {
        &self.config
    }

    /// Run all four stages
    pub async fn establish_all_links(
        &mut self,
        artifacts: &ArtifactSet,
    ) -> Result<LinkRun, LinkerError> {
        info!("Linking {} artifacts", artifacts.len());
        let mut stats = LinkingStats::new();

        let mut links = self.link_decomposition(artifacts);
        stats.record_decomposition(links.len());
        info!("Decomposition: {} links", links.len());

        for layer in Layer::ALL {
            let created = self.link_layer(layer, artifacts, &mut stats).await?;
            info!("{}: {} links", layer, created.len());
            links.extend(created);
        }

        let api_calls = self
            .adjudicator
            .as_ref()
            .map(|a| a.tracker().clone())
            .unwrap_or_default();

        info!("Linking complete: {} links", links.len());
        Ok(LinkRun {
            links,
            stats,
            api_calls,
        })
    }

    /// Deterministic `decomposes` links from each system requirement's children
    ///
    /// Children that are missing or of the wrong kind are skipped.
    pub fn link_decomposition(&self, artifacts: &ArtifactSet) -> Vec<Link> {
        let mut links = Vec::new();
        for parent in artifacts.of_kind(ArtifactKind::SystemReq) {
            for child_id in &parent.children {
                match artifacts.kind_of(child_id) {
                    Some(ArtifactKind::SystemReqDecomposed) => {
                        links.push(Link::decomposition(&parent.id, child_id));
                    }
                    Some(kind) => warn!(
                        "Skipping decomposition {} -> {}: child is {}",
                        parent.id, child_id, kind
                    ),
                    None => warn!(
                        "Skipping decomposition {} -> {}: no such artifact",
                        parent.id, child_id
                    ),
                }
            }
        }
        links
    }

    /// Run one oracle-assisted stage
    pub async fn link_layer(
        &mut self,
        layer: Layer,
        artifacts: &ArtifactSet,
        stats: &mut LinkingStats,
    ) -> Result<Vec<Link>, LinkerError> {
        let floor = self.config.candidate_floor(layer);
        let sources: Vec<&Artifact> = artifacts.of_kind(layer.source_kind()).collect();
        debug!(
            "{}: {} sources, candidate floor {:.3}",
            layer,
            sources.len(),
            floor
        );

        let mut links = Vec::new();
        for source in sources {
            let batch = match self.generator.generate(source, layer, artifacts, floor) {
                Ok(batch) => batch,
                Err(e) => {
                    warn!("Skipping {}: {}", source.id, e);
                    stats.record_skip(layer);
                    continue;
                }
            };
            stats.record_source(layer, batch.evaluated, batch.candidates.len());
            if batch.candidates.is_empty() {
                continue;
            }

            let created = self
                .decide(layer, source, batch.candidates, artifacts, stats)
                .await?;
            stats.record_links(layer, created.len());
            links.extend(created);
        }
        Ok(links)
    }

    /// Turn one source's candidates into links
    async fn decide(
        &mut self,
        layer: Layer,
        source: &Artifact,
        candidates: Vec<Candidate>,
        artifacts: &ArtifactSet,
        stats: &mut LinkingStats,
    ) -> Result<Vec<Link>, LinkerError> {
        let adjudicator = match self.adjudicator.as_mut() {
            Some(adjudicator) if candidates.len() > 1 => adjudicator,
            _ => {
                return candidates
                    .into_iter()
                    .map(|c| heuristic_link(layer, &source.id, c, None))
                    .collect();
            }
        };

        match adjudicator.adjudicate(source, &candidates, artifacts).await {
            Ok(accepted) => {
                stats.record_oracle_call(layer, false);
                accepted
                    .into_iter()
                    .map(|a| adjudicated_link(layer, &source.id, a))
                    .collect()
            }
            Err(e) => {
                warn!(
                    "Adjudication failed for {}: {}. Accepting top {} candidates",
                    source.id, e, self.config.fallback_top_n
                );
                stats.record_oracle_call(layer, true);
                let reason = format!("oracle unavailable ({})", e);
                candidates
                    .into_iter()
                    .take(self.config.fallback_top_n)
                    .map(|c| heuristic_link(layer, &source.id, c, Some(reason.clone())))
                    .collect()
            }
        }
    }
}

fn heuristic_link(
    layer: Layer,
    source_id: &str,
    candidate: Candidate,
    fallback_reason: Option<String>,
) -> Result<Link, LinkerError> {
    let details = MatchDetails {
        method: LinkMethod::MultiSignal,
        signals: Some(candidate.signals),
        oracle: None,
        fallback_reason,
    };
    let rationale = build_rationale(source_id, &candidate.target_id, layer.link_type(), &details);
    Ok(Link::new(
        source_id,
        candidate.target_id,
        layer.link_type(),
        candidate.score,
        details,
        rationale,
    )?)
}

fn adjudicated_link(
    layer: Layer,
    source_id: &str,
    accepted: AcceptedTarget,
) -> Result<Link, LinkerError> {
    let confidence = accepted.verdict.confidence;
    let details = MatchDetails {
        method: LinkMethod::MultiSignalLlm,
        signals: Some(accepted.candidate.signals),
        oracle: Some(accepted.verdict),
        fallback_reason: None,
    };
    let rationale = build_rationale(
        source_id,
        &accepted.candidate.target_id,
        layer.link_type(),
        &details,
    );
    Ok(Link::new(
        source_id,
        accepted.candidate.target_id,
        layer.link_type(),
        confidence,
        details,
        rationale,
    )?)
}
