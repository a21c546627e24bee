//! Link and analysis orchestration shared by the commands.
//!
//! The similarity index and the LLM provider are built once here and
//! handed to the linker and the gap explainer.

use crate::config::Config;
use crate::error::{CliError, Result};
use std::sync::Arc;
use tracelink_analyzer::{AnalysisReport, GapExplainer, TraceAnalyzer, TraceGraph};
use tracelink_domain::{ArtifactSet, Link};
use tracelink_linker::{Adjudicator, Decomposer, DecompositionRun, LayerLinker, LinkRun};
use tracelink_llm::{OllamaProvider, SharedProvider};
use tracelink_store::embedding::HashingEmbeddingModel;
use tracelink_store::EmbeddingIndex;
use tracing::info;

/// Embedding width of the local hashing model.
pub const EMBEDDING_DIMENSION: usize = 384;

/// Similarity index used by the CLI.
pub type Index = EmbeddingIndex<HashingEmbeddingModel>;

/// Embed every artifact.
pub fn build_index(artifacts: &ArtifactSet) -> Result<Index> {
    let index = EmbeddingIndex::build(HashingEmbeddingModel::new(EMBEDDING_DIMENSION), artifacts)?;
    info!("Indexed {} artifacts", artifacts.len());
    Ok(index)
}

/// Configuration plus the optional LLM provider.
pub struct Pipeline {
    config: Config,
    provider: Option<SharedProvider>,
}

impl Pipeline {
    /// Connect to the configured provider when `[llm] enabled = true`.
    pub fn new(config: Config) -> Result<Self> {
        let provider: Option<SharedProvider> = if config.llm.enabled {
            let provider = OllamaProvider::new(&config.llm)?;
            info!("Using LLM model {} at {}", provider.model(), config.llm.endpoint);
            Some(Arc::new(provider) as SharedProvider)
        } else {
            None
        };
        Ok(Self { config, provider })
    }

    /// Use the given provider regardless of `[llm] enabled`.
    pub fn with_provider(config: Config, provider: SharedProvider) -> Self {
        Self {
            config,
            provider: Some(provider),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Give every undecomposed system requirement its decomposed parts.
    ///
    /// Complex requirements are split by the LLM when one is configured.
    pub async fn decompose(&self, artifacts: &mut ArtifactSet) -> Result<DecompositionRun> {
        let mut decomposer = Decomposer::new()?;
        if let Some(provider) = &self.provider {
            decomposer = decomposer.with_oracle(Arc::clone(provider), self.config.rate_limit.clone())?;
        }
        Ok(decomposer.decompose_all(artifacts).await?)
    }

    /// Run every linking stage.
    pub async fn link(&self, artifacts: &ArtifactSet, index: &Index) -> Result<LinkRun> {
        let mut linker = LayerLinker::new(index, self.config.linking.clone())?;
        if let Some(provider) = &self.provider {
            let adjudicator = Adjudicator::new(
                Arc::clone(provider),
                self.config.rate_limit.clone(),
                &self.config.linking,
            )?;
            linker = linker.with_adjudicator(adjudicator);
        }
        Ok(linker.establish_all_links(artifacts).await?)
    }

    /// Analyze a link set, optionally asking the LLM to explain each gap.
    pub async fn analyze(
        &self,
        artifacts: &ArtifactSet,
        links: &[Link],
        index: &Index,
        explain: bool,
    ) -> Result<AnalysisReport> {
        let analyzer = TraceAnalyzer::new(self.config.analysis.clone())?;
        let mut report = analyzer.analyze(artifacts, links)?;

        if explain {
            let provider = self.provider.as_ref().ok_or_else(|| {
                CliError::InvalidInput(
                    "--explain requires an LLM; set `enabled = true` under [llm]".to_string(),
                )
            })?;
            let mut explainer = GapExplainer::new(
                Arc::clone(provider),
                self.config.rate_limit.clone(),
                &self.config.analysis,
            )?;
            let graph = TraceGraph::from_links(links);
            explainer
                .explain_all(&mut report.gaps, artifacts, &graph, index)
                .await;
            info!("{}", explainer.tracker().summary());
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracelink_domain::{Artifact, ArtifactKind};
    use tracelink_llm::MockProvider;

    fn artifacts() -> ArtifactSet {
        let mut artifacts = ArtifactSet::from_artifacts(vec![
            Artifact::new("SYS-001", ArtifactKind::SystemReq, "Prevent wheel skid during landing").unwrap(),
            Artifact::new("SYS-002", ArtifactKind::SystemReq, "Report brake wear to maintenance").unwrap(),
            Artifact::new("HLR-001-A", ArtifactKind::Hlr, "Limit wheel slip ratio during landing").unwrap(),
        ])
        .unwrap();
        artifacts
            .add_decomposed_part("SYS-001", "A", "Limit wheel slip during landing")
            .unwrap();
        artifacts
    }

    #[tokio::test]
    async fn test_link_without_llm() {
        let artifacts = artifacts();
        let index = build_index(&artifacts).unwrap();
        let pipeline = Pipeline::new(Config::default()).unwrap();
        let run = pipeline.link(&artifacts, &index).await.unwrap();

        assert_eq!(run.stats.decomposition_links, 1);
        assert_eq!(run.api_calls.total_calls(), 0);
        assert!(run
            .links
            .iter()
            .all(|l| artifacts.contains(&l.source_id) && artifacts.contains(&l.target_id)));
    }

    #[tokio::test]
    async fn test_decompose_without_llm_keeps_requirements_whole() {
        let mut artifacts = artifacts();
        let pipeline = Pipeline::new(Config::default()).unwrap();
        let run = pipeline.decompose(&mut artifacts).await.unwrap();

        assert_eq!(run.stats.already_decomposed, 1);
        assert_eq!(run.stats.atomic, 1);
        assert_eq!(
            artifacts.get("SYS-002").unwrap().children,
            vec!["SYS-002-A".to_string()]
        );

        let index = build_index(&artifacts).unwrap();
        let linked = pipeline.link(&artifacts, &index).await.unwrap();
        assert_eq!(linked.stats.decomposition_links, 2);
    }

    #[tokio::test]
    async fn test_decompose_with_provider_splits_complex_requirement() {
        let mut artifacts = ArtifactSet::from_artifacts(vec![Artifact::new(
            "SYS-003",
            ArtifactKind::SystemReq,
            "The BCU shall limit wheel slip and report slip faults",
        )
        .unwrap()])
        .unwrap();
        let mut config = Config::default();
        config.rate_limit = tracelink_llm::RateLimitConfig::unthrottled();
        let provider = MockProvider::new(
            r#"{"sub_requirements": [
                {"suffix": "A", "text": "The BCU shall limit wheel slip"},
                {"suffix": "B", "text": "The BCU shall report slip faults"}
            ]}"#,
        );
        let pipeline = Pipeline::with_provider(config, Arc::new(provider.clone()));

        let run = pipeline.decompose(&mut artifacts).await.unwrap();

        assert_eq!(provider.call_count(), 1);
        assert_eq!(run.stats.split, 1);
        assert_eq!(run.api_calls.total_calls(), 1);
        assert_eq!(artifacts.get("SYS-003").unwrap().children.len(), 2);
    }

    #[tokio::test]
    async fn test_explain_requires_provider() {
        let artifacts = artifacts();
        let index = build_index(&artifacts).unwrap();
        let pipeline = Pipeline::new(Config::default()).unwrap();
        let result = pipeline.analyze(&artifacts, &[], &index, true).await;
        assert!(matches!(result, Err(CliError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_explain_with_provider() {
        let artifacts = artifacts();
        let index = build_index(&artifacts).unwrap();
        let mut config = Config::default();
        config.rate_limit = tracelink_llm::RateLimitConfig::unthrottled();
        let provider = MockProvider::new(
            r#"{"reasoning": "No decomposition was recorded", "root_cause": "missing_decomposition", "suggestions": ["Decompose the requirement"]}"#,
        );
        let pipeline = Pipeline::with_provider(config, Arc::new(provider.clone()));

        let report = pipeline.analyze(&artifacts, &[], &index, true).await.unwrap();
        assert!(!report.gaps.is_empty());
        assert_eq!(provider.call_count(), report.gaps.len());
        for gap in &report.gaps {
            let reasoning = gap.reasoning.as_ref().unwrap();
            assert_eq!(reasoning.root_cause, "missing_decomposition");
            assert_eq!(reasoning.suggestions, vec!["Decompose the requirement".to_string()]);
        }
    }
}
