//! Pipeline tests for the LayerLinker

#[cfg(test)]
mod tests {
    use crate::{Adjudicator, Layer, LayerLinker, LinkingConfig};
    use std::sync::Arc;
    use tracelink_domain::{Artifact, ArtifactKind, ArtifactSet, Link, LinkMethod, LinkType};
    use tracelink_llm::{LlmError, MockProvider, RateLimitConfig, SharedProvider};
    use tracelink_store::InMemoryOracle;

    fn artifacts(with_second_llr: bool) -> ArtifactSet {
        let mut artifacts = ArtifactSet::from_artifacts(vec![
            Artifact::new("SYS-001", ArtifactKind::SystemReq, "Prevent wheel skid during landing")
                .unwrap(),
            Artifact::new("HLR-001-A", ArtifactKind::Hlr, "Limit wheel slip during braking").unwrap(),
            Artifact::new("HLR-002", ArtifactKind::Hlr, "Transmit status on the data bus").unwrap(),
            Artifact::new("LLR-001-A-1", ArtifactKind::Llr, "Compute wheel slip ratio at 100 Hz")
                .unwrap(),
            Artifact::new("VAR-007", ArtifactKind::CodeVar, "Wheel slip ratio")
                .unwrap()
                .with_name("wheel_slip_ratio"),
        ])
        .unwrap();
        artifacts
            .add_decomposed_part("SYS-001", "A", "Limit wheel slip during landing")
            .unwrap();
        if with_second_llr {
            artifacts
                .insert(
                    Artifact::new("LLR-002", ArtifactKind::Llr, "Filter wheel speed samples").unwrap(),
                )
                .unwrap();
        }
        artifacts
    }

    fn oracle(with_second_llr: bool) -> InMemoryOracle {
        let oracle = InMemoryOracle::new()
            .with("SYS-001-A", vec![1.0, 0.0, 0.0])
            .with("HLR-001-A", vec![0.9, 0.436, 0.0])
            .with("HLR-002", vec![0.0, 0.0, 1.0])
            .with("LLR-001-A-1", vec![0.8, 0.6, 0.0])
            .with("VAR-007", vec![0.7, 0.714, 0.0]);
        if with_second_llr {
            oracle.with("LLR-002", vec![0.85, 0.527, 0.0])
        } else {
            oracle
        }
    }

    fn adjudicator(mock: &MockProvider) -> Adjudicator {
        let provider: SharedProvider = Arc::new(mock.clone());
        Adjudicator::new(provider, RateLimitConfig::unthrottled(), &LinkingConfig::default()).unwrap()
    }

    fn find<'a>(links: &'a [Link], source: &str, target: &str) -> Option<&'a Link> {
        links
            .iter()
            .find(|l| l.source_id == source && l.target_id == target)
    }

    #[tokio::test]
    async fn test_heuristic_pipeline_links_every_layer() {
        let artifacts = artifacts(false);
        let oracle = oracle(false);
        let mut linker = LayerLinker::new(&oracle, LinkingConfig::default()).unwrap();

        let run = linker.establish_all_links(&artifacts).await.unwrap();

        assert_eq!(run.links.len(), 4);
        let decomposition = find(&run.links, "SYS-001", "SYS-001-A").unwrap();
        assert_eq!(decomposition.link_type, LinkType::Decomposes);
        assert_eq!(decomposition.confidence, 1.0);

        let hlr = find(&run.links, "SYS-001-A", "HLR-001-A").unwrap();
        assert_eq!(hlr.link_type, LinkType::Implements);
        assert_eq!(hlr.match_details.method, LinkMethod::MultiSignal);
        assert!(hlr.confidence >= LinkingConfig::default().candidate_floor(Layer::DecomposedToHlr));
        assert!(hlr.rationale.starts_with("HLR-001-A implements SYS-001-A."));

        assert!(find(&run.links, "HLR-001-A", "LLR-001-A-1").is_some());
        let var = find(&run.links, "LLR-001-A-1", "VAR-007").unwrap();
        assert_eq!(var.link_type, LinkType::References);
        let signals = var.match_details.signals.as_ref().unwrap();
        assert!(signals.name_score > 0.0);

        assert_eq!(run.stats.decomposition_links, 1);
        let hlr_stats = run.stats.layer(Layer::HlrToLlr);
        assert_eq!(hlr_stats.sources_processed, 2);
        assert_eq!(hlr_stats.links_created, 1);
        assert_eq!(run.stats.total_oracle_calls(), 0);
        assert_eq!(run.api_calls.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_adjudicator_selects_among_candidates() {
        let artifacts = artifacts(true);
        let oracle = oracle(true);
        let mut mock = MockProvider::default();
        mock.add_response(
            "ID: HLR-001-A",
            r#"{"selected_targets": [{"target_id": "LLR-001-A-1", "reasoning": "computes the slip ratio", "confidence": 0.92}],
                "rejected_targets": [{"target_id": "LLR-002", "reason": "filters speed only"}]}"#,
        );
        let mut linker = LayerLinker::new(&oracle, LinkingConfig::default())
            .unwrap()
            .with_adjudicator(adjudicator(&mock));

        let run = linker.establish_all_links(&artifacts).await.unwrap();

        let link = find(&run.links, "HLR-001-A", "LLR-001-A-1").unwrap();
        assert_eq!(link.match_details.method, LinkMethod::MultiSignalLlm);
        assert_eq!(link.confidence, 0.92);
        assert!(link.is_adjudicated());
        assert!(link.rationale.contains("Oracle: computes the slip ratio"));
        assert!(find(&run.links, "HLR-001-A", "LLR-002").is_none());

        assert_eq!(mock.call_count(), 1);
        assert_eq!(run.stats.layer(Layer::HlrToLlr).oracle_calls, 1);
        assert_eq!(run.api_calls.total_calls(), 1);
    }

    #[tokio::test]
    async fn test_oracle_failure_falls_back_to_heuristic_links() {
        let artifacts = artifacts(true);
        let oracle = oracle(true);
        let mut mock = MockProvider::default();
        mock.add_error("ID: HLR-001-A", LlmError::ModelNotAvailable("llama3.1".into()));
        let mut linker = LayerLinker::new(&oracle, LinkingConfig::default())
            .unwrap()
            .with_adjudicator(adjudicator(&mock));

        let run = linker.establish_all_links(&artifacts).await.unwrap();

        for target in ["LLR-001-A-1", "LLR-002"] {
            let link = find(&run.links, "HLR-001-A", target).unwrap();
            assert_eq!(link.match_details.method, LinkMethod::MultiSignal);
            let reason = link.match_details.fallback_reason.as_deref().unwrap();
            assert!(reason.starts_with("oracle unavailable"));
        }
        let stats = run.stats.layer(Layer::HlrToLlr);
        assert_eq!(stats.oracle_calls, 1);
        assert_eq!(stats.oracle_fallbacks, 1);
        assert_eq!(run.api_calls.total_failures(), 1);
    }

    #[tokio::test]
    async fn test_empty_selection_falls_back() {
        let artifacts = artifacts(true);
        let oracle = oracle(true);
        let mock = MockProvider::new(r#"{"selected_targets": [], "rejected_targets": []}"#);
        let config = LinkingConfig {
            fallback_top_n: 1,
            ..LinkingConfig::default()
        };
        let mut linker = LayerLinker::new(&oracle, config)
            .unwrap()
            .with_adjudicator(adjudicator(&mock));

        let run = linker.establish_all_links(&artifacts).await.unwrap();

        let from_hlr: Vec<&Link> = run
            .links
            .iter()
            .filter(|l| l.source_id == "HLR-001-A")
            .collect();
        assert_eq!(from_hlr.len(), 1);
        assert!(from_hlr[0].match_details.fallback_reason.is_some());
        assert_eq!(run.stats.layer(Layer::HlrToLlr).oracle_fallbacks, 1);
    }

    #[tokio::test]
    async fn test_single_candidate_skips_adjudication() {
        let artifacts = artifacts(false);
        let oracle = oracle(false);
        let mock = MockProvider::new("not consulted");
        let mut linker = LayerLinker::new(&oracle, LinkingConfig::default())
            .unwrap()
            .with_adjudicator(adjudicator(&mock));

        let run = linker.establish_all_links(&artifacts).await.unwrap();

        assert_eq!(mock.call_count(), 0);
        assert_eq!(run.links.len(), 4);
    }

    #[tokio::test]
    async fn test_missing_embedding_skips_source() {
        let artifacts = artifacts(false);
        let oracle = InMemoryOracle::new()
            .with("HLR-001-A", vec![0.9, 0.436, 0.0])
            .with("LLR-001-A-1", vec![0.8, 0.6, 0.0]);
        let mut linker = LayerLinker::new(&oracle, LinkingConfig::default()).unwrap();

        let run = linker.establish_all_links(&artifacts).await.unwrap();

        let decomposed = run.stats.layer(Layer::DecomposedToHlr);
        assert_eq!(decomposed.sources_skipped, 1);
        assert_eq!(decomposed.links_created, 0);
        // HLR-002 has no embedding either
        assert_eq!(run.stats.layer(Layer::HlrToLlr).sources_skipped, 1);
        assert_eq!(run.stats.layer(Layer::LlrToCodeVar).sources_processed, 1);
        assert!(find(&run.links, "HLR-001-A", "LLR-001-A-1").is_some());
    }

    #[test]
    fn test_decomposition_skips_unknown_children() {
        let mut parent =
            Artifact::new("SYS-002", ArtifactKind::SystemReq, "Report brake status").unwrap();
        parent.children = vec!["SYS-002-A".to_string(), "HLR-009".to_string(), "SYS-002-Z".to_string()];
        let artifacts = ArtifactSet::from_artifacts(vec![
            parent,
            Artifact::new("SYS-002-A", ArtifactKind::SystemReqDecomposed, "Report status").unwrap(),
            Artifact::new("HLR-009", ArtifactKind::Hlr, "Report status word").unwrap(),
        ])
        .unwrap();
        let oracle = InMemoryOracle::new();
        let linker = LayerLinker::new(&oracle, LinkingConfig::default()).unwrap();

        let links = linker.link_decomposition(&artifacts);

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target_id, "SYS-002-A");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let oracle = InMemoryOracle::new();
        let config = LinkingConfig {
            top_k: 0,
            ..LinkingConfig::default()
        };
        assert!(LayerLinker::new(&oracle, config).is_err());
    }

    #[test]
    fn test_linking_runs_on_a_plain_executor() {
        let artifacts = artifacts(false);
        let oracle = oracle(false);
        let mut linker = LayerLinker::new(&oracle, LinkingConfig::default()).unwrap();

        let run = tokio_test::block_on(linker.establish_all_links(&artifacts)).unwrap();
        assert_eq!(run.stats.total_links(), run.links.len());
    }
}
