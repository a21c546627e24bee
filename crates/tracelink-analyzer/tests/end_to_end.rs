//! Coverage analysis over complete link sets

use tracelink_analyzer::{AnalysisConfig, TraceAnalyzer};
use tracelink_domain::{
    Artifact, ArtifactKind, ArtifactSet, ChainClass, Gap, GapKind, GapSubject, Link, LinkType,
    MatchDetails, Severity,
};
use tracelink_gatekeeper::TextExtractor;
use tracelink_linker::{LayerLinker, LinkingConfig};
use tracelink_store::embedding::HashingEmbeddingModel;
use tracelink_store::EmbeddingIndex;

fn link(source: &str, target: &str, link_type: LinkType) -> Link {
    Link::new(source, target, link_type, 0.8, MatchDetails::deterministic(), "").unwrap()
}

fn gaps_on<'a>(gaps: &'a [Gap], anchor: &str) -> Vec<&'a Gap> {
    gaps.iter().filter(|g| g.subject.anchor_id() == anchor).collect()
}

/// Three system requirements; one decomposed into two parts, one part
/// traced all the way down to a variable.
fn scenario() -> (ArtifactSet, Vec<Link>) {
    let mut artifacts = ArtifactSet::from_artifacts(vec![
        Artifact::new("SYS-001", ArtifactKind::SystemReq, "Prevent wheel skid during landing").unwrap(),
        Artifact::new("SYS-002", ArtifactKind::SystemReq, "Report brake wear to maintenance").unwrap(),
        Artifact::new("SYS-003", ArtifactKind::SystemReq, "Record braking faults").unwrap(),
        Artifact::new("HLR-001-A", ArtifactKind::Hlr, "Limit wheel slip below 12 %").unwrap(),
        Artifact::new("LLR-001-A-1", ArtifactKind::Llr, "Compute wheel_slip_ratio at 100 Hz").unwrap(),
        Artifact::new("VAR-007", ArtifactKind::CodeVar, "Wheel slip ratio")
            .unwrap()
            .with_name("wheel_slip_ratio"),
    ])
    .unwrap();
    let part_a = artifacts
        .add_decomposed_part("SYS-001", "A", "Limit wheel slip during landing")
        .unwrap();
    let part_b = artifacts
        .add_decomposed_part("SYS-001", "B", "Release brakes on skid detection")
        .unwrap();

    let links = vec![
        Link::decomposition("SYS-001", &part_a),
        Link::decomposition("SYS-001", &part_b),
        link(&part_a, "HLR-001-A", LinkType::Implements),
        link("HLR-001-A", "LLR-001-A-1", LinkType::Implements),
        link("LLR-001-A-1", "VAR-007", LinkType::References),
    ];
    (artifacts, links)
}

#[test]
fn test_exactly_one_complete_chain() {
    let (artifacts, links) = scenario();
    let report = TraceAnalyzer::new(AnalysisConfig::default())
        .unwrap()
        .analyze(&artifacts, &links)
        .unwrap();

    assert_eq!(report.coverage.end_to_end.tally.complete, 1);
    // SYS-001-B stops after decomposition
    assert_eq!(report.coverage.end_to_end.tally.partial, 1);
    assert_eq!(report.coverage.end_to_end.tally.incomplete, 2);
    assert_eq!(report.coverage.end_to_end.tally.total, 4);
}

#[test]
fn test_undecomposed_requirements_get_one_critical_gap_each() {
    let (artifacts, links) = scenario();
    let report = TraceAnalyzer::new(AnalysisConfig::default())
        .unwrap()
        .analyze(&artifacts, &links)
        .unwrap();

    for sys in ["SYS-002", "SYS-003"] {
        let critical: Vec<&Gap> = gaps_on(&report.gaps, sys)
            .into_iter()
            .filter(|g| g.severity == Severity::Critical)
            .collect();
        assert_eq!(critical.len(), 1, "{}", sys);
        assert_eq!(critical[0].kind, GapKind::OrphanNoChildren);
    }

    // The undecomposed part has no HLR
    let part_b = gaps_on(&report.gaps, "SYS-001-B");
    assert!(part_b
        .iter()
        .any(|g| g.kind == GapKind::OrphanNoChildren && g.severity == Severity::Critical));
    assert!(part_b.iter().any(|g| matches!(
        &g.subject,
        GapSubject::Chain { classification: ChainClass::Partial, actual_depth: 2, .. }
    )));
}

#[test]
fn test_complete_chain_leaves_no_gaps_on_its_path() {
    let (artifacts, links) = scenario();
    let report = TraceAnalyzer::new(AnalysisConfig::default())
        .unwrap()
        .analyze(&artifacts, &links)
        .unwrap();

    for id in ["SYS-001-A", "HLR-001-A", "LLR-001-A-1", "VAR-007"] {
        assert!(gaps_on(&report.gaps, id).is_empty(), "{}", id);
    }
    assert!(report.orphans.isolated.is_empty());
    assert_eq!(report.system_requirements.fully_implemented.count, 1);
}

#[test]
fn test_rebuilt_analysis_is_stable() {
    let (artifacts, links) = scenario();
    let analyzer = TraceAnalyzer::new(AnalysisConfig::default()).unwrap();
    let first = analyzer.analyze(&artifacts, &links).unwrap();
    let second = analyzer.analyze(&artifacts, &links).unwrap();

    assert_eq!(first.gaps, second.gaps);
    assert_eq!(first.coverage, second.coverage);
    assert_eq!(first.trace_paths, second.trace_paths);
}

#[tokio::test]
async fn test_analyzes_linker_output() {
    let mut artifacts = ArtifactSet::from_artifacts(vec![
        Artifact::new("SYS-001", ArtifactKind::SystemReq, "The brake control unit shall prevent wheel skid during landing").unwrap(),
        Artifact::new("SYS-002", ArtifactKind::SystemReq, "The brake control unit shall report wear to maintenance").unwrap(),
        Artifact::new(
            "HLR-001-A",
            ArtifactKind::Hlr,
            "The brake control unit shall compute wheel slip ratio and limit it below 12 %",
        )
        .unwrap(),
        Artifact::new(
            "LLR-001-A-1",
            ArtifactKind::Llr,
            "Compute wheel_slip_ratio from wheel speed and ground speed at 100 Hz and limit slip below 12 %",
        )
        .unwrap(),
        Artifact::new("VAR-007", ArtifactKind::CodeVar, "Wheel slip ratio computed from wheel speed")
            .unwrap()
            .with_name("wheel_slip_ratio"),
    ])
    .unwrap();
    artifacts
        .add_decomposed_part(
            "SYS-001",
            "A",
            "The brake control unit shall limit wheel slip ratio below 12 % during landing",
        )
        .unwrap();
    TextExtractor::new().unwrap().enrich(&mut artifacts);

    let oracle = EmbeddingIndex::build(HashingEmbeddingModel::new(384), &artifacts).unwrap();
    let run = LayerLinker::new(&oracle, LinkingConfig::default())
        .unwrap()
        .establish_all_links(&artifacts)
        .await
        .unwrap();

    let report = TraceAnalyzer::new(AnalysisConfig::default())
        .unwrap()
        .analyze(&artifacts, &run.links)
        .unwrap();

    assert_eq!(report.metadata.total_links, run.links.len());
    assert_eq!(report.link_quality.total_links, run.links.len());
    let sys_002: Vec<&Gap> = gaps_on(&report.gaps, "SYS-002")
        .into_iter()
        .filter(|g| g.kind == GapKind::OrphanNoChildren)
        .collect();
    assert_eq!(sys_002.len(), 1);
    assert_eq!(sys_002[0].severity, Severity::Critical);
}
