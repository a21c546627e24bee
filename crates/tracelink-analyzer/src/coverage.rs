//! Per-kind coverage and orphan detection

use crate::chains::{ChainClassifier, ChainTally, ClassifiedChain};
use crate::graph::TraceGraph;
use crate::percentage;
use serde::Serialize;
use tracelink_domain::{ArtifactKind, ArtifactSet};

/// Link coverage of one artifact kind
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KindCoverage {
    /// Artifact kind
    pub kind: ArtifactKind,
    /// Artifacts of this kind
    pub total: usize,
    /// With at least one parent
    pub with_parent: usize,
    /// With at least one child
    pub with_children: usize,
    /// With both a parent and a child
    pub fully_linked: usize,
    /// With a parent or a child
    pub linked: usize,
    /// `linked` as a percentage of `total`
    pub linked_percentage: f64,
}

/// End-to-end chain tallies from every system requirement
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EndToEnd {
    /// Counts by classification
    #[serde(flatten)]
    pub tally: ChainTally,
    /// Share of complete chains, in percent
    pub complete_percentage: f64,
}

/// Coverage across the hierarchy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageMetrics {
    /// One entry per kind, top of the hierarchy first
    pub by_kind: Vec<KindCoverage>,
    /// Chain tallies
    pub end_to_end: EndToEnd,
}

impl CoverageMetrics {
    /// Coverage of one kind
    pub fn kind(&self, kind: ArtifactKind) -> Option<&KindCoverage> {
        self.by_kind.iter().find(|c| c.kind == kind)
    }
}

/// An artifact missing a required link
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrphanEntry {
    /// Artifact id
    pub artifact_id: String,
    /// Artifact kind
    pub kind: ArtifactKind,
    /// Parent kind it should have
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_parent_kind: Option<ArtifactKind>,
    /// Child kind it should have
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_child_kind: Option<ArtifactKind>,
    /// Why it is listed
    pub reason: String,
}

/// Orphans grouped by what is missing
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrphanReport {
    /// Kinds that require a parent but have none
    pub no_parent: Vec<OrphanEntry>,
    /// Kinds that require children but have none
    pub no_children: Vec<OrphanEntry>,
    /// No links at all (system requirements excepted)
    pub isolated: Vec<OrphanEntry>,
}

impl OrphanReport {
    /// Whether nothing was found
    pub fn is_empty(&self) -> bool {
        self.no_parent.is_empty() && self.no_children.is_empty() && self.isolated.is_empty()
    }
}

/// Computes coverage over an artifact set and its trace graph
pub struct CoverageAnalyzer<'a> {
    artifacts: &'a ArtifactSet,
    graph: &'a TraceGraph,
}

impl<'a> CoverageAnalyzer<'a> {
    /// Create an analyzer
    pub fn new(artifacts: &'a ArtifactSet, graph: &'a TraceGraph) -> Self {
        Self { artifacts, graph }
    }

    /// Artifact set under analysis
    pub fn artifacts(&self) -> &'a ArtifactSet {
        self.artifacts
    }

    /// Graph under analysis
    pub fn graph(&self) -> &'a TraceGraph {
        self.graph
    }

    /// Classified chains below every system requirement, in artifact order
    pub fn system_chains(&self) -> Vec<(String, Vec<ClassifiedChain>)> {
        let classifier = ChainClassifier::new(self.artifacts);
        self.artifacts
            .of_kind(ArtifactKind::SystemReq)
            .map(|sys| (sys.id.clone(), classifier.chains_from(self.graph, &sys.id)))
            .collect()
    }

    /// Per-kind coverage and end-to-end chain tallies
    pub fn coverage(&self) -> CoverageMetrics {
        let by_kind = ArtifactKind::ALL
            .iter()
            .map(|&kind| self.kind_coverage(kind))
            .collect();

        let mut tally = ChainTally::default();
        for (_, chains) in self.system_chains() {
            for chain in chains {
                tally.record(chain.classification);
            }
        }

        CoverageMetrics {
            by_kind,
            end_to_end: EndToEnd {
                complete_percentage: tally.complete_percentage(),
                tally,
            },
        }
    }

    fn kind_coverage(&self, kind: ArtifactKind) -> KindCoverage {
        let mut coverage = KindCoverage {
            kind,
            total: 0,
            with_parent: 0,
            with_children: 0,
            fully_linked: 0,
            linked: 0,
            linked_percentage: 0.0,
        };
        for artifact in self.artifacts.of_kind(kind) {
            let up = self.graph.has_parent(&artifact.id);
            let down = self.graph.has_children(&artifact.id);
            coverage.total += 1;
            coverage.with_parent += usize::from(up);
            coverage.with_children += usize::from(down);
            coverage.fully_linked += usize::from(up && down);
            coverage.linked += usize::from(up || down);
        }
        coverage.linked_percentage = percentage(coverage.linked, coverage.total);
        coverage
    }

    /// Artifacts missing the links their kind requires
    pub fn orphans(&self) -> OrphanReport {
        let mut report = OrphanReport::default();

        for artifact in self.artifacts.iter() {
            let kind = artifact.kind;
            let up = self.graph.has_parent(&artifact.id);
            let down = self.graph.has_children(&artifact.id);

            if kind.requires_parent() && !up {
                report.no_parent.push(OrphanEntry {
                    artifact_id: artifact.id.clone(),
                    kind,
                    expected_parent_kind: kind.parent(),
                    expected_child_kind: None,
                    reason: format!("{} has no parent link", kind),
                });
            }
            if kind.requires_children() && !down {
                report.no_children.push(OrphanEntry {
                    artifact_id: artifact.id.clone(),
                    kind,
                    expected_parent_kind: None,
                    expected_child_kind: kind.child(),
                    reason: format!("{} has no child links", kind),
                });
            }
            if !up && !down && kind != ArtifactKind::SystemReq {
                report.isolated.push(OrphanEntry {
                    artifact_id: artifact.id.clone(),
                    kind,
                    expected_parent_kind: kind.parent(),
                    expected_child_kind: kind.child(),
                    reason: "Artifact has no links at all".to_string(),
                });
            }
        }
        report
    }
}
