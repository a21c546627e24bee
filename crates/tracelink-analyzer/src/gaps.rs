//! Gap detection and severity assignment

use crate::coverage::{CoverageAnalyzer, OrphanReport};
use tracelink_domain::{ArtifactKind, ChainClass, Gap, GapKind, GapSubject, Severity};
use tracing::debug;

/// Severity of an artifact missing its children
pub fn no_children_severity(kind: ArtifactKind) -> Severity {
    match kind {
        ArtifactKind::SystemReq | ArtifactKind::SystemReqDecomposed => Severity::Critical,
        ArtifactKind::Hlr => Severity::High,
        _ => Severity::Medium,
    }
}

/// Severity of a deficient chain
pub fn chain_severity(class: ChainClass) -> Severity {
    match class {
        ChainClass::Incomplete => Severity::High,
        _ => Severity::Medium,
    }
}

/// Turns orphans and deficient chains into numbered gaps
///
/// Discovery order is: missing parents, then missing children, then chains
/// from each system requirement. Gap ids follow that order and are only
/// stable within one run.
pub struct GapDetector<'a> {
    analyzer: &'a CoverageAnalyzer<'a>,
}

impl<'a> GapDetector<'a> {
    /// Create a detector
    pub fn new(analyzer: &'a CoverageAnalyzer<'a>) -> Self {
        Self { analyzer }
    }

    /// Detect every gap
    pub fn detect(&self, orphans: &OrphanReport) -> Vec<Gap> {
        let mut gaps = Vec::new();

        for orphan in &orphans.no_parent {
            push_gap(
                &mut gaps,
                GapKind::OrphanNoParent,
                Severity::High,
                GapSubject::Artifact {
                    artifact_id: orphan.artifact_id.clone(),
                    artifact_kind: orphan.kind,
                    expected_parent_kind: orphan.expected_parent_kind,
                    expected_child_kind: None,
                },
                format!("{} has no parent link", orphan.kind),
            );
        }

        for orphan in &orphans.no_children {
            push_gap(
                &mut gaps,
                GapKind::OrphanNoChildren,
                no_children_severity(orphan.kind),
                GapSubject::Artifact {
                    artifact_id: orphan.artifact_id.clone(),
                    artifact_kind: orphan.kind,
                    expected_parent_kind: None,
                    expected_child_kind: orphan.expected_child_kind,
                },
                format!("{} has no child links", orphan.kind),
            );
        }

        let expected_depth = ArtifactKind::SystemReq.expected_chain_depth();
        for (root, chains) in self.analyzer.system_chains() {
            for chain in chains {
                if chain.classification == ChainClass::Complete {
                    continue;
                }
                let actual_depth = chain.depth();
                let break_point = chain.leaf().to_string();
                push_gap(
                    &mut gaps,
                    GapKind::IncompleteChain,
                    chain_severity(chain.classification),
                    GapSubject::Chain {
                        chain: chain.path,
                        classification: chain.classification,
                        break_point,
                        expected_depth,
                        actual_depth,
                    },
                    format!("Incomplete trace chain from {}", root),
                );
            }
        }

        debug!("Detected {} gaps", gaps.len());
        gaps
    }
}

fn push_gap(
    gaps: &mut Vec<Gap>,
    kind: GapKind,
    severity: Severity,
    subject: GapSubject,
    description: String,
) {
    gaps.push(Gap {
        gap_id: Gap::format_id(gaps.len() + 1),
        kind,
        severity,
        subject,
        description,
        reasoning: None,
    });
}
