//! The analysis report handed to downstream renderers

use crate::chains::{enumerate_backward, enumerate_forward};
use crate::config::{ConfidenceBand, ConfidenceBands};
use crate::coverage::{CoverageMetrics, OrphanReport};
use crate::graph::TraceGraph;
use crate::percentage;
use serde::Serialize;
use std::collections::BTreeMap;
use tracelink_domain::{Artifact, ArtifactKind, ArtifactSet, Gap, Link, Severity};

/// Status of one requirement within its layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusEntry {
    /// Artifact id
    pub id: String,

    /// Artifact text (variable name for variables)
    pub text: String,

    /// Why it is not fully implemented
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Links it has
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub has: Vec<String>,

    /// Links it is missing
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,

    /// Related artifact counts
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub counts: BTreeMap<String, usize>,
}

impl StatusEntry {
    fn new(artifact: &Artifact) -> Self {
        Self {
            id: artifact.id.clone(),
            text: artifact.text.clone(),
            reason: None,
            has: Vec::new(),
            missing: Vec::new(),
            counts: BTreeMap::new(),
        }
    }

    fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    fn has(mut self, items: &[&str]) -> Self {
        self.has = items.iter().map(|s| s.to_string()).collect();
        self
    }

    fn missing(mut self, items: &[&str]) -> Self {
        self.missing = items.iter().map(|s| s.to_string()).collect();
        self
    }

    fn count(mut self, key: &str, value: usize) -> Self {
        self.counts.insert(key.to_string(), value);
        self
    }
}

/// Requirements sharing one status
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusBucket {
    /// Number of requirements
    pub count: usize,

    /// Share of the layer, in percent
    pub percentage: f64,

    /// The requirements
    pub requirements: Vec<StatusEntry>,
}

impl StatusBucket {
    fn new(requirements: Vec<StatusEntry>, total: usize) -> Self {
        Self {
            count: requirements.len(),
            percentage: percentage(requirements.len(), total),
            requirements,
        }
    }
}

/// Implementation status of system requirements
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemRequirementsSection {
    /// System requirements
    pub total: usize,
    /// Reach LLRs through decomposition and HLRs
    pub fully_implemented: StatusBucket,
    /// Decomposed but stop before LLRs
    pub partially_implemented: StatusBucket,
    /// Never decomposed
    pub not_implemented: StatusBucket,
}

/// Implementation status of HLRs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighLevelSection {
    /// HLRs
    pub total: usize,
    /// Parent and LLR children
    pub fully_implemented: StatusBucket,
    /// One of the two
    pub partially_implemented: StatusBucket,
    /// Neither
    pub orphaned: StatusBucket,
}

/// Status of LLRs
///
/// With variables present an LLR is judged on both its HLR parent and its
/// variable children; without them only the parent counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LowLevelSection {
    /// Variables exist
    WithVariables {
        /// LLRs
        total: usize,
        /// HLR parent and variable children
        complete: StatusBucket,
        /// One of the two
        partial: StatusBucket,
        /// Neither
        orphaned: StatusBucket,
    },

    /// No variables in the artifact set
    WithoutVariables {
        /// LLRs
        total: usize,
        /// HLR parent present
        traced: StatusBucket,
        /// No HLR parent
        orphaned: StatusBucket,
    },
}

/// Traceability of variables
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariablesSection {
    /// Variables
    pub total: usize,
    /// Referenced by an LLR
    pub traced: StatusBucket,
    /// Not referenced
    pub orphaned: StatusBucket,
}

/// Path enumerations for one artifact
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathEntry {
    /// Artifact text
    pub text: String,

    /// Paths from the top of the hierarchy down to this artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backward_paths: Option<Vec<Vec<String>>>,

    /// Paths from this artifact down to a leaf
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward_paths: Option<Vec<Vec<String>>>,
}

/// Trace paths by layer
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TracePaths {
    /// Forward paths of each system requirement
    pub system_requirements: BTreeMap<String, PathEntry>,
    /// Backward and forward paths of each HLR
    pub high_level_requirements: BTreeMap<String, PathEntry>,
    /// Backward paths of each LLR
    pub low_level_requirements: BTreeMap<String, PathEntry>,
}

/// Headline implementation rates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityMetrics {
    /// Implemented share of SYS, HLR and LLR combined, in percent
    pub overall_implementation_rate: f64,
    /// Fully implemented system requirements, in percent
    pub system_requirements_rate: f64,
    /// Fully implemented HLRs, in percent
    pub hlr_implementation_rate: f64,
    /// LLRs with an HLR parent, in percent
    pub llr_traceability_rate: f64,
    /// SYS + HLR + LLR
    pub total_requirements: usize,
    /// Fully implemented SYS and HLR plus traced LLR
    pub total_implemented: usize,
    /// HLRs with no links
    pub orphaned_hlrs: usize,
    /// LLRs counted as orphaned
    pub orphaned_llrs: usize,
    /// Sum of the two
    pub total_orphaned: usize,
}

/// Links in one confidence band
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BandCount {
    /// Links in the band
    pub count: usize,
    /// Share of all links, in percent
    pub percentage: f64,
}

/// Confidence distribution of the link set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkQuality {
    /// Links counted
    pub total_links: usize,
    /// Mean confidence (0 without links)
    pub mean_confidence: f64,
    /// At or above the high bound
    pub high: BandCount,
    /// Medium band
    pub medium: BandCount,
    /// Low band
    pub low: BandCount,
    /// Below the low bound
    pub very_low: BandCount,
}

impl LinkQuality {
    /// Band the confidences of `links`
    pub fn from_links(links: &[Link], bands: &ConfidenceBands) -> Self {
        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        for link in links {
            let key = match bands.band(link.confidence) {
                ConfidenceBand::High => "high",
                ConfidenceBand::Medium => "medium",
                ConfidenceBand::Low => "low",
                ConfidenceBand::VeryLow => "very_low",
            };
            *counts.entry(key).or_insert(0) += 1;
        }
        let band = |key: &str| {
            let count = counts.get(key).copied().unwrap_or(0);
            BandCount {
                count,
                percentage: percentage(count, links.len()),
            }
        };
        let mean_confidence = if links.is_empty() {
            0.0
        } else {
            links.iter().map(|l| l.confidence).sum::<f64>() / links.len() as f64
        };

        Self {
            total_links: links.len(),
            mean_confidence,
            high: band("high"),
            medium: band("medium"),
            low: band("low"),
            very_low: band("very_low"),
        }
    }
}

/// Gap counts by severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GapSummary {
    /// All gaps
    pub total: usize,
    /// Critical gaps
    pub critical: usize,
    /// High gaps
    pub high: usize,
    /// Medium gaps
    pub medium: usize,
    /// Low gaps
    pub low: usize,
}

impl GapSummary {
    /// Count gaps by severity
    pub fn from_gaps(gaps: &[Gap]) -> Self {
        let mut summary = Self {
            total: gaps.len(),
            ..Self::default()
        };
        for gap in gaps {
            match gap.severity {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
            }
        }
        summary
    }
}

/// Report metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportMetadata {
    /// Artifacts analysed
    pub total_artifacts: usize,
    /// Links analysed
    pub total_links: usize,
    /// Whether any CODE_VAR artifact exists
    pub has_variables: bool,
    /// Seconds since the epoch
    pub generated_at: u64,
}

/// Complete analysis of one link set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// System requirement status
    pub system_requirements: SystemRequirementsSection,
    /// HLR status
    pub high_level_requirements: HighLevelSection,
    /// LLR status
    pub low_level_requirements: LowLevelSection,
    /// Variable status
    pub variables: VariablesSection,
    /// Path enumerations
    pub trace_paths: TracePaths,
    /// Headline rates
    pub quality_metrics: QualityMetrics,
    /// Confidence distribution
    pub link_quality: LinkQuality,
    /// Per-kind coverage and chain tallies
    pub coverage: CoverageMetrics,
    /// Orphaned artifacts
    pub orphans: OrphanReport,
    /// Detected gaps
    pub gaps: Vec<Gap>,
    /// Gap counts
    pub gap_summary: GapSummary,
    /// Run metadata
    pub metadata: ReportMetadata,
}

impl AnalysisReport {
    /// Short human-readable summary
    pub fn summary(&self) -> String {
        let mut lines = vec!["Analysis Summary".to_string()];
        lines.push(format!(
            "  Artifacts: {}  Links: {}",
            self.metadata.total_artifacts, self.metadata.total_links
        ));
        let end_to_end = &self.coverage.end_to_end;
        lines.push(format!(
            "  Chains: {} total, {} complete ({:.1}%), {} partial, {} incomplete, {} broken",
            end_to_end.tally.total,
            end_to_end.tally.complete,
            end_to_end.complete_percentage,
            end_to_end.tally.partial,
            end_to_end.tally.incomplete,
            end_to_end.tally.broken
        ));
        lines.push(format!(
            "  System requirements fully implemented: {}/{} ({:.1}%)",
            self.system_requirements.fully_implemented.count,
            self.system_requirements.total,
            self.quality_metrics.system_requirements_rate
        ));
        lines.push(format!(
            "  Overall implementation rate: {:.1}%",
            self.quality_metrics.overall_implementation_rate
        ));
        lines.push(format!(
            "  Link confidence: mean {:.2}, {} high, {} medium, {} low, {} very low",
            self.link_quality.mean_confidence,
            self.link_quality.high.count,
            self.link_quality.medium.count,
            self.link_quality.low.count,
            self.link_quality.very_low.count
        ));
        lines.push(format!(
            "  Gaps: {} ({} critical, {} high, {} medium, {} low)",
            self.gap_summary.total,
            self.gap_summary.critical,
            self.gap_summary.high,
            self.gap_summary.medium,
            self.gap_summary.low
        ));
        lines.join("\n")
    }
}

fn dedup(ids: Vec<&str>) -> Vec<&str> {
    let mut seen = Vec::with_capacity(ids.len());
    for id in ids {
        if !seen.contains(&id) {
            seen.push(id);
        }
    }
    seen
}

/// Classify system requirements by how far down their decomposition reaches
pub fn system_requirements(artifacts: &ArtifactSet, graph: &TraceGraph) -> SystemRequirementsSection {
    let mut fully = Vec::new();
    let mut partially = Vec::new();
    let mut not = Vec::new();

    for sys in artifacts.of_kind(ArtifactKind::SystemReq) {
        let parts = graph.children_of_kind(&sys.id, ArtifactKind::SystemReqDecomposed, artifacts);
        if parts.is_empty() {
            not.push(
                StatusEntry::new(sys)
                    .reason("No decomposition found")
                    .missing(&["decomposition", "HLRs", "LLRs"]),
            );
            continue;
        }

        let hlrs = dedup(
            parts
                .iter()
                .flat_map(|p| graph.children_of_kind(p, ArtifactKind::Hlr, artifacts))
                .collect(),
        );
        if hlrs.is_empty() {
            partially.push(
                StatusEntry::new(sys)
                    .reason("Has decomposition but no HLRs linked")
                    .has(&["decomposition"])
                    .missing(&["HLRs", "LLRs"])
                    .count("decomposition_count", parts.len())
                    .count("hlr_count", 0)
                    .count("llr_count", 0),
            );
            continue;
        }

        let llrs = dedup(
            hlrs.iter()
                .flat_map(|h| graph.children_of_kind(h, ArtifactKind::Llr, artifacts))
                .collect(),
        );
        if llrs.is_empty() {
            partially.push(
                StatusEntry::new(sys)
                    .reason("Has decomposition and HLRs but no LLRs linked")
                    .has(&["decomposition", "HLRs"])
                    .missing(&["LLRs"])
                    .count("decomposition_count", parts.len())
                    .count("hlr_count", hlrs.len())
                    .count("llr_count", 0),
            );
            continue;
        }

        fully.push(
            StatusEntry::new(sys)
                .count("decomposition_count", parts.len())
                .count("hlr_count", hlrs.len())
                .count("llr_count", llrs.len()),
        );
    }

    let total = fully.len() + partially.len() + not.len();
    SystemRequirementsSection {
        total,
        fully_implemented: StatusBucket::new(fully, total),
        partially_implemented: StatusBucket::new(partially, total),
        not_implemented: StatusBucket::new(not, total),
    }
}

/// Classify HLRs by parent and LLR children
pub fn high_level_requirements(artifacts: &ArtifactSet, graph: &TraceGraph) -> HighLevelSection {
    const PARENT_KINDS: [ArtifactKind; 2] = [ArtifactKind::SystemReqDecomposed, ArtifactKind::SystemReq];

    let mut fully = Vec::new();
    let mut partially = Vec::new();
    let mut orphaned = Vec::new();

    for hlr in artifacts.of_kind(ArtifactKind::Hlr) {
        let parents = graph.parents_of_kind(&hlr.id, &PARENT_KINDS, artifacts);
        let llrs = graph.children_of_kind(&hlr.id, ArtifactKind::Llr, artifacts);
        let entry = StatusEntry::new(hlr)
            .count("parent_count", parents.len())
            .count("llr_count", llrs.len());

        match (parents.is_empty(), llrs.is_empty()) {
            (false, false) => fully.push(entry),
            (false, true) => partially.push(
                entry
                    .reason("No LLR children (not decomposed to low-level)")
                    .has(&["parent_link"])
                    .missing(&["LLR_children"]),
            ),
            (true, false) => partially.push(
                entry
                    .reason("No parent link (orphaned from system requirements)")
                    .has(&["LLR_children"])
                    .missing(&["parent_link"]),
            ),
            (true, true) => orphaned.push(
                StatusEntry::new(hlr).reason("Completely isolated - no parent and no children"),
            ),
        }
    }

    let total = fully.len() + partially.len() + orphaned.len();
    HighLevelSection {
        total,
        fully_implemented: StatusBucket::new(fully, total),
        partially_implemented: StatusBucket::new(partially, total),
        orphaned: StatusBucket::new(orphaned, total),
    }
}

/// Classify LLRs, with or without the variable layer
pub fn low_level_requirements(artifacts: &ArtifactSet, graph: &TraceGraph) -> LowLevelSection {
    let has_variables = artifacts.count_of(ArtifactKind::CodeVar) > 0;
    let total = artifacts.count_of(ArtifactKind::Llr);

    if !has_variables {
        let mut traced = Vec::new();
        let mut orphaned = Vec::new();
        for llr in artifacts.of_kind(ArtifactKind::Llr) {
            let hlrs = graph.parents_of_kind(&llr.id, &[ArtifactKind::Hlr], artifacts);
            if hlrs.is_empty() {
                orphaned.push(StatusEntry::new(llr).reason("Not mapped to any HLR"));
            } else {
                traced.push(StatusEntry::new(llr).count("hlr_count", hlrs.len()));
            }
        }
        return LowLevelSection::WithoutVariables {
            total,
            traced: StatusBucket::new(traced, total),
            orphaned: StatusBucket::new(orphaned, total),
        };
    }

    let mut complete = Vec::new();
    let mut partial = Vec::new();
    let mut orphaned = Vec::new();
    for llr in artifacts.of_kind(ArtifactKind::Llr) {
        let hlrs = graph.parents_of_kind(&llr.id, &[ArtifactKind::Hlr], artifacts);
        let vars = graph.children_of_kind(&llr.id, ArtifactKind::CodeVar, artifacts);
        let entry = StatusEntry::new(llr)
            .count("hlr_count", hlrs.len())
            .count("variable_count", vars.len());

        match (hlrs.is_empty(), vars.is_empty()) {
            (false, false) => complete.push(entry),
            (false, true) => partial.push(
                entry
                    .reason("No variables referenced")
                    .has(&["HLR_parent"])
                    .missing(&["variables"]),
            ),
            (true, false) => partial.push(
                entry
                    .reason("No HLR parent (orphaned)")
                    .has(&["variables"])
                    .missing(&["HLR_parent"]),
            ),
            (true, true) => orphaned.push(StatusEntry::new(llr).reason("Completely isolated")),
        }
    }
    LowLevelSection::WithVariables {
        total,
        complete: StatusBucket::new(complete, total),
        partial: StatusBucket::new(partial, total),
        orphaned: StatusBucket::new(orphaned, total),
    }
}

impl LowLevelSection {
    /// LLRs counted as orphaned
    pub fn orphaned_count(&self) -> usize {
        match self {
            LowLevelSection::WithVariables { orphaned, .. }
            | LowLevelSection::WithoutVariables { orphaned, .. } => orphaned.count,
        }
    }
}

/// Classify variables by LLR references
pub fn variables(artifacts: &ArtifactSet, graph: &TraceGraph) -> VariablesSection {
    let mut traced = Vec::new();
    let mut orphaned = Vec::new();

    for var in artifacts.of_kind(ArtifactKind::CodeVar) {
        let llrs = graph.parents_of_kind(&var.id, &[ArtifactKind::Llr], artifacts);
        let mut entry = StatusEntry::new(var);
        if let Some(name) = &var.name {
            entry.text = name.clone();
        }
        if llrs.is_empty() {
            orphaned.push(entry.reason("No LLR parent - not traced to requirements"));
        } else {
            traced.push(entry.count("llr_count", llrs.len()));
        }
    }

    let total = traced.len() + orphaned.len();
    VariablesSection {
        total,
        traced: StatusBucket::new(traced, total),
        orphaned: StatusBucket::new(orphaned, total),
    }
}

/// Enumerate paths for every SYS, HLR and LLR
pub fn trace_paths(artifacts: &ArtifactSet, graph: &TraceGraph) -> TracePaths {
    let mut paths = TracePaths::default();

    for sys in artifacts.of_kind(ArtifactKind::SystemReq) {
        paths.system_requirements.insert(
            sys.id.clone(),
            PathEntry {
                text: sys.text.clone(),
                backward_paths: None,
                forward_paths: Some(enumerate_forward(graph, &sys.id)),
            },
        );
    }
    for hlr in artifacts.of_kind(ArtifactKind::Hlr) {
        paths.high_level_requirements.insert(
            hlr.id.clone(),
            PathEntry {
                text: hlr.text.clone(),
                backward_paths: Some(enumerate_backward(graph, &hlr.id)),
                forward_paths: Some(enumerate_forward(graph, &hlr.id)),
            },
        );
    }
    for llr in artifacts.of_kind(ArtifactKind::Llr) {
        paths.low_level_requirements.insert(
            llr.id.clone(),
            PathEntry {
                text: llr.text.clone(),
                backward_paths: Some(enumerate_backward(graph, &llr.id)),
                forward_paths: None,
            },
        );
    }
    paths
}

/// Headline rates from the layer sections
///
/// An LLR counts as implemented when it has an HLR parent.
pub fn quality_metrics(
    sys: &SystemRequirementsSection,
    hlr: &HighLevelSection,
    llr: &LowLevelSection,
    artifacts: &ArtifactSet,
    graph: &TraceGraph,
) -> QualityMetrics {
    let llr_total = artifacts.count_of(ArtifactKind::Llr);
    let llr_traced = artifacts
        .of_kind(ArtifactKind::Llr)
        .filter(|l| {
            !graph
                .parents_of_kind(&l.id, &[ArtifactKind::Hlr], artifacts)
                .is_empty()
        })
        .count();

    let total_requirements = sys.total + hlr.total + llr_total;
    let total_implemented = sys.fully_implemented.count + hlr.fully_implemented.count + llr_traced;
    let orphaned_hlrs = hlr.orphaned.count;
    let orphaned_llrs = llr.orphaned_count();

    QualityMetrics {
        overall_implementation_rate: percentage(total_implemented, total_requirements),
        system_requirements_rate: sys.fully_implemented.percentage,
        hlr_implementation_rate: hlr.fully_implemented.percentage,
        llr_traceability_rate: percentage(llr_traced, llr_total),
        total_requirements,
        total_implemented,
        orphaned_hlrs,
        orphaned_llrs,
        total_orphaned: orphaned_hlrs + orphaned_llrs,
    }
}
