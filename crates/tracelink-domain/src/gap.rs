//! Gap module - detected traceability defects

use crate::artifact::ArtifactKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of traceability defect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapKind {
    /// Artifact is missing a required parent link
    OrphanNoParent,

    /// Artifact is missing required child links
    OrphanNoChildren,

    /// Chain from a system requirement stops short or goes astray
    IncompleteChain,
}

impl GapKind {
    /// Get the gap kind name
    pub fn as_str(&self) -> &'static str {
        match self {
            GapKind::OrphanNoParent => "orphan_no_parent",
            GapKind::OrphanNoChildren => "orphan_no_children",
            GapKind::IncompleteChain => "incomplete_chain",
        }
    }
}

/// Impact of a gap, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Certification-blocking
    Critical,
    /// Must be resolved
    High,
    /// Should be resolved
    Medium,
    /// Informational
    Low,
}

impl Severity {
    /// Every severity, most severe first
    pub const ALL: [Severity; 4] = [Severity::Critical, Severity::High, Severity::Medium, Severity::Low];

    /// Get the severity name
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of one root-to-leaf path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChainClass {
    /// Reaches CODE_VAR at or beyond the expected depth
    Complete,
    /// Follows the hierarchy but stops early
    Partial,
    /// Root has no children
    Incomplete,
    /// Anything else
    Broken,
}

impl ChainClass {
    /// Get the classification name
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainClass::Complete => "COMPLETE",
            ChainClass::Partial => "PARTIAL",
            ChainClass::Incomplete => "INCOMPLETE",
            ChainClass::Broken => "BROKEN",
        }
    }
}

/// What a gap is about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "subject", rename_all = "snake_case")]
pub enum GapSubject {
    /// A single orphaned artifact
    Artifact {
        /// Orphaned artifact
        artifact_id: String,
        /// Its kind
        artifact_kind: ArtifactKind,
        /// Kind of parent it should have
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expected_parent_kind: Option<ArtifactKind>,
        /// Kind of child it should have
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expected_child_kind: Option<ArtifactKind>,
    },

    /// A deficient chain
    Chain {
        /// Node ids from root to leaf
        chain: Vec<String>,
        /// Chain classification
        classification: ChainClass,
        /// Last node reached
        break_point: String,
        /// Depth a complete chain would have
        expected_depth: usize,
        /// Depth actually reached
        actual_depth: usize,
    },
}

impl GapSubject {
    /// Artifact the gap is anchored to (the break point for chains)
    pub fn anchor_id(&self) -> &str {
        match self {
            GapSubject::Artifact { artifact_id, .. } => artifact_id,
            GapSubject::Chain { break_point, .. } => break_point,
        }
    }
}

/// Explanation attached to a gap by the gap explainer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GapReasoning {
    /// Why the gap exists
    pub summary: String,

    /// Root-cause category (`"error"` when the explanation failed)
    pub root_cause: String,

    /// Suggested remediation steps
    #[serde(default)]
    pub suggestions: Vec<String>,

    /// Near-miss candidates considered
    #[serde(default)]
    pub near_misses: Vec<String>,
}

/// A detected traceability defect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    /// Sequential id within one analysis run (`GAP-001`)
    pub gap_id: String,

    /// Gap category
    #[serde(rename = "type")]
    pub kind: GapKind,

    /// Impact
    pub severity: Severity,

    /// Artifact or chain concerned
    #[serde(flatten)]
    pub subject: GapSubject,

    /// Short description
    pub description: String,

    /// Optional explanation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<GapReasoning>,
}

impl Gap {
    /// Format a sequential gap id
    pub fn format_id(sequence: usize) -> String {
        format!("GAP-{:03}", sequence)
    }
}
