//! Link module - confidence-scored relationships between artifacts

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Confidence at or above which a link is considered confirmed
pub const CONFIRMED_THRESHOLD: f64 = 0.7;

/// Author recorded on links produced by the pipeline
pub const AUTO_AUTHOR: &str = "auto";

/// Relationship asserted by a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    /// System requirement to one of its decomposed parts
    Decomposes,

    /// Lower-layer requirement implements a higher-layer one
    Implements,

    /// Low-level requirement references an implementation variable
    References,
}

impl LinkType {
    /// Get the link type name
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkType::Decomposes => "decomposes",
            LinkType::Implements => "implements",
            LinkType::References => "references",
        }
    }
}

/// Review status derived from confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    /// Confidence at or above [`CONFIRMED_THRESHOLD`]
    Confirmed,

    /// Needs review
    Candidate,
}

impl LinkStatus {
    /// Status implied by a confidence value
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= CONFIRMED_THRESHOLD {
            LinkStatus::Confirmed
        } else {
            LinkStatus::Candidate
        }
    }
}

/// How a link was decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkMethod {
    /// Copied from pre-populated decomposition
    #[serde(rename = "deterministic")]
    Deterministic,

    /// Heuristic signals only
    #[serde(rename = "multi-signal")]
    MultiSignal,

    /// Heuristic signals confirmed by the LLM adjudicator
    #[serde(rename = "multi-signal + llm")]
    MultiSignalLlm,
}

impl LinkMethod {
    /// Get the method label
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkMethod::Deterministic => "deterministic",
            LinkMethod::MultiSignal => "multi-signal",
            LinkMethod::MultiSignalLlm => "multi-signal + llm",
        }
    }
}

/// Raw signal values that produced a candidate's combined score
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalBreakdown {
    /// Cosine similarity reported by the similarity oracle
    pub embedding_similarity: f64,

    /// Keyword Jaccard score
    pub keyword_score: f64,

    /// Matched keywords (at most five)
    pub keyword_overlap: Vec<String>,

    /// Whether any quantity matched
    pub quantity_match: bool,

    /// Matched quantities formatted as `value unit`
    pub matched_quantities: Vec<String>,

    /// Variable-name score
    pub name_score: f64,

    /// Why the variable name matched
    pub name_reasons: Vec<String>,

    /// Additive id-hierarchy boost
    pub id_boost: f64,

    /// Weighted sum plus boost, clamped to [0, 1]
    pub combined_score: f64,
}

/// Decision recorded by the LLM adjudicator for one target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleVerdict {
    /// Confidence assigned by the oracle
    pub confidence: f64,

    /// Oracle rationale
    pub reasoning: String,
}

/// Evidence retained on a link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchDetails {
    /// Decision method
    pub method: LinkMethod,

    /// Signal breakdown (absent for deterministic links)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signals: Option<SignalBreakdown>,

    /// Oracle verdict when adjudicated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oracle: Option<OracleVerdict>,

    /// Why the heuristic fallback was used instead of the oracle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

impl MatchDetails {
    /// Details for a deterministic decomposition link
    pub fn deterministic() -> Self {
        Self {
            method: LinkMethod::Deterministic,
            signals: None,
            oracle: None,
            fallback_reason: None,
        }
    }
}

/// A directed, confidence-scored trace link
///
/// Deserialization goes through the same checks as [`Link::new`]: the
/// confidence must lie in [0, 1] and the stored status must match it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLink")]
pub struct Link {
    /// Link identifier (`LINK-…`)
    pub id: String,

    /// Upper-layer artifact
    pub source_id: String,

    /// Lower-layer artifact
    pub target_id: String,

    /// Relationship type
    pub link_type: LinkType,

    /// Confidence in [0, 1]
    pub confidence: f64,

    /// Status derived from confidence
    pub status: LinkStatus,

    /// Signal and oracle evidence
    pub match_details: MatchDetails,

    /// Human-readable justification
    pub rationale: String,

    /// Creation time (seconds since epoch)
    pub created_at: u64,

    /// Creator
    pub created_by: String,
}

impl Link {
    /// Create a link, validating its confidence
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        link_type: LinkType,
        confidence: f64,
        match_details: MatchDetails,
        rationale: impl Into<String>,
    ) -> Result<Self, DomainError> {
        check_confidence(confidence)?;

        Ok(Self {
            id: new_link_id(),
            source_id: source_id.into(),
            target_id: target_id.into(),
            link_type,
            confidence,
            status: LinkStatus::from_confidence(confidence),
            match_details,
            rationale: rationale.into(),
            created_at: now_secs(),
            created_by: AUTO_AUTHOR.to_string(),
        })
    }

    /// Deterministic decomposition link at confidence 1.0
    pub fn decomposition(parent_id: &str, child_id: &str) -> Self {
        Self {
            id: new_link_id(),
            source_id: parent_id.to_string(),
            target_id: child_id.to_string(),
            link_type: LinkType::Decomposes,
            confidence: 1.0,
            status: LinkStatus::Confirmed,
            match_details: MatchDetails::deterministic(),
            rationale: format!("{} is a decomposed part of {}", child_id, parent_id),
            created_at: now_secs(),
            created_by: AUTO_AUTHOR.to_string(),
        }
    }

    /// Whether the oracle took part in this decision
    pub fn is_adjudicated(&self) -> bool {
        self.match_details.method == LinkMethod::MultiSignalLlm
    }
}

/// Wire form of a link, validated into [`Link`]
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLink {
    id: String,
    source_id: String,
    target_id: String,
    link_type: LinkType,
    confidence: f64,
    status: LinkStatus,
    match_details: MatchDetails,
    rationale: String,
    created_at: u64,
    created_by: String,
}

impl TryFrom<RawLink> for Link {
    type Error = DomainError;

    fn try_from(raw: RawLink) -> Result<Self, Self::Error> {
        check_confidence(raw.confidence)?;
        if raw.status != LinkStatus::from_confidence(raw.confidence) {
            return Err(DomainError::StatusMismatch {
                id: raw.id,
                confidence: raw.confidence,
            });
        }

        Ok(Self {
            id: raw.id,
            source_id: raw.source_id,
            target_id: raw.target_id,
            link_type: raw.link_type,
            confidence: raw.confidence,
            status: raw.status,
            match_details: raw.match_details,
            rationale: raw.rationale,
            created_at: raw.created_at,
            created_by: raw.created_by,
        })
    }
}

fn check_confidence(confidence: f64) -> Result<(), DomainError> {
    if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
        return Err(DomainError::InvalidConfidence(confidence));
    }
    Ok(())
}

fn new_link_id() -> String {
    // The tail of a v7 uuid is random; the head is a timestamp
    let hex = Uuid::now_v7().simple().to_string();
    format!("LINK-{}", &hex[hex.len() - 12..])
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heuristic() -> MatchDetails {
        MatchDetails {
            method: LinkMethod::MultiSignal,
            signals: Some(SignalBreakdown::default()),
            oracle: None,
            fallback_reason: None,
        }
    }

    #[test]
    fn test_status_from_confidence() {
        assert_eq!(LinkStatus::from_confidence(0.7), LinkStatus::Confirmed);
        assert_eq!(LinkStatus::from_confidence(0.69), LinkStatus::Candidate);
    }

    #[test]
    fn test_new_link_validates_confidence() {
        assert!(Link::new("HLR-001", "LLR-001", LinkType::Implements, 0.5, heuristic(), "r").is_ok());
        assert_eq!(
            Link::new("HLR-001", "LLR-001", LinkType::Implements, 1.5, heuristic(), "r").unwrap_err(),
            DomainError::InvalidConfidence(1.5)
        );
        assert!(Link::new("a", "b", LinkType::Implements, f64::NAN, heuristic(), "r").is_err());
    }

    #[test]
    fn test_decomposition_link() {
        let link = Link::decomposition("SYS-001", "SYS-001-A");
        assert_eq!(link.link_type, LinkType::Decomposes);
        assert_eq!(link.confidence, 1.0);
        assert_eq!(link.status, LinkStatus::Confirmed);
        assert_eq!(link.match_details.method, LinkMethod::Deterministic);
        assert_eq!(link.created_by, "auto");
    }

    #[test]
    fn test_link_ids_are_unique() {
        let a = Link::decomposition("SYS-001", "SYS-001-A");
        let b = Link::decomposition("SYS-001", "SYS-001-A");
        assert!(a.id.starts_with("LINK-"));
        assert_ne!(a.id, b.id);
    }

    fn link_json(confidence: f64, status: &str) -> String {
        format!(
            r#"{{"id":"LINK-1","source_id":"HLR-001","target_id":"LLR-001","link_type":"implements","confidence":{},"status":"{}","match_details":{{"method":"multi-signal"}},"rationale":"r","created_at":0,"created_by":"auto"}}"#,
            confidence, status
        )
    }

    #[test]
    fn test_deserialize_valid_link() {
        let link: Link = serde_json::from_str(&link_json(0.82, "confirmed")).unwrap();
        assert_eq!(link.confidence, 0.82);
        assert_eq!(link.status, LinkStatus::Confirmed);

        let link = Link::new("HLR-001", "LLR-001", LinkType::Implements, 0.4, heuristic(), "r").unwrap();
        let back: Link = serde_json::from_str(&serde_json::to_string(&link).unwrap()).unwrap();
        assert_eq!(back, link);
    }

    #[test]
    fn test_deserialize_rejects_confidence_out_of_range() {
        let err = serde_json::from_str::<Link>(&link_json(3.5, "candidate")).unwrap_err();
        assert!(err.to_string().contains("confidence 3.5"));
        assert!(serde_json::from_str::<Link>(&link_json(-0.1, "candidate")).is_err());
    }

    #[test]
    fn test_deserialize_rejects_inconsistent_status() {
        let err = serde_json::from_str::<Link>(&link_json(0.9, "candidate")).unwrap_err();
        assert!(err.to_string().contains("LINK-1"));
        assert!(serde_json::from_str::<Link>(&link_json(0.2, "confirmed")).is_err());
    }

    #[test]
    fn test_deserialize_rejects_unknown_fields() {
        let json = link_json(0.5, "candidate").replace(r#""created_by":"auto""#, r#""created_by":"auto","extra":1"#);
        assert!(serde_json::from_str::<Link>(&json).is_err());
    }

    #[test]
    fn test_method_serialization() {
        let json = serde_json::to_string(&LinkMethod::MultiSignalLlm).unwrap();
        assert_eq!(json, "\"multi-signal + llm\"");
        let json = serde_json::to_string(&LinkType::References).unwrap();
        assert_eq!(json, "\"references\"");
    }
}
