//! Artifact module - typed records for every layer of the hierarchy

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// Layer of an artifact in the traceability hierarchy
///
/// The hierarchy is fixed:
/// `SYSTEM_REQ → SYSTEM_REQ_DECOMPOSED → HLR → LLR → CODE_VAR`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtifactKind {
    /// Top-level system requirement
    SystemReq,

    /// Atomic part of a system requirement
    SystemReqDecomposed,

    /// High-level requirement
    Hlr,

    /// Low-level requirement
    Llr,

    /// Implementation variable
    CodeVar,
}

impl ArtifactKind {
    /// Every kind, ordered from the top of the hierarchy down
    pub const ALL: [ArtifactKind; 5] = [
        ArtifactKind::SystemReq,
        ArtifactKind::SystemReqDecomposed,
        ArtifactKind::Hlr,
        ArtifactKind::Llr,
        ArtifactKind::CodeVar,
    ];

    /// Get the kind name as it appears in exchanged records
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::SystemReq => "SYSTEM_REQ",
            ArtifactKind::SystemReqDecomposed => "SYSTEM_REQ_DECOMPOSED",
            ArtifactKind::Hlr => "HLR",
            ArtifactKind::Llr => "LLR",
            ArtifactKind::CodeVar => "CODE_VAR",
        }
    }

    /// Parse a kind from its record name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "SYSTEM_REQ" => Some(ArtifactKind::SystemReq),
            "SYSTEM_REQ_DECOMPOSED" => Some(ArtifactKind::SystemReqDecomposed),
            "HLR" => Some(ArtifactKind::Hlr),
            "LLR" => Some(ArtifactKind::Llr),
            "CODE_VAR" => Some(ArtifactKind::CodeVar),
            _ => None,
        }
    }

    /// Position in the hierarchy (0 = system requirement)
    pub fn level(&self) -> usize {
        match self {
            ArtifactKind::SystemReq => 0,
            ArtifactKind::SystemReqDecomposed => 1,
            ArtifactKind::Hlr => 2,
            ArtifactKind::Llr => 3,
            ArtifactKind::CodeVar => 4,
        }
    }

    /// Kind expected one layer down
    pub fn child(&self) -> Option<Self> {
        match self {
            ArtifactKind::SystemReq => Some(ArtifactKind::SystemReqDecomposed),
            ArtifactKind::SystemReqDecomposed => Some(ArtifactKind::Hlr),
            ArtifactKind::Hlr => Some(ArtifactKind::Llr),
            ArtifactKind::Llr => Some(ArtifactKind::CodeVar),
            ArtifactKind::CodeVar => None,
        }
    }

    /// Kind expected one layer up
    pub fn parent(&self) -> Option<Self> {
        match self {
            ArtifactKind::SystemReq => None,
            ArtifactKind::SystemReqDecomposed => Some(ArtifactKind::SystemReq),
            ArtifactKind::Hlr => Some(ArtifactKind::SystemReqDecomposed),
            ArtifactKind::Llr => Some(ArtifactKind::Hlr),
            ArtifactKind::CodeVar => Some(ArtifactKind::Llr),
        }
    }

    /// Number of nodes in a complete chain rooted at this kind
    pub fn expected_chain_depth(&self) -> usize {
        ArtifactKind::ALL.len() - self.level()
    }

    /// Whether an artifact of this kind is an orphan without a parent link
    pub fn requires_parent(&self) -> bool {
        matches!(self, ArtifactKind::Hlr | ArtifactKind::Llr | ArtifactKind::CodeVar)
    }

    /// Whether an artifact of this kind is a dead end without child links
    pub fn requires_children(&self) -> bool {
        !matches!(self, ArtifactKind::CodeVar)
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ArtifactKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| DomainError::UnknownKind(s.to_string()))
    }
}

/// Value half of an extracted quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuantityValue {
    /// Numeric value
    Number(f64),

    /// Non-numeric value (never matches anything)
    Text(String),
}

/// A `(value, unit)` pair extracted from artifact text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    /// Magnitude
    pub value: QuantityValue,

    /// Unit as written in the source text
    #[serde(default)]
    pub unit: String,
}

impl Quantity {
    /// Create a numeric quantity
    pub fn number(value: f64, unit: impl Into<String>) -> Self {
        Self {
            value: QuantityValue::Number(value),
            unit: unit.into(),
        }
    }
}

/// Signals extracted from artifact text during ingestion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractedSignals {
    /// Domain keywords
    pub keywords: BTreeSet<String>,

    /// Numeric quantities with units
    pub quantities: Vec<Quantity>,

    /// Identifier-like tokens referenced by the text
    pub referenced_ids: BTreeSet<String>,
}

impl ExtractedSignals {
    /// True when nothing was extracted
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty() && self.quantities.is_empty() && self.referenced_ids.is_empty()
    }
}

/// A requirement or variable participating in the trace graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Artifact {
    /// Unique identifier (e.g. `HLR-001-A`)
    pub id: String,

    /// Layer in the hierarchy
    #[serde(rename = "type")]
    pub kind: ArtifactKind,

    /// Requirement statement or variable description
    pub text: String,

    /// Variable name (CODE_VAR only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Free-form ingestion metadata
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,

    /// Extracted text signals
    #[serde(default)]
    pub extracted: ExtractedSignals,

    /// Whether this system requirement has been decomposed
    #[serde(default)]
    pub decomposed: bool,

    /// Decomposed children, in order
    #[serde(default)]
    pub children: Vec<String>,
}

impl Artifact {
    /// Create a validated artifact with no extracted signals
    pub fn new(
        id: impl Into<String>,
        kind: ArtifactKind,
        text: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let artifact = Self {
            id: id.into(),
            kind,
            text: text.into(),
            name: None,
            metadata: BTreeMap::new(),
            extracted: ExtractedSignals::default(),
            decomposed: false,
            children: Vec::new(),
        };
        artifact.validate()?;
        Ok(artifact)
    }

    /// Set the variable name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the extracted signals
    pub fn with_extracted(mut self, extracted: ExtractedSignals) -> Self {
        self.extracted = extracted;
        self
    }

    /// Add a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Check construction invariants
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.id.trim().is_empty() {
            return Err(DomainError::EmptyId);
        }
        if self.text.trim().is_empty() {
            return Err(DomainError::EmptyText { id: self.id.clone() });
        }
        Ok(())
    }
}

/// Ordered collection of artifacts indexed by id
///
/// Iteration follows insertion order so every analysis over the set is
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Artifact>", into = "Vec<Artifact>")]
pub struct ArtifactSet {
    artifacts: Vec<Artifact>,
    index: HashMap<String, usize>,
}

impl ArtifactSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set, validating every artifact and rejecting duplicate ids
    pub fn from_artifacts(
        artifacts: impl IntoIterator<Item = Artifact>,
    ) -> Result<Self, DomainError> {
        let mut set = Self::new();
        for artifact in artifacts {
            set.insert(artifact)?;
        }
        Ok(set)
    }

    /// Add an artifact
    pub fn insert(&mut self, artifact: Artifact) -> Result<(), DomainError> {
        artifact.validate()?;
        if self.index.contains_key(&artifact.id) {
            return Err(DomainError::DuplicateId(artifact.id));
        }
        self.index.insert(artifact.id.clone(), self.artifacts.len());
        self.artifacts.push(artifact);
        Ok(())
    }

    /// Look up an artifact by id
    pub fn get(&self, id: &str) -> Option<&Artifact> {
        self.index.get(id).map(|&i| &self.artifacts[i])
    }

    /// Kind of the artifact with this id
    pub fn kind_of(&self, id: &str) -> Option<ArtifactKind> {
        self.get(id).map(|a| a.kind)
    }

    /// Whether an artifact with this id exists
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Number of artifacts
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.iter()
    }

    /// Iterate over artifacts of one kind, in insertion order
    pub fn of_kind(&self, kind: ArtifactKind) -> impl Iterator<Item = &Artifact> {
        self.artifacts.iter().filter(move |a| a.kind == kind)
    }

    /// Count artifacts of one kind
    pub fn count_of(&self, kind: ArtifactKind) -> usize {
        self.of_kind(kind).count()
    }

    /// Replace extracted signals in place
    ///
    /// `fill` sees each artifact in insertion order and returns the new
    /// signals, or `None` to leave it unchanged. Identity fields stay out of
    /// reach so the id index cannot drift. Returns how many were updated.
    pub fn update_signals<F>(&mut self, mut fill: F) -> usize
    where
        F: FnMut(&Artifact) -> Option<ExtractedSignals>,
    {
        let mut updated = 0;
        for artifact in &mut self.artifacts {
            if let Some(signals) = fill(&*artifact) {
                artifact.extracted = signals;
                updated += 1;
            }
        }
        updated
    }

    /// Append a decomposed part to a system requirement
    ///
    /// The part is named `{parent}-{suffix}`, inserted as a
    /// `SYSTEM_REQ_DECOMPOSED` artifact, and recorded in the parent's
    /// `children`. Returns the new part's id.
    pub fn add_decomposed_part(
        &mut self,
        parent_id: &str,
        suffix: &str,
        text: impl Into<String>,
    ) -> Result<String, DomainError> {
        let parent_index = *self
            .index
            .get(parent_id)
            .ok_or_else(|| DomainError::UnknownArtifact(parent_id.to_string()))?;

        let parent_kind = self.artifacts[parent_index].kind;
        if parent_kind != ArtifactKind::SystemReq {
            return Err(DomainError::WrongKind {
                id: parent_id.to_string(),
                expected: ArtifactKind::SystemReq.to_string(),
                actual: parent_kind.to_string(),
            });
        }

        let child_id = crate::id_hierarchy::child_id(parent_id, suffix);
        let child = Artifact::new(child_id.clone(), ArtifactKind::SystemReqDecomposed, text)?
            .with_metadata("parent_id", parent_id);
        self.insert(child)?;

        let parent = &mut self.artifacts[parent_index];
        parent.decomposed = true;
        parent.children.push(child_id.clone());
        Ok(child_id)
    }

    /// Add metadata entries to an existing artifact
    ///
    /// Existing keys are overwritten.
    pub fn annotate<K, V>(
        &mut self,
        id: &str,
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> Result<(), DomainError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let index = *self
            .index
            .get(id)
            .ok_or_else(|| DomainError::UnknownArtifact(id.to_string()))?;
        let metadata = &mut self.artifacts[index].metadata;
        for (key, value) in entries {
            metadata.insert(key.into(), value.into());
        }
        Ok(())
    }
}

impl TryFrom<Vec<Artifact>> for ArtifactSet {
    type Error = DomainError;

    fn try_from(artifacts: Vec<Artifact>) -> Result<Self, Self::Error> {
        Self::from_artifacts(artifacts)
    }
}

impl From<ArtifactSet> for Vec<Artifact> {
    fn from(set: ArtifactSet) -> Self {
        set.artifacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hlr(id: &str) -> Artifact {
        Artifact::new(id, ArtifactKind::Hlr, "The BCU shall compute wheel slip").unwrap()
    }

    #[test]
    fn test_kind_hierarchy() {
        assert_eq!(ArtifactKind::SystemReq.child(), Some(ArtifactKind::SystemReqDecomposed));
        assert_eq!(ArtifactKind::Llr.child(), Some(ArtifactKind::CodeVar));
        assert_eq!(ArtifactKind::CodeVar.child(), None);
        assert_eq!(ArtifactKind::Hlr.parent(), Some(ArtifactKind::SystemReqDecomposed));
        assert_eq!(ArtifactKind::SystemReq.parent(), None);
    }

    #[test]
    fn test_expected_chain_depths() {
        assert_eq!(ArtifactKind::SystemReq.expected_chain_depth(), 5);
        assert_eq!(ArtifactKind::SystemReqDecomposed.expected_chain_depth(), 4);
        assert_eq!(ArtifactKind::Hlr.expected_chain_depth(), 3);
        assert_eq!(ArtifactKind::Llr.expected_chain_depth(), 2);
        assert_eq!(ArtifactKind::CodeVar.expected_chain_depth(), 1);
    }

    #[test]
    fn test_kind_parse_round_trip() {
        for kind in ArtifactKind::ALL {
            assert_eq!(ArtifactKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ArtifactKind::parse("hlr"), Some(ArtifactKind::Hlr));
        assert!("REQ".parse::<ArtifactKind>().is_err());
    }

    #[test]
    fn test_orphan_rules() {
        assert!(!ArtifactKind::SystemReq.requires_parent());
        assert!(!ArtifactKind::SystemReqDecomposed.requires_parent());
        assert!(ArtifactKind::CodeVar.requires_parent());
        assert!(ArtifactKind::Llr.requires_children());
        assert!(!ArtifactKind::CodeVar.requires_children());
    }

    #[test]
    fn test_artifact_validation() {
        assert_eq!(
            Artifact::new("  ", ArtifactKind::Hlr, "text").unwrap_err(),
            DomainError::EmptyId
        );
        assert!(matches!(
            Artifact::new("HLR-001", ArtifactKind::Hlr, ""),
            Err(DomainError::EmptyText { .. })
        ));
    }

    #[test]
    fn test_set_rejects_duplicates() {
        let mut set = ArtifactSet::new();
        set.insert(hlr("HLR-001")).unwrap();
        assert_eq!(
            set.insert(hlr("HLR-001")).unwrap_err(),
            DomainError::DuplicateId("HLR-001".to_string())
        );
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_set_preserves_insertion_order() {
        let set = ArtifactSet::from_artifacts(vec![hlr("HLR-003"), hlr("HLR-001"), hlr("HLR-002")])
            .unwrap();
        let ids: Vec<_> = set.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["HLR-003", "HLR-001", "HLR-002"]);
    }

    #[test]
    fn test_update_signals_keeps_index_intact() {
        let mut set = ArtifactSet::from_artifacts(vec![hlr("HLR-001"), hlr("HLR-002")]).unwrap();
        let updated = set.update_signals(|a| {
            (a.id == "HLR-002").then(|| ExtractedSignals {
                keywords: ["slip".to_string()].into_iter().collect(),
                ..Default::default()
            })
        });

        assert_eq!(updated, 1);
        assert!(set.get("HLR-001").unwrap().extracted.is_empty());
        assert!(set.get("HLR-002").unwrap().extracted.keywords.contains("slip"));
        let ids: Vec<_> = set.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["HLR-001", "HLR-002"]);
    }

    #[test]
    fn test_add_decomposed_part() {
        let mut set = ArtifactSet::new();
        set.insert(Artifact::new("SYS-001", ArtifactKind::SystemReq, "Braking shall be safe").unwrap())
            .unwrap();

        let child = set.add_decomposed_part("SYS-001", "A", "Slip shall be limited").unwrap();
        assert_eq!(child, "SYS-001-A");

        let parent = set.get("SYS-001").unwrap();
        assert!(parent.decomposed);
        assert_eq!(parent.children, vec!["SYS-001-A".to_string()]);
        assert_eq!(set.kind_of("SYS-001-A"), Some(ArtifactKind::SystemReqDecomposed));
    }

    #[test]
    fn test_annotate() {
        let mut set = ArtifactSet::new();
        set.insert(Artifact::new("SYS-001", ArtifactKind::SystemReq, "Braking shall be safe").unwrap())
            .unwrap();
        let child = set.add_decomposed_part("SYS-001", "A", "Slip shall be limited").unwrap();

        set.annotate(&child, [("aspect", "safety")]).unwrap();
        let metadata = &set.get(&child).unwrap().metadata;
        assert_eq!(metadata.get("aspect").map(String::as_str), Some("safety"));
        assert_eq!(metadata.get("parent_id").map(String::as_str), Some("SYS-001"));

        assert_eq!(
            set.annotate("SYS-404", [("aspect", "safety")]),
            Err(DomainError::UnknownArtifact("SYS-404".to_string()))
        );
    }

    #[test]
    fn test_add_decomposed_part_requires_system_req() {
        let mut set = ArtifactSet::new();
        set.insert(hlr("HLR-001")).unwrap();
        assert!(matches!(
            set.add_decomposed_part("HLR-001", "A", "text"),
            Err(DomainError::WrongKind { .. })
        ));
        assert!(matches!(
            set.add_decomposed_part("SYS-404", "A", "text"),
            Err(DomainError::UnknownArtifact(_))
        ));
    }

    #[test]
    fn test_artifact_json_shape() {
        let json = r#"[{
            "id": "VAR-007",
            "type": "CODE_VAR",
            "text": "Commanded brake pressure",
            "name": "brake_pressure_cmd",
            "extracted": {
                "keywords": ["brake", "pressure"],
                "quantities": [{"value": 3000, "unit": "psi"}, {"value": "max", "unit": ""}]
            }
        }]"#;

        let set: ArtifactSet = serde_json::from_str(json).unwrap();
        let var = set.get("VAR-007").unwrap();
        assert_eq!(var.kind, ArtifactKind::CodeVar);
        assert_eq!(var.name.as_deref(), Some("brake_pressure_cmd"));
        assert_eq!(var.extracted.quantities[0], Quantity::number(3000.0, "psi"));
        assert!(matches!(var.extracted.quantities[1].value, QuantityValue::Text(_)));
    }

    #[test]
    fn test_artifact_json_rejects_unknown_fields() {
        let json = r#"[{"id": "HLR-001", "type": "HLR", "text": "x", "owner": "me"}]"#;
        assert!(serde_json::from_str::<ArtifactSet>(json).is_err());
    }

    #[test]
    fn test_artifact_json_rejects_duplicates() {
        let json = r#"[
            {"id": "HLR-001", "type": "HLR", "text": "a"},
            {"id": "HLR-001", "type": "HLR", "text": "b"}
        ]"#;
        assert!(serde_json::from_str::<ArtifactSet>(json).is_err());
    }
}
