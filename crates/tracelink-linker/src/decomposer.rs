//! Splitting system requirements into atomic parts
//!
//! Every `SYSTEM_REQ` without recorded children gets at least one
//! `SYSTEM_REQ_DECOMPOSED` part, so stage 1 of the linker always has
//! something to link. Requirements that look atomic are copied whole into a
//! single `-A` part. Complex ones are split by the LLM oracle when one is
//! attached; without an oracle, or when its answer is unusable, they are
//! copied whole as well.

use crate::error::{DecompositionError, LinkerError};
use crate::parser::extract_json;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use tracelink_domain::id_hierarchy::child_id;
use tracelink_domain::{Artifact, ArtifactKind, ArtifactSet};
use tracelink_gatekeeper::TextExtractor;
use tracelink_llm::{generate_limited, ApiCallTracker, RateLimitConfig, RateLimiter, SharedProvider};
use tracing::{debug, info, warn};

/// Purpose label for decomposition calls
pub const DECOMPOSITION: &str = "decomposition";

/// Suffix of the single part created for a requirement kept whole
pub const ATOMIC_SUFFIX: &str = "A";

/// Text longer than this is treated as complex
const COMPLEX_TEXT_CHARS: usize = 150;

const CONJUNCTIONS: &[&str] = &["and", "or"];

const CONDITION_WORDS: &[&str] = &["when", "upon", "if", "under", "during", "while"];

/// JSON shape the oracle must return
pub const DECOMPOSITION_SCHEMA: &str = r#"{
  "type": "object",
  "properties": {
    "decomposition_rationale": {"type": "string"},
    "sub_requirements": {
      "type": "array",
      "items": {
        "type": "object",
        "properties": {
          "suffix": {"type": "string"},
          "text": {"type": "string"},
          "aspect": {"type": "string"},
          "testable": {"type": "boolean"},
          "test_approach": {"type": "string"}
        },
        "required": ["suffix", "text"]
      }
    }
  },
  "required": ["sub_requirements"]
}"#;

const DECOMPOSITION_INSTRUCTIONS: &str = "You are an aerospace engineer decomposing system requirements for DO-178C compliance.

Rules:
1. ONE testable condition per sub-requirement
2. Use \"shall\" in every sub-requirement
3. Split on \"and\"/\"or\", multiple values, conditions, actors or modes
4. If the requirement is already atomic, return a single sub-requirement";

const RESPONSE_EXAMPLE: &str = r#"{
  "decomposition_rationale": "Brief why/how split",
  "sub_requirements": [
    {
      "suffix": "A",
      "text": "The component shall ...",
      "aspect": "functionality|performance|timing|interface|safety|constraint",
      "testable": true,
      "test_approach": "verification method"
    }
  ]
}"#;

/// Whether a requirement text should be split
///
/// Complex means any of: a conjunction, more than one quantity, more than
/// one distinct condition word, or more than 150 characters.
pub fn is_complex(text: &str, quantity_count: usize) -> bool {
    let lower = text.to_lowercase();
    let words: BTreeSet<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    if CONJUNCTIONS.iter().any(|w| words.contains(w)) {
        return true;
    }
    if quantity_count > 1 {
        return true;
    }
    if CONDITION_WORDS.iter().filter(|w| words.contains(*w)).count() > 1 {
        return true;
    }
    text.chars().count() > COMPLEX_TEXT_CHARS
}

/// Build the prompt asking the oracle to split `requirement`
pub fn decomposition_prompt(requirement: &Artifact) -> String {
    let category = requirement
        .metadata
        .get("category")
        .map(String::as_str)
        .unwrap_or("General");

    let mut prompt = String::new();
    prompt.push_str(DECOMPOSITION_INSTRUCTIONS);
    prompt.push_str("\n\n");
    prompt.push_str(&format!("ID: {}\n", requirement.id));
    prompt.push_str(&format!("Text: \"{}\"\n", requirement.text));
    prompt.push_str(&format!("Category: {}\n\n", category));
    prompt.push_str("Respond with JSON only:\n");
    prompt.push_str(RESPONSE_EXAMPLE);
    prompt
}

/// Counters for a decomposition pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecompositionStats {
    /// System requirements examined
    pub requirements: usize,

    /// Requirements that arrived with children
    pub already_decomposed: usize,

    /// Requirements kept whole because they look atomic
    pub atomic: usize,

    /// Requirements split by the oracle
    pub split: usize,

    /// Complex requirements kept whole (no oracle or unusable answer)
    pub fallbacks: usize,

    /// Requirements left alone because a part id was already taken
    pub skipped: usize,

    /// Parts created
    pub parts_created: usize,
}

impl DecompositionStats {
    /// Generate a summary report
    pub fn summary(&self) -> String {
        [
            "Decomposition Summary".to_string(),
            "=====================".to_string(),
            format!("System requirements: {}", self.requirements),
            format!("Already decomposed: {}", self.already_decomposed),
            format!("Atomic: {}", self.atomic),
            format!("Split by oracle: {}", self.split),
            format!("Kept whole (fallback): {}", self.fallbacks),
            format!("Skipped: {}", self.skipped),
            format!("Parts created: {}", self.parts_created),
        ]
        .join("\n")
    }
}

/// Result of a decomposition pass
#[derive(Debug, Clone)]
pub struct DecompositionRun {
    /// Per-outcome counters
    pub stats: DecompositionStats,

    /// Oracle usage
    pub api_calls: ApiCallTracker,
}

/// A part about to be added under a system requirement
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPart {
    /// Id suffix (`A`, `B`, ...)
    pub suffix: String,

    /// Part text
    pub text: String,

    /// Metadata recorded on the part
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Outcome {
    Atomic,
    Split,
    Fallback,
}

#[derive(Deserialize)]
struct RawDecomposition {
    #[serde(default)]
    decomposition_rationale: String,
    sub_requirements: Vec<RawPart>,
}

#[derive(Deserialize)]
struct RawPart {
    suffix: String,
    text: String,
    #[serde(default)]
    aspect: Option<String>,
    #[serde(default)]
    testable: Option<bool>,
    #[serde(default)]
    test_approach: String,
}

struct Oracle {
    provider: SharedProvider,
    limiter: RateLimiter,
}

/// Creates `SYSTEM_REQ_DECOMPOSED` parts for undecomposed system requirements
pub struct Decomposer {
    extractor: TextExtractor,
    oracle: Option<Oracle>,
    tracker: ApiCallTracker,
}

impl Decomposer {
    /// Create a decomposer that keeps every requirement whole
    pub fn new() -> Result<Self, LinkerError> {
        Ok(Self {
            extractor: TextExtractor::new()?,
            oracle: None,
            tracker: ApiCallTracker::new(),
        })
    }

    /// Let the LLM split complex requirements
    pub fn with_oracle(
        mut self,
        provider: SharedProvider,
        rate_limit: RateLimitConfig,
    ) -> Result<Self, LinkerError> {
        rate_limit.validate().map_err(LinkerError::Config)?;
        self.oracle = Some(Oracle {
            provider,
            limiter: RateLimiter::new(rate_limit),
        });
        Ok(self)
    }

    /// Oracle usage so far
    pub fn tracker(&self) -> &ApiCallTracker {
        &self.tracker
    }

    /// Whether `requirement` should be split
    ///
    /// Quantities come from the extracted signals, or from the text when
    /// nothing has been extracted yet.
    pub fn is_complex(&self, requirement: &Artifact) -> bool {
        let quantities = if requirement.extracted.is_empty() {
            self.extractor.extract_quantities(&requirement.text).len()
        } else {
            requirement.extracted.quantities.len()
        };
        is_complex(&requirement.text, quantities)
    }

    /// Decompose every system requirement that has no children yet
    ///
    /// New parts get text signals extracted before returning.
    pub async fn decompose_all(
        &mut self,
        artifacts: &mut ArtifactSet,
    ) -> Result<DecompositionRun, LinkerError> {
        let requirements: Vec<Artifact> = artifacts.of_kind(ArtifactKind::SystemReq).cloned().collect();
        info!("Decomposing {} system requirements", requirements.len());
        let mut stats = DecompositionStats::default();

        for requirement in &requirements {
            stats.requirements += 1;
            if requirement.decomposed || !requirement.children.is_empty() {
                stats.already_decomposed += 1;
                continue;
            }

            let (outcome, parts) = self.plan(requirement).await;
            if let Some(taken) = parts
                .iter()
                .map(|p| child_id(&requirement.id, &p.suffix))
                .find(|id| artifacts.contains(id))
            {
                warn!(
                    "Skipping decomposition of {}: {} already exists",
                    requirement.id, taken
                );
                stats.skipped += 1;
                continue;
            }

            match outcome {
                Outcome::Atomic => stats.atomic += 1,
                Outcome::Split => stats.split += 1,
                Outcome::Fallback => stats.fallbacks += 1,
            }
            for part in parts {
                let id = artifacts.add_decomposed_part(&requirement.id, &part.suffix, part.text)?;
                artifacts.annotate(&id, part.metadata)?;
                stats.parts_created += 1;
            }
        }

        let enriched = self.extractor.enrich(artifacts);
        debug!("Extracted signals for {} artifacts", enriched);
        if let Some(oracle) = &self.oracle {
            debug!(
                "Decomposition oracle: {} attempts, {} retries",
                oracle.limiter.attempts(),
                oracle.limiter.retries()
            );
        }
        info!(
            "Decomposition complete: {} parts from {} requirements",
            stats.parts_created,
            stats.requirements - stats.already_decomposed - stats.skipped
        );

        Ok(DecompositionRun {
            stats,
            api_calls: self.tracker.clone(),
        })
    }

    async fn plan(&mut self, requirement: &Artifact) -> (Outcome, Vec<PlannedPart>) {
        if !self.is_complex(requirement) {
            return (
                Outcome::Atomic,
                vec![whole(requirement, "decomposition_reason", "Already atomic")],
            );
        }

        let Some(oracle) = self.oracle.as_mut() else {
            debug!("{} looks complex but no oracle is attached", requirement.id);
            return (
                Outcome::Fallback,
                vec![whole(requirement, "decomposition_reason", "No oracle attached")],
            );
        };

        match oracle.split(&mut self.tracker, requirement).await {
            Ok(parts) => {
                debug!("{} split into {} parts", requirement.id, parts.len());
                (Outcome::Split, parts)
            }
            Err(e) => {
                warn!("Decomposition of {} fell back to a single part: {}", requirement.id, e);
                (
                    Outcome::Fallback,
                    vec![whole(requirement, "decomposition_error", &e.to_string())],
                )
            }
        }
    }
}

impl Oracle {
    async fn split(
        &mut self,
        tracker: &mut ApiCallTracker,
        requirement: &Artifact,
    ) -> Result<Vec<PlannedPart>, DecompositionError> {
        let prompt = decomposition_prompt(requirement);
        let response = match generate_limited(
            &mut self.limiter,
            &self.provider,
            &prompt,
            Some(DECOMPOSITION_SCHEMA),
        )
        .await
        {
            Ok(response) => {
                tracker.record_call(DECOMPOSITION, prompt.len(), response.len());
                response
            }
            Err(e) => {
                tracker.record_failure(DECOMPOSITION, prompt.len());
                return Err(e.into());
            }
        };

        parse_parts(requirement, &response)
    }
}

/// Parse and validate an oracle split of `requirement`
///
/// Suffixes are upper-cased and must be non-empty, alphanumeric and unique.
/// Each part inherits the requirement's metadata.
pub fn parse_parts(
    requirement: &Artifact,
    response: &str,
) -> Result<Vec<PlannedPart>, DecompositionError> {
    let json = extract_json(response).map_err(|e| DecompositionError::MalformedJson(e.to_string()))?;
    let raw: RawDecomposition = serde_json::from_str(&json)?;
    if raw.sub_requirements.is_empty() {
        return Err(DecompositionError::Empty);
    }

    let mut seen = BTreeSet::new();
    let mut parts = Vec::with_capacity(raw.sub_requirements.len());
    for part in raw.sub_requirements {
        let suffix = part.suffix.trim().to_uppercase();
        let invalid = |reason: &str| DecompositionError::InvalidPart {
            suffix: part.suffix.clone(),
            reason: reason.to_string(),
        };
        if suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(invalid("suffix must be letters or digits"));
        }
        if !seen.insert(suffix.clone()) {
            return Err(invalid("duplicate suffix"));
        }
        if part.text.trim().is_empty() {
            return Err(invalid("empty text"));
        }

        let mut metadata = requirement.metadata.clone();
        metadata.insert(
            "aspect".to_string(),
            part.aspect.unwrap_or_else(|| "general".to_string()),
        );
        metadata.insert("testable".to_string(), part.testable.unwrap_or(true).to_string());
        if !part.test_approach.is_empty() {
            metadata.insert("test_approach".to_string(), part.test_approach);
        }
        if !raw.decomposition_rationale.is_empty() {
            metadata.insert(
                "decomposition_rationale".to_string(),
                raw.decomposition_rationale.clone(),
            );
        }

        parts.push(PlannedPart {
            suffix,
            text: part.text.trim().to_string(),
            metadata,
        });
    }
    Ok(parts)
}

/// The requirement copied whole into a single part
fn whole(requirement: &Artifact, key: &str, note: &str) -> PlannedPart {
    let mut metadata = requirement.metadata.clone();
    metadata.insert("aspect".to_string(), "complete".to_string());
    metadata.insert(key.to_string(), note.to_string());
    PlannedPart {
        suffix: ATOMIC_SUFFIX.to_string(),
        text: requirement.text.clone(),
        metadata,
    }
}
