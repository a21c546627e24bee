//! Adjudication prompt construction

use crate::candidates::Candidate;
use tracelink_domain::{Artifact, ArtifactSet};

/// Characters of candidate text shown to the oracle
const CANDIDATE_TEXT_CHARS: usize = 200;

/// JSON shape the adjudicator must return
pub const RESPONSE_SCHEMA: &str = r#"{
  "type": "object",
  "properties": {
    "selected_targets": {
      "type": "array",
      "items": {
        "type": "object",
        "properties": {
          "target_id": {"type": "string"},
          "reasoning": {"type": "string"},
          "confidence": {"type": "number", "minimum": 0.0, "maximum": 1.0}
        },
        "required": ["target_id", "confidence"]
      }
    },
    "rejected_targets": {
      "type": "array",
      "items": {
        "type": "object",
        "properties": {
          "target_id": {"type": "string"},
          "reason": {"type": "string"}
        },
        "required": ["target_id"]
      }
    }
  },
  "required": ["selected_targets"]
}"#;

/// Builds the prompt asking the oracle which candidates implement a source
pub struct SelectionPrompt<'a> {
    source: &'a Artifact,
    candidates: &'a [Candidate],
    artifacts: &'a ArtifactSet,
}

impl<'a> SelectionPrompt<'a> {
    /// Create a prompt for `source` over `candidates`
    ///
    /// Candidate texts are looked up in `artifacts`.
    pub fn new(source: &'a Artifact, candidates: &'a [Candidate], artifacts: &'a ArtifactSet) -> Self {
        Self {
            source,
            candidates,
            artifacts,
        }
    }

    /// Build the complete prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(ANALYST_INSTRUCTIONS);
        prompt.push_str("\n\n");

        prompt.push_str("SOURCE REQUIREMENT:\n");
        prompt.push_str(&format!("ID: {}\n", self.source.id));
        prompt.push_str(&format!("Type: {}\n", self.source.kind));
        prompt.push_str(&format!("Text: {}\n\n", self.source.text));

        prompt.push_str("CANDIDATE TARGETS (scored by multi-signal matching):\n\n");
        for (i, candidate) in self.candidates.iter().enumerate() {
            let text = self
                .artifacts
                .get(&candidate.target_id)
                .map(|a| a.text.as_str())
                .unwrap_or("");
            let s = &candidate.signals;

            prompt.push_str(&format!(
                "{}. {} (Score: {:.2})\n",
                i + 1,
                candidate.target_id,
                candidate.score
            ));
            prompt.push_str(&format!("   Text: {}\n", truncate(text, CANDIDATE_TEXT_CHARS)));
            prompt.push_str("   Match Details:\n");
            prompt.push_str(&format!(
                "   - Embedding similarity: {:.2}\n",
                s.embedding_similarity
            ));
            prompt.push_str(&format!("   - Keyword score: {:.2}\n", s.keyword_score));
            if !s.keyword_overlap.is_empty() {
                prompt.push_str(&format!("   - Keywords: {}\n", s.keyword_overlap.join(", ")));
            }
            if s.quantity_match {
                prompt.push_str(&format!(
                    "   - Quantities matched: {}\n",
                    s.matched_quantities.join(", ")
                ));
            }
            if !s.name_reasons.is_empty() {
                prompt.push_str(&format!("   - Variable name: {}\n", s.name_reasons.join("; ")));
            }
            if s.id_boost > 0.0 {
                prompt.push_str(&format!("   - ID relationship boost: +{:.2}\n", s.id_boost));
            }
            prompt.push('\n');
        }

        prompt.push_str(
            "Analyze these candidates and select which ones ACTUALLY implement the source requirement.\n",
        );
        prompt.push_str("Respond in JSON format as specified above.");

        prompt
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut)
}

const ANALYST_INSTRUCTIONS: &str = r#"You are an expert aerospace requirements traceability analyst.

Decide which candidate requirements at the next level down ACTUALLY implement the source requirement.

A candidate implements the source when:
- It directly addresses what the source requires
- Key technical content agrees (terms, quantities, constraints)
- It is detailed enough to satisfy its part of the source
- The relationship holds beyond surface wording

Respond with valid JSON only (no comments, no text outside the JSON):
{
  "selected_targets": [
    {
      "target_id": "HLR-001-A",
      "reasoning": "Why this implements the source",
      "confidence": 0.85
    }
  ],
  "rejected_targets": [
    {
      "target_id": "HLR-002-B",
      "reason": "Why this was rejected"
    }
  ]
}

Rules:
- confidence is a decimal number between 0.0 and 1.0 (e.g. 0.85, 0.72)
- Never write confidence in words ("0.nine" is invalid, write 0.9)
- Only select candidates that truly implement the source
- Several candidates may implement one source
- Use 0.7 or above for a good match
- Reject candidates that are merely similar in wording"#;
