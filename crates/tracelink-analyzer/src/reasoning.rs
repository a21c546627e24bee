//! LLM explanations for detected gaps

use crate::config::AnalysisConfig;
use crate::error::AnalyzerError;
use crate::graph::TraceGraph;
use serde::Deserialize;
use serde_json::Value;
use std::fmt::Display;
use tracelink_domain::traits::SimilarityOracle;
use tracelink_domain::{ArtifactKind, ArtifactSet, Gap, GapReasoning, GapSubject};
use tracelink_llm::{generate_limited, ApiCallTracker, RateLimitConfig, RateLimiter, SharedProvider};
use tracing::{debug, info, warn};

/// Purpose label for gap explanation calls
pub const GAP_REASONING: &str = "gap_reasoning";

/// Root cause recorded when the explanation could not be produced
pub const ERROR_ROOT_CAUSE: &str = "error";

/// JSON shape requested from the model
pub const EXPLANATION_SCHEMA: &str = r#"{
  "type": "object",
  "properties": {
    "reasoning": {"type": "string"},
    "root_cause": {"type": "string", "enum": ["primary", "derived", "process", "data_quality", "other"]},
    "suggestions": {"type": "array", "items": {"type": "string"}}
  },
  "required": ["reasoning", "root_cause"]
}"#;

const ANALYST_ROLE: &str =
    "You are a DO-178C traceability gap analyst. Explain why the gap exists, judge its impact and suggest fixes.";

/// An artifact that resembles the gap's anchor but was not linked to it
#[derive(Debug, Clone, PartialEq)]
pub struct NearMiss {
    /// Candidate id
    pub candidate_id: String,
    /// Candidate kind
    pub kind: ArtifactKind,
    /// Oracle similarity
    pub similarity: f32,
    /// Candidate text, truncated
    pub text: String,
}

impl NearMiss {
    fn label(&self) -> String {
        format!(
            "{} ({}, similarity: {:.2})",
            self.candidate_id, self.kind, self.similarity
        )
    }
}

#[derive(Debug, Deserialize)]
struct RawExplanation {
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    root_cause: Option<String>,
    #[serde(default)]
    suggestions: Vec<Value>,
}

/// Explains gaps with the LLM oracle
///
/// Failures are recorded on the gap with root cause `"error"`; they never
/// abort the analysis.
pub struct GapExplainer {
    provider: SharedProvider,
    limiter: RateLimiter,
    tracker: ApiCallTracker,
    near_miss_threshold: f32,
    near_miss_top: usize,
}

impl GapExplainer {
    /// Create an explainer over a shared provider
    pub fn new(
        provider: SharedProvider,
        rate_limit: RateLimitConfig,
        config: &AnalysisConfig,
    ) -> Result<Self, AnalyzerError> {
        rate_limit.validate().map_err(AnalyzerError::Config)?;
        config.validate()?;
        Ok(Self {
            provider,
            limiter: RateLimiter::new(rate_limit),
            tracker: ApiCallTracker::new(),
            near_miss_threshold: config.near_miss_threshold,
            near_miss_top: config.near_miss_top,
        })
    }

    /// Oracle usage so far
    pub fn tracker(&self) -> &ApiCallTracker {
        &self.tracker
    }

    /// Artifacts most similar to `anchor_id`, excluding itself
    pub fn near_misses<O>(&self, oracle: &O, anchor_id: &str, artifacts: &ArtifactSet) -> Vec<NearMiss>
    where
        O: SimilarityOracle,
        O::Error: Display,
    {
        let Some(embedding) = oracle.embedding_of(anchor_id) else {
            return Vec::new();
        };
        let neighbours = match oracle.search(embedding, self.near_miss_top * 2, self.near_miss_threshold) {
            Ok(neighbours) => neighbours,
            Err(e) => {
                warn!("Near-miss search failed for {}: {}", anchor_id, e);
                return Vec::new();
            }
        };

        neighbours
            .into_iter()
            .filter(|(id, _)| id != anchor_id)
            .filter_map(|(id, similarity)| {
                artifacts.get(&id).map(|artifact| NearMiss {
                    candidate_id: id,
                    kind: artifact.kind,
                    similarity,
                    text: artifact.text.chars().take(200).collect(),
                })
            })
            .take(self.near_miss_top)
            .collect()
    }

    /// Explain one gap
    pub async fn explain<O>(
        &mut self,
        gap: &Gap,
        artifacts: &ArtifactSet,
        graph: &TraceGraph,
        oracle: &O,
    ) -> GapReasoning
    where
        O: SimilarityOracle,
        O::Error: Display,
    {
        let anchor = gap.subject.anchor_id();
        let near_misses = self.near_misses(oracle, anchor, artifacts);
        let prompt = build_prompt(gap, artifacts, graph, &near_misses);
        let labels: Vec<String> = near_misses.iter().map(NearMiss::label).collect();

        let response = generate_limited(
            &mut self.limiter,
            &self.provider,
            &prompt,
            Some(EXPLANATION_SCHEMA),
        )
        .await;

        let outcome = match response {
            Ok(response) => {
                self.tracker
                    .record_call(GAP_REASONING, prompt.len(), response.len());
                parse_explanation(&response)
            }
            Err(e) => {
                self.tracker.record_failure(GAP_REASONING, prompt.len());
                Err(e.to_string())
            }
        };

        match outcome {
            Ok(mut reasoning) => {
                reasoning.near_misses = labels;
                reasoning
            }
            Err(message) => {
                warn!("Error generating reasoning for {}: {}", gap.gap_id, message);
                GapReasoning {
                    summary: format!("Error generating reasoning: {}", message),
                    root_cause: ERROR_ROOT_CAUSE.to_string(),
                    suggestions: Vec::new(),
                    near_misses: labels,
                }
            }
        }
    }

    /// Attach an explanation to every gap, in order
    pub async fn explain_all<O>(
        &mut self,
        gaps: &mut [Gap],
        artifacts: &ArtifactSet,
        graph: &TraceGraph,
        oracle: &O,
    ) where
        O: SimilarityOracle,
        O::Error: Display,
    {
        if gaps.is_empty() {
            return;
        }
        info!("Generating reasoning for {} gaps", gaps.len());
        let total = gaps.len();
        for (i, gap) in gaps.iter_mut().enumerate() {
            debug!("Processing gap {}/{}: {}", i + 1, total, gap.gap_id);
            let reasoning = self.explain(gap, artifacts, graph, oracle).await;
            gap.reasoning = Some(reasoning);
        }
    }
}

fn build_prompt(gap: &Gap, artifacts: &ArtifactSet, graph: &TraceGraph, near_misses: &[NearMiss]) -> String {
    let anchor = gap.subject.anchor_id();
    let artifact = artifacts.get(anchor);
    let kind = artifact.map(|a| a.kind.to_string()).unwrap_or_else(|| "N/A".to_string());
    let text = artifact.map(|a| a.text.as_str()).unwrap_or("N/A");

    let parents = graph.parents(anchor);
    let children = graph.children(anchor);
    let join = |ids: &[String]| {
        if ids.is_empty() {
            "None".to_string()
        } else {
            ids.join(", ")
        }
    };

    let (expected_parent, expected_child, chain, break_point) = match &gap.subject {
        GapSubject::Artifact {
            expected_parent_kind,
            expected_child_kind,
            ..
        } => (
            kind_or_na(*expected_parent_kind),
            kind_or_na(*expected_child_kind),
            "N/A".to_string(),
            "N/A".to_string(),
        ),
        GapSubject::Chain {
            chain, break_point, ..
        } => (
            "N/A".to_string(),
            "N/A".to_string(),
            chain.join(" -> "),
            break_point.clone(),
        ),
    };

    let mut prompt = String::new();
    prompt.push_str(ANALYST_ROLE);
    prompt.push_str("\n\n");
    prompt.push_str(&format!(
        "GAP: {} | SEVERITY: {}\n\n",
        gap.kind.as_str(),
        gap.severity
    ));
    prompt.push_str(&format!("ARTIFACT: {} ({})\nText: \"{}\"\n\n", anchor, kind, text));
    prompt.push_str("STATUS:\n");
    prompt.push_str(&format!(
        "Parents: {} ({}) - Expected: {}\n",
        join(parents),
        parents.len(),
        expected_parent
    ));
    prompt.push_str(&format!(
        "Children: {} ({}) - Expected: {}\n",
        join(children),
        children.len(),
        expected_child
    ));
    prompt.push_str(&format!("Chain: {} | Break: {}\n\n", chain, break_point));

    prompt.push_str("NEAR-MISS:");
    if near_misses.is_empty() {
        prompt.push_str("\nNone found");
    }
    for near_miss in near_misses {
        prompt.push_str(&format!("\n- {}: {}", near_miss.label(), near_miss.text));
    }
    prompt.push_str(
        "\n\nRespond with JSON: {\"reasoning\": \"why the gap exists\", \
         \"root_cause\": \"primary|derived|process|data_quality|other\", \
         \"suggestions\": [\"fix action\"]}",
    );
    prompt
}

fn kind_or_na(kind: Option<ArtifactKind>) -> String {
    kind.map(|k| k.to_string()).unwrap_or_else(|| "N/A".to_string())
}

fn parse_explanation(response: &str) -> Result<GapReasoning, String> {
    let start = response.find('{');
    let end = response.rfind('}');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &response[start..=end],
        _ => return Err("response contains no JSON object".to_string()),
    };
    let raw: RawExplanation =
        serde_json::from_str(json).map_err(|e| format!("malformed JSON: {}", e))?;

    let suggestions = raw
        .suggestions
        .into_iter()
        .filter_map(|s| match s {
            Value::String(text) => Some(text),
            Value::Object(map) => map.get("action").and_then(Value::as_str).map(str::to_string),
            _ => None,
        })
        .collect();

    Ok(GapReasoning {
        summary: if raw.reasoning.is_empty() {
            "No reasoning provided".to_string()
        } else {
            raw.reasoning
        },
        root_cause: raw.root_cause.unwrap_or_else(|| "unknown".to_string()),
        suggestions,
        near_misses: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::CoverageAnalyzer;
    use crate::gaps::GapDetector;
    use std::sync::Arc;
    use tracelink_domain::{Artifact, Link, LinkType, MatchDetails};
    use tracelink_llm::{LlmError, MockProvider};
    use tracelink_store::InMemoryOracle;

    fn artifacts() -> ArtifactSet {
        ArtifactSet::from_artifacts(vec![
            Artifact::new("HLR-001", ArtifactKind::Hlr, "Monitor brake pressure").unwrap(),
            Artifact::new("LLR-001", ArtifactKind::Llr, "Sample brake pressure at 100 Hz").unwrap(),
            Artifact::new("LLR-002", ArtifactKind::Llr, "Filter brake pressure samples").unwrap(),
        ])
        .unwrap()
    }

    fn oracle() -> InMemoryOracle {
        InMemoryOracle::new()
            .with("HLR-001", vec![1.0, 0.0])
            .with("LLR-001", vec![0.9, 0.436])
            .with("LLR-002", vec![0.1, 0.995])
    }

    fn gaps(artifacts: &ArtifactSet, graph: &TraceGraph) -> Vec<Gap> {
        let analyzer = CoverageAnalyzer::new(artifacts, graph);
        GapDetector::new(&analyzer).detect(&analyzer.orphans())
    }

    fn explainer(mock: &MockProvider) -> GapExplainer {
        let provider: SharedProvider = Arc::new(mock.clone());
        GapExplainer::new(provider, RateLimitConfig::unthrottled(), &AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn test_near_misses_exclude_anchor_and_dissimilar() {
        let mock = MockProvider::new("{}");
        let misses = explainer(&mock).near_misses(&oracle(), "HLR-001", &artifacts());
        assert_eq!(misses.len(), 1);
        assert_eq!(misses[0].candidate_id, "LLR-001");
        assert_eq!(misses[0].kind, ArtifactKind::Llr);
    }

    #[tokio::test]
    async fn test_explains_gap() {
        let mock = MockProvider::new(
            r#"```json
{"reasoning": "LLR-001 covers the sampling but was never linked",
 "root_cause": "process",
 "suggestions": [{"action": "Link HLR-001 to LLR-001", "priority": "immediate"}, "Review LLR-002"]}
```"#,
        );
        let artifacts = artifacts();
        let graph = TraceGraph::default();
        let mut gaps = gaps(&artifacts, &graph);
        let mut explainer = explainer(&mock);

        explainer.explain_all(&mut gaps, &artifacts, &graph, &oracle()).await;

        let reasoning = gaps[0].reasoning.as_ref().unwrap();
        assert_eq!(reasoning.root_cause, "process");
        assert_eq!(
            reasoning.suggestions,
            vec!["Link HLR-001 to LLR-001", "Review LLR-002"]
        );
        assert!(gaps.iter().all(|g| g.reasoning.is_some()));
        assert_eq!(mock.call_count(), gaps.len());
        assert_eq!(explainer.tracker().total_calls(), gaps.len());

        let prompt = &mock.prompts()[0];
        assert!(prompt.contains("GAP: orphan_no_parent | SEVERITY: high"));
        assert!(prompt.contains("ARTIFACT: HLR-001 (HLR)"));
    }

    #[tokio::test]
    async fn test_failure_is_recorded_not_raised() {
        let mut mock = MockProvider::default();
        mock.enqueue_error(LlmError::ModelNotAvailable("llama3.1".into()));
        let artifacts = artifacts();
        let graph = TraceGraph::from_links(&[Link::new(
            "HLR-001",
            "LLR-001",
            LinkType::Implements,
            0.9,
            MatchDetails::deterministic(),
            "",
        )
        .unwrap()]);
        let gap = gaps(&artifacts, &graph).remove(0);
        let mut explainer = explainer(&mock);

        let reasoning = explainer.explain(&gap, &artifacts, &graph, &oracle()).await;

        assert_eq!(reasoning.root_cause, ERROR_ROOT_CAUSE);
        assert!(reasoning.summary.starts_with("Error generating reasoning"));
        assert_eq!(explainer.tracker().total_failures(), 1);
    }

    #[tokio::test]
    async fn test_malformed_response_is_recorded() {
        let mock = MockProvider::new("the gap exists because nobody linked it");
        let artifacts = artifacts();
        let graph = TraceGraph::default();
        let gap = gaps(&artifacts, &graph).remove(0);

        let reasoning = explainer(&mock).explain(&gap, &artifacts, &graph, &oracle()).await;

        assert_eq!(reasoning.root_cause, ERROR_ROOT_CAUSE);
    }

    #[test]
    fn test_parse_defaults() {
        let reasoning = parse_explanation("{}").unwrap();
        assert_eq!(reasoning.summary, "No reasoning provided");
        assert_eq!(reasoning.root_cause, "unknown");
        assert!(reasoning.suggestions.is_empty());
    }
}
