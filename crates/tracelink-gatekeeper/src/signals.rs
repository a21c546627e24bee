//! Signal computation for candidate links
//!
//! Each signal is independent of the others. The embedding similarity comes
//! from the similarity oracle; everything else is computed here from the
//! artifacts themselves.

use crate::config::{IdBoostConfig, ScoringWeights};
use std::collections::BTreeSet;
use tracelink_domain::id_hierarchy::IdRelationship;
use tracelink_domain::{Artifact, IdHierarchy, Quantity, QuantityValue, SignalBreakdown};

/// Words ignored by the raw-text keyword fallback
const FALLBACK_STOPWORDS: [&str; 10] = [
    "shall", "will", "must", "should", "when", "where", "that", "this", "with", "from",
];

/// Shortest word the raw-text keyword fallback considers
const FALLBACK_MIN_WORD_LEN: usize = 5;

/// Matched keywords kept for explanation
const MAX_KEYWORD_MATCHES: usize = 5;

/// Largest numeric difference still counted as the same quantity
const QUANTITY_TOLERANCE: f64 = 0.001;

/// Computes the per-candidate signals and their combined score
#[derive(Debug, Clone, Default)]
pub struct SignalScorer {
    weights: ScoringWeights,
    id_boost: IdBoostConfig,
}

impl SignalScorer {
    /// Create a scorer
    pub fn new(weights: ScoringWeights, id_boost: IdBoostConfig) -> Self {
        Self { weights, id_boost }
    }

    /// Active weights
    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Compute every signal for a candidate pair
    ///
    /// `with_name` enables the variable-name signal, which is only
    /// meaningful when the target is a code variable.
    pub fn score(
        &self,
        source: &Artifact,
        target: &Artifact,
        embedding_similarity: f64,
        with_name: bool,
    ) -> SignalBreakdown {
        let (keyword_score, keyword_overlap) = self.keyword_score(source, target);
        let (quantity_match, matched_quantities) = self.quantity_match(source, target);
        let (name_score, name_reasons) = if with_name {
            self.name_score(source, target)
        } else {
            (0.0, Vec::new())
        };
        let id_boost = self.id_boost(&source.id, &target.id);

        let mut signals = SignalBreakdown {
            embedding_similarity,
            keyword_score,
            keyword_overlap,
            quantity_match,
            matched_quantities,
            name_score,
            name_reasons,
            id_boost,
            combined_score: 0.0,
        };
        signals.combined_score = self.combined_score(&signals);
        signals
    }

    /// Jaccard similarity of the extracted keyword sets
    ///
    /// When either side has no keywords, falls back to Jaccard over the
    /// lowercase words of at least five characters in the raw text.
    /// Returns the score and up to five matched terms.
    pub fn keyword_score(&self, source: &Artifact, target: &Artifact) -> (f64, Vec<String>) {
        let source_keywords = &source.extracted.keywords;
        let target_keywords = &target.extracted.keywords;

        if source_keywords.is_empty() || target_keywords.is_empty() {
            let source_words = fallback_words(&source.text);
            let target_words = fallback_words(&target.text);
            if source_words.is_empty() || target_words.is_empty() {
                return (0.0, Vec::new());
            }
            return jaccard(&source_words, &target_words);
        }

        jaccard(source_keywords, target_keywords)
    }

    /// Whether any quantity pair matches after unit normalisation
    pub fn quantity_match(&self, source: &Artifact, target: &Artifact) -> (bool, Vec<String>) {
        let mut matched = Vec::new();
        for sq in &source.extracted.quantities {
            for tq in &target.extracted.quantities {
                if quantities_equal(sq, tq) {
                    matched.push(format_quantity(sq));
                }
            }
        }
        (!matched.is_empty(), matched)
    }

    /// How strongly a code variable's name is referenced by a requirement
    ///
    /// Exact substring of the requirement text scores 1.0; a match among
    /// the requirement's referenced tokens 0.9; otherwise the fraction of
    /// underscore-separated name parts found in the text scales
    /// `0.5 + 0.3 × fraction`.
    pub fn name_score(&self, requirement: &Artifact, variable: &Artifact) -> (f64, Vec<String>) {
        let name = match variable.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => return (0.0, Vec::new()),
        };

        if requirement.text.contains(name) {
            return (1.0, vec![format!("Exact match: '{}' in LLR text", name)]);
        }

        let lowered = name.to_lowercase();
        if requirement
            .extracted
            .referenced_ids
            .iter()
            .any(|r| r.to_lowercase() == lowered)
        {
            return (0.9, vec![format!("Variable '{}' extracted from LLR text", name)]);
        }

        let text = requirement.text.to_lowercase();
        let parts: Vec<&str> = lowered.split('_').filter(|p| !p.is_empty()).collect();
        let found = parts.iter().filter(|p| text.contains(*p)).count();
        if found == 0 {
            return (0.0, Vec::new());
        }

        let score = 0.5 + 0.3 * found as f64 / parts.len() as f64;
        (
            score,
            vec![format!("Partial match: {}/{} parts of '{}'", found, parts.len(), name)],
        )
    }

    /// Additive boost for structurally related identifiers
    pub fn id_boost(&self, source_id: &str, target_id: &str) -> f64 {
        if !self.id_boost.enabled {
            return 0.0;
        }
        match IdHierarchy::relationship(source_id, target_id) {
            IdRelationship::ParentChild => self.id_boost.parent_match,
            IdRelationship::SharedBase => self.id_boost.shared_base,
            IdRelationship::Unrelated => 0.0,
        }
    }

    /// Weighted sum of the signals plus the id boost, clamped to [0, 1]
    pub fn combined_score(&self, signals: &SignalBreakdown) -> f64 {
        let quantity = if signals.quantity_match { 1.0 } else { 0.0 };
        let weighted = self.weights.embedding * signals.embedding_similarity
            + self.weights.keyword * signals.keyword_score
            + self.weights.quantity * quantity
            + self.weights.name * signals.name_score;

        let score = weighted + signals.id_boost;
        if score.is_nan() {
            return 0.0;
        }
        score.clamp(0.0, 1.0)
    }
}

/// Canonical spelling of a unit
pub fn normalize_unit(unit: &str) -> String {
    let unit = unit.trim().to_lowercase();
    match unit.as_str() {
        "ft" => "feet".to_string(),
        "m" => "meters".to_string(),
        "s" => "seconds".to_string(),
        "deg" => "degrees".to_string(),
        "°c" => "celsius".to_string(),
        "vdc" => "volts".to_string(),
        _ => unit,
    }
}

fn quantities_equal(a: &Quantity, b: &Quantity) -> bool {
    match (&a.value, &b.value) {
        (QuantityValue::Number(x), QuantityValue::Number(y)) => {
            (x - y).abs() <= QUANTITY_TOLERANCE && normalize_unit(&a.unit) == normalize_unit(&b.unit)
        }
        _ => false,
    }
}

fn format_quantity(q: &Quantity) -> String {
    match &q.value {
        QuantityValue::Number(n) => format!("{} {}", n, q.unit).trim_end().to_string(),
        QuantityValue::Text(t) => format!("{} {}", t, q.unit).trim_end().to_string(),
    }
}

fn fallback_words(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|w| w.chars().count() >= FALLBACK_MIN_WORD_LEN)
        .filter(|w| !FALLBACK_STOPWORDS.contains(w))
        .map(str::to_string)
        .collect()
}

fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> (f64, Vec<String>) {
    let union = a.union(b).count();
    if union == 0 {
        return (0.0, Vec::new());
    }
    let shared: Vec<String> = a.intersection(b).cloned().collect();
    let score = shared.len() as f64 / union as f64;
    (score, shared.into_iter().take(MAX_KEYWORD_MATCHES).collect())
}
