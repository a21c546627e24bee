//! Text signal extraction
//!
//! Fills [`ExtractedSignals`] for artifacts that arrive without them:
//! domain keywords, numeric quantities with units, and identifier-like
//! tokens (variable names and artifact ids).

use crate::GatekeeperError;
use regex::Regex;
use std::collections::BTreeSet;
use tracelink_domain::{ArtifactSet, ExtractedSignals, Quantity};
use tracing::debug;

/// Aerospace vocabulary recognised as keywords
const DOMAIN_VOCABULARY: &[&str] = &[
    // components
    "brake", "control", "unit", "wheel", "sensor", "hydraulic", "actuator", "valve", "pressure",
    "speed", "system", "interface", "bus", "data",
    // parameters
    "slip", "voltage", "temperature", "current", "rate", "mode", "state", "fault", "status",
    "input", "output", "command", "ground", "aircraft",
    // actions
    "compute", "calculate", "monitor", "detect", "transmit", "receive", "limit", "sample",
    "validate", "check", "transition", "prevent", "modulate", "reduce", "restore", "format",
    // constraints
    "maximum", "minimum", "within", "exceeds", "below", "above", "range", "threshold", "safe",
    "valid", "normal", "degraded",
];

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "from",
    "by", "shall", "will", "should", "must", "may", "can", "could", "would", "is", "are", "was",
    "were", "be", "been", "being", "have", "has", "had", "do", "does", "did", "this", "that",
    "these", "those", "it", "its", "when", "where", "which", "who", "how",
];

const UNITS: &str = r"%|°c|(?:feet|ft|meters|ms|m|seconds|sec|s|hz|degrees|deg|percent|vdc|rpm|ma|psi)\b";

/// Compiled extraction patterns
#[derive(Debug, Clone)]
pub struct TextExtractor {
    token: Regex,
    identifier: Regex,
    quantity: Regex,
    range: Regex,
    snake_case: Regex,
    camel_case: Regex,
    pascal_case: Regex,
    upper_snake: Regex,
    artifact_id: Regex,
}

impl TextExtractor {
    /// Compile the extraction patterns
    pub fn new() -> Result<Self, GatekeeperError> {
        Ok(Self {
            token: Regex::new(r"\w+")?,
            identifier: Regex::new(r"\b(?:[A-Z][a-z]+[A-Z][a-zA-Z]*|[a-z]+_[a-z_]+|[A-Z][A-Z_]*_[A-Z_]+)\b")?,
            quantity: Regex::new(&format!(r"(?i)\b(?P<value>\d+(?:\.\d+)?)\s*(?P<unit>{})", UNITS))?,
            range: Regex::new(&format!(
                r"(?i)\b(?P<low>\d+(?:\.\d+)?)\s*(?:to|–|-)\s*\d+(?:\.\d+)?\s*(?P<unit>{})",
                UNITS
            ))?,
            snake_case: Regex::new(r"\b[a-z][a-z0-9]*(?:_[a-z0-9]+)+\b")?,
            camel_case: Regex::new(r"\b[a-z][a-z0-9]*[A-Z][a-zA-Z0-9]*\b")?,
            pascal_case: Regex::new(r"\b[A-Z][a-z]+(?:[A-Z][a-z]+)+\b")?,
            upper_snake: Regex::new(r"\b[A-Z][A-Z0-9]*(?:_[A-Z0-9]+)+\b")?,
            artifact_id: Regex::new(r"\b[A-Z]{2,}-\d+(?:-[A-Z0-9]+)*\b")?,
        })
    }

    /// Domain keywords and identifier-like tokens, lowercased
    pub fn extract_keywords(&self, text: &str) -> BTreeSet<String> {
        let lowered = text.to_lowercase();
        let mut keywords: BTreeSet<String> = self
            .token
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|t| t.chars().count() > 2 && !STOPWORDS.contains(t))
            .filter(|t| DOMAIN_VOCABULARY.contains(t))
            .map(str::to_string)
            .collect();

        keywords.extend(
            self.identifier
                .find_iter(text)
                .map(|m| m.as_str().to_lowercase()),
        );
        keywords
    }

    /// Numeric quantities with units, in order of appearance
    ///
    /// The lower bound of a range (`10 to 20 ft`) is reported with the
    /// range's unit.
    pub fn extract_quantities(&self, text: &str) -> Vec<Quantity> {
        let mut found: Vec<(usize, Quantity)> = Vec::new();

        for caps in self.quantity.captures_iter(text) {
            if let (Some(value), Some(unit)) = (caps.name("value"), caps.name("unit")) {
                if let Ok(number) = value.as_str().parse::<f64>() {
                    found.push((value.start(), Quantity::number(number, unit.as_str())));
                }
            }
        }
        for caps in self.range.captures_iter(text) {
            if let (Some(low), Some(unit)) = (caps.name("low"), caps.name("unit")) {
                if let Ok(number) = low.as_str().parse::<f64>() {
                    found.push((low.start(), Quantity::number(number, unit.as_str())));
                }
            }
        }

        found.sort_by_key(|(position, _)| *position);
        let mut quantities: Vec<Quantity> = Vec::with_capacity(found.len());
        for (_, quantity) in found {
            if !quantities.contains(&quantity) {
                quantities.push(quantity);
            }
        }
        quantities
    }

    /// Variable-like names (snake_case, camelCase, PascalCase, UPPER_SNAKE)
    pub fn extract_variable_names(&self, text: &str) -> BTreeSet<String> {
        [&self.snake_case, &self.camel_case, &self.pascal_case, &self.upper_snake]
            .iter()
            .flat_map(|re| re.find_iter(text).map(|m| m.as_str().to_string()))
            .collect()
    }

    /// Artifact identifiers mentioned in the text (`HLR-001-A`)
    pub fn extract_artifact_ids(&self, text: &str) -> BTreeSet<String> {
        self.artifact_id
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// All signals for one text
    pub fn extract_signals(&self, text: &str) -> ExtractedSignals {
        let mut referenced_ids = self.extract_variable_names(text);
        referenced_ids.extend(self.extract_artifact_ids(text));

        ExtractedSignals {
            keywords: self.extract_keywords(text),
            quantities: self.extract_quantities(text),
            referenced_ids,
        }
    }

    /// Fill `extracted` for every artifact that has none
    ///
    /// Returns how many artifacts were enriched.
    pub fn enrich(&self, artifacts: &mut ArtifactSet) -> usize {
        artifacts.update_signals(|artifact| {
            if !artifact.extracted.is_empty() {
                return None;
            }
            let signals = self.extract_signals(&artifact.text);
            debug!(
                "Extracted {} keywords, {} quantities for {}",
                signals.keywords.len(),
                signals.quantities.len(),
                artifact.id
            );
            Some(signals)
        })
    }
}
