//! Parse adjudicator output into a typed selection

use crate::error::AdjudicationError;
use regex::{Captures, Regex};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// A target the oracle accepted
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedTarget {
    /// Target artifact
    pub target_id: String,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Oracle rationale
    pub reasoning: String,
}

/// A target the oracle rejected
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedTarget {
    /// Target artifact
    pub target_id: String,
    /// Why it was rejected
    pub reason: String,
}

/// Parsed oracle decision
///
/// Entries whose confidence cannot be read are dropped and reported in
/// `issues`; the rest of the response is still usable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// Accepted targets in response order
    pub selected: Vec<SelectedTarget>,
    /// Rejected targets
    pub rejected: Vec<RejectedTarget>,
    /// Problems with individual entries
    pub issues: Vec<AdjudicationError>,
}

#[derive(Deserialize)]
struct RawResponse {
    selected_targets: Vec<RawSelected>,
    #[serde(default)]
    rejected_targets: Vec<RawRejected>,
}

#[derive(Deserialize)]
struct RawSelected {
    target_id: String,
    #[serde(default)]
    reasoning: String,
    confidence: Value,
}

#[derive(Deserialize)]
struct RawRejected {
    target_id: String,
    #[serde(default)]
    reason: String,
}

/// Local fixes for common oracle formatting mistakes
#[derive(Debug, Clone)]
pub struct ResponseRepair {
    spelled_digit: Regex,
    spaced_decimal: Regex,
}

impl ResponseRepair {
    /// Compile the repair patterns
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            spelled_digit: Regex::new(
                r#"(?i)("confidence"\s*:\s*)0\.\s*(zero|one|two|three|four|five|six|seven|eight|nine)\b"#,
            )?,
            spaced_decimal: Regex::new(r#"("confidence"\s*:\s*\d+)\.\s+(\d+)"#)?,
        })
    }

    /// Repair a raw response
    ///
    /// Spelled-out digits after `0.` become digits, whitespace after a
    /// decimal point is removed, and `#` comments outside strings are
    /// stripped.
    pub fn repair(&self, raw: &str) -> String {
        let text = self.spelled_digit.replace_all(raw, |caps: &Captures| {
            format!("{}0.{}", &caps[1], digit(&caps[2]))
        });
        let text = self.spaced_decimal.replace_all(&text, "$1.$2");
        strip_comments(&text)
    }

    /// Extract, repair and parse a response
    pub fn parse(&self, response: &str) -> Result<Selection, AdjudicationError> {
        let json = extract_json(response)?;
        let repaired = self.repair(&json);
        if repaired != json {
            warn!("Repaired malformed oracle response");
        }

        let raw: RawResponse = serde_json::from_str(&repaired)?;
        let mut selection = Selection::default();

        for entry in raw.selected_targets {
            match read_confidence(&entry.confidence) {
                Some(confidence) => selection.selected.push(SelectedTarget {
                    target_id: entry.target_id,
                    confidence,
                    reasoning: entry.reasoning,
                }),
                None => {
                    warn!(
                        "Invalid confidence for {}: {}",
                        entry.target_id, entry.confidence
                    );
                    selection.issues.push(AdjudicationError::InvalidConfidence {
                        target_id: entry.target_id,
                        value: entry.confidence.to_string(),
                    });
                }
            }
        }

        selection.rejected = raw
            .rejected_targets
            .into_iter()
            .map(|r| RejectedTarget {
                target_id: r.target_id,
                reason: r.reason,
            })
            .collect();

        Ok(selection)
    }
}

/// Extract the JSON object from a response, handling markdown code blocks
pub fn extract_json(response: &str) -> Result<String, AdjudicationError> {
    let trimmed = response.trim();

    let body = if trimmed.starts_with("```") {
        let lines: Vec<&str> = trimmed.lines().collect();
        if lines.len() < 2 {
            return Err(AdjudicationError::MalformedJson("Empty code block".to_string()));
        }
        let end = if lines[lines.len() - 1].trim_start().starts_with("```") {
            lines.len() - 1
        } else {
            lines.len()
        };
        lines[1..end].join("\n")
    } else {
        trimmed.to_string()
    };

    match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(body[start..=end].to_string()),
        _ => Err(AdjudicationError::MalformedJson(
            "No JSON object in response".to_string(),
        )),
    }
}

/// Confidence as a finite number in [0, 1], from a number or numeric string
fn read_confidence(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (number.is_finite() && (0.0..=1.0).contains(&number)).then_some(number)
}

fn digit(word: &str) -> char {
    match word.to_lowercase().as_str() {
        "zero" => '0',
        "one" => '1',
        "two" => '2',
        "three" => '3',
        "four" => '4',
        "five" => '5',
        "six" => '6',
        "seven" => '7',
        "eight" => '8',
        _ => '9',
    }
}

/// Remove `#` comments that start outside a JSON string
fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut in_comment = false;

    for c in text.chars() {
        if in_comment {
            if c == '\n' {
                in_comment = false;
                out.push(c);
            }
            continue;
        }
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '#' => in_comment = true,
            '"' => {
                in_string = true;
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repair() -> ResponseRepair {
        ResponseRepair::new().unwrap()
    }

    #[test]
    fn test_parse_clean_response() {
        let selection = repair()
            .parse(
                r#"{"selected_targets": [{"target_id": "LLR-001", "reasoning": "direct", "confidence": 0.85}],
                    "rejected_targets": [{"target_id": "LLR-002", "reason": "unrelated"}]}"#,
            )
            .unwrap();

        assert_eq!(
            selection.selected,
            vec![SelectedTarget {
                target_id: "LLR-001".to_string(),
                confidence: 0.85,
                reasoning: "direct".to_string(),
            }]
        );
        assert_eq!(selection.rejected[0].target_id, "LLR-002");
        assert!(selection.issues.is_empty());
    }

    #[test]
    fn test_extract_json_from_code_block() {
        let response = "```json\n{\"selected_targets\": []}\n```";
        assert_eq!(extract_json(response).unwrap(), "{\"selected_targets\": []}");
    }

    #[test]
    fn test_extract_json_with_surrounding_text() {
        let response = "Here is my answer: {\"selected_targets\": []} Hope this helps.";
        assert_eq!(extract_json(response).unwrap(), "{\"selected_targets\": []}");
    }

    #[test]
    fn test_no_json_object() {
        assert!(matches!(
            extract_json("I cannot decide."),
            Err(AdjudicationError::MalformedJson(_))
        ));
    }

    #[test]
    fn test_repair_spelled_confidence() {
        let selection = repair()
            .parse(r#"{"selected_targets": [{"target_id": "HLR-001", "confidence": 0.nine}]}"#)
            .unwrap();
        assert_eq!(selection.selected[0].confidence, 0.9);

        let selection = repair()
            .parse(r#"{"selected_targets": [{"target_id": "HLR-001", "confidence": 0. Seven}]}"#)
            .unwrap();
        assert_eq!(selection.selected[0].confidence, 0.7);
    }

    #[test]
    fn test_repair_space_after_decimal() {
        let selection = repair()
            .parse(r#"{"selected_targets": [{"target_id": "HLR-001", "confidence": 0. 75}]}"#)
            .unwrap();
        assert_eq!(selection.selected[0].confidence, 0.75);
    }

    #[test]
    fn test_repair_strips_comments_outside_strings() {
        let response = "{\n  \"selected_targets\": [ # best match\n    {\"target_id\": \"LLR-001\", \"reasoning\": \"covers item #3\", \"confidence\": 0.8}\n  ]\n}";
        let selection = repair().parse(response).unwrap();
        assert_eq!(selection.selected[0].reasoning, "covers item #3");
    }

    #[test]
    fn test_string_confidence_is_accepted() {
        let selection = repair()
            .parse(r#"{"selected_targets": [{"target_id": "HLR-001", "confidence": "0.65"}]}"#)
            .unwrap();
        assert_eq!(selection.selected[0].confidence, 0.65);
    }

    #[test]
    fn test_invalid_confidence_is_reported() {
        let selection = repair()
            .parse(
                r#"{"selected_targets": [
                    {"target_id": "HLR-001", "confidence": "high"},
                    {"target_id": "HLR-002", "confidence": 1.5},
                    {"target_id": "HLR-003", "confidence": 0.9}
                ]}"#,
            )
            .unwrap();

        assert_eq!(selection.selected.len(), 1);
        assert_eq!(selection.selected[0].target_id, "HLR-003");
        assert_eq!(selection.issues.len(), 2);
        assert!(matches!(
            &selection.issues[0],
            AdjudicationError::InvalidConfidence { target_id, .. } if target_id == "HLR-001"
        ));
    }

    #[test]
    fn test_missing_selected_targets_is_malformed() {
        assert!(matches!(
            repair().parse(r#"{"choices": []}"#),
            Err(AdjudicationError::MalformedJson(_))
        ));
    }

    #[test]
    fn test_unrepairable_json_is_malformed() {
        assert!(matches!(
            repair().parse(r#"{"selected_targets": [{"target_id": "HLR-001", "confidence": }]}"#),
            Err(AdjudicationError::MalformedJson(_))
        ));
    }
}
