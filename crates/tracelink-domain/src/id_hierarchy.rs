//! Identifier hierarchy resolution
//!
//! Structured identifiers follow `PREFIX-NUMBER[-SUFFIX][-SUFFIX2]`
//! (`SYS-001`, `SYS-001-A`, `HLR-001-A`, `LLR-001-A-1`, `VAR-007`). The type
//! prefix and suffixes imply which artifact sits one layer up. The implied
//! parent is only ever a hint for scoring; it never creates a link on its own.

use serde::{Deserialize, Serialize};

/// Parsed view of an artifact identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdHierarchy {
    /// `PREFIX-NUMBER`, or the whole id when it does not conform
    pub base: String,

    /// First suffix after the number, if any
    pub suffix: Option<String>,

    /// Best-guess id of the artifact one layer up
    pub parent_ref: Option<String>,

    #[serde(skip)]
    number: Option<u64>,
}

/// How two identifiers relate according to their structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdRelationship {
    /// One id is the implied parent of the other
    ParentChild,

    /// Both ids share the same numeric base
    SharedBase,

    /// No structural relationship
    Unrelated,
}

impl IdHierarchy {
    /// Resolve an identifier
    ///
    /// Non-conforming ids resolve to `{base: id, suffix: None, parent_ref: None}`.
    pub fn resolve(id: &str) -> Self {
        match parse_parts(id) {
            Some(parts) => {
                let base = format!("{}-{}", parts.prefix, parts.number);
                let parent_ref = implied_parent(&parts);
                Self {
                    base,
                    suffix: parts.suffixes.first().map(|s| s.to_string()),
                    parent_ref,
                    number: parts.number.parse().ok(),
                }
            }
            None => Self {
                base: id.to_string(),
                suffix: None,
                parent_ref: None,
                number: None,
            },
        }
    }

    /// Numeric part of the base, if the id conforms
    pub fn numeric_base(&self) -> Option<u64> {
        self.number
    }

    /// Classify the structural relationship between two ids
    pub fn relationship(a: &str, b: &str) -> IdRelationship {
        let ha = Self::resolve(a);
        let hb = Self::resolve(b);

        if ha.parent_ref.as_deref() == Some(b) || hb.parent_ref.as_deref() == Some(a) {
            return IdRelationship::ParentChild;
        }

        match (ha.numeric_base(), hb.numeric_base()) {
            (Some(na), Some(nb)) if na == nb => IdRelationship::SharedBase,
            _ => IdRelationship::Unrelated,
        }
    }
}

struct IdParts<'a> {
    prefix: &'a str,
    number: &'a str,
    suffixes: Vec<&'a str>,
}

fn parse_parts(id: &str) -> Option<IdParts<'_>> {
    let mut segments = id.split('-');
    let prefix = segments.next()?;
    let number = segments.next()?;
    let suffixes: Vec<&str> = segments.collect();

    if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_uppercase()) {
        return None;
    }
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if suffixes.len() > 2 {
        return None;
    }
    let valid_suffix = |s: &&str| {
        !s.is_empty() && s.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    };
    if !suffixes.iter().all(valid_suffix) {
        return None;
    }

    Some(IdParts {
        prefix,
        number,
        suffixes,
    })
}

fn implied_parent(parts: &IdParts<'_>) -> Option<String> {
    let first = parts.suffixes.first();
    match parts.prefix {
        "HLR" => Some(match first {
            Some(s) => format!("SYS-{}-{}", parts.number, s),
            None => format!("SYS-{}", parts.number),
        }),
        "LLR" => Some(match first {
            Some(s) => format!("HLR-{}-{}", parts.number, s),
            None => format!("HLR-{}", parts.number),
        }),
        // A suffixed system id is a decomposed part
        "SYS" if first.is_some() => Some(format!("SYS-{}", parts.number)),
        _ => None,
    }
}

/// Check the canonical id format `AAA-000[-X...]`
pub fn is_valid_id(id: &str) -> bool {
    let mut segments = id.split('-');
    let prefix_ok = segments
        .next()
        .is_some_and(|p| p.len() == 3 && p.chars().all(|c| c.is_ascii_uppercase()));
    let number_ok = segments
        .next()
        .is_some_and(|n| n.len() == 3 && n.chars().all(|c| c.is_ascii_digit()));
    prefix_ok
        && number_ok
        && segments.all(|s| {
            !s.is_empty() && s.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        })
}

/// Id of a decomposed part of `parent_id`
pub fn child_id(parent_id: &str, suffix: &str) -> String {
    format!("{}-{}", parent_id, suffix)
}
