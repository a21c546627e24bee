//! Human-readable link justification

use tracelink_domain::{LinkType, MatchDetails};

/// Explain a link from its match details
pub fn build_rationale(
    source_id: &str,
    target_id: &str,
    link_type: LinkType,
    details: &MatchDetails,
) -> String {
    let mut parts = vec![match link_type {
        LinkType::References => format!("{} references {}", source_id, target_id),
        _ => format!("{} {} {}", target_id, link_type.as_str(), source_id),
    }];

    if let Some(signals) = &details.signals {
        if !signals.keyword_overlap.is_empty() {
            parts.push(format!(
                "Matched on keywords: {}",
                signals.keyword_overlap.join(", ")
            ));
        }
        parts.push(format!(
            "Embedding similarity: {:.2}",
            signals.embedding_similarity
        ));
        if !signals.matched_quantities.is_empty() {
            parts.push(format!(
                "Matched quantities: {}",
                signals.matched_quantities.join(", ")
            ));
        }
        if let Some(reason) = signals.name_reasons.first() {
            parts.push(reason.clone());
        }
    }

    if let Some(verdict) = &details.oracle {
        if !verdict.reasoning.trim().is_empty() {
            parts.push(format!("Oracle: {}", verdict.reasoning.trim()));
        }
    }
    if let Some(reason) = &details.fallback_reason {
        parts.push(format!("Heuristic acceptance: {}", reason));
    }

    let mut rationale = parts.join(". ");
    if !rationale.ends_with('.') {
        rationale.push('.');
    }
    rationale
}
