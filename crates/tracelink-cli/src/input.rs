//! Artifact and link files.

use crate::error::{CliError, Result};
use std::fs;
use std::path::Path;
use tracelink_domain::id_hierarchy::is_valid_id;
use tracelink_domain::{ArtifactSet, Link};
use tracelink_gatekeeper::TextExtractor;
use tracing::{info, warn};

/// Read a JSON array of artifacts and fill in missing text signals.
///
/// Artifacts that already carry `extracted` signals are left untouched.
/// Ids outside the `AAA-000[-X]` convention are loaded but get no
/// hierarchy boost, so they are reported.
pub fn read_artifacts(path: &Path) -> Result<ArtifactSet> {
    let contents = fs::read_to_string(path)?;
    let mut artifacts: ArtifactSet = serde_json::from_str(&contents)?;
    if artifacts.is_empty() {
        return Err(CliError::InvalidInput(format!(
            "{} contains no artifacts",
            path.display()
        )));
    }

    let nonconforming = nonconforming_ids(&artifacts);
    if !nonconforming.is_empty() {
        warn!(
            "{} artifact ids do not follow the AAA-000[-X] convention: {}",
            nonconforming.len(),
            nonconforming.join(", ")
        );
    }

    let enriched = TextExtractor::new()?.enrich(&mut artifacts);
    info!(
        "Loaded {} artifacts from {} ({} enriched)",
        artifacts.len(),
        path.display(),
        enriched
    );
    Ok(artifacts)
}

/// Ids that the hierarchy resolver cannot place
pub fn nonconforming_ids(artifacts: &ArtifactSet) -> Vec<&str> {
    artifacts
        .iter()
        .map(|a| a.id.as_str())
        .filter(|id| !is_valid_id(id))
        .collect()
}

/// Read a JSON array of links.
///
/// Each link is validated on load: confidence must lie in [0, 1] and the
/// status must agree with it.
pub fn read_links(path: &Path) -> Result<Vec<Link>> {
    let contents = fs::read_to_string(path)?;
    let links: Vec<Link> = serde_json::from_str(&contents)?;
    info!("Loaded {} links from {}", links.len(), path.display());
    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tracelink_domain::ArtifactKind;

    fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_read_artifacts_enriches() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "artifacts.json",
            r#"[
                {"id": "HLR-001", "type": "HLR", "text": "Limit wheel slip below 12 % at 100 Hz"},
                {"id": "VAR-001", "type": "CODE_VAR", "text": "Slip ratio", "name": "wheel_slip_ratio"}
            ]"#,
        );
        let artifacts = read_artifacts(&path).unwrap();
        assert_eq!(artifacts.len(), 2);
        assert_eq!(artifacts.kind_of("VAR-001"), Some(ArtifactKind::CodeVar));
        assert!(!artifacts.get("HLR-001").unwrap().extracted.is_empty());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "artifacts.json",
            r#"[
                {"id": "HLR-001", "type": "HLR", "text": "one"},
                {"id": "HLR-001", "type": "HLR", "text": "two"}
            ]"#,
        );
        assert!(matches!(read_artifacts(&path), Err(CliError::Serialization(_))));
    }

    #[test]
    fn test_empty_artifact_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "artifacts.json", "[]");
        assert!(matches!(read_artifacts(&path), Err(CliError::InvalidInput(_))));
    }

    #[test]
    fn test_links_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let links = vec![Link::decomposition("SYS-001", "SYS-001-A")];
        let path = write(&dir, "links.json", &serde_json::to_string(&links).unwrap());
        assert_eq!(read_links(&path).unwrap(), links);
    }

    #[test]
    fn test_out_of_range_confidence_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "links.json",
            r#"[{"id": "LINK-1", "source_id": "HLR-001", "target_id": "LLR-001",
                 "link_type": "implements", "confidence": 3.5, "status": "candidate",
                 "match_details": {"method": "multi-signal"}, "rationale": "r",
                 "created_at": 0, "created_by": "auto"}]"#,
        );
        let err = read_links(&path).unwrap_err();
        assert!(matches!(err, CliError::Serialization(_)));
        assert!(err.to_string().contains("3.5"));
    }

    #[test]
    fn test_nonconforming_ids_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "artifacts.json",
            r#"[
                {"id": "HLR-001", "type": "HLR", "text": "Limit wheel slip"},
                {"id": "req_7", "type": "LLR", "text": "Compute slip"},
                {"id": "VAR-1", "type": "CODE_VAR", "text": "Slip ratio"}
            ]"#,
        );
        let artifacts = read_artifacts(&path).unwrap();
        assert_eq!(artifacts.len(), 3);
        assert_eq!(nonconforming_ids(&artifacts), vec!["req_7", "VAR-1"]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_artifacts(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(CliError::Io(_))));
    }
}
