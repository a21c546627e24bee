//! Output formatting for the CLI.
//!
//! JSON results go to stdout or a file; human summaries go to stderr so the
//! JSON stream stays clean for piping.

use crate::error::Result;
use colored::*;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};
use tracelink_analyzer::{AnalysisReport, CoverageMetrics};
use tracelink_domain::Gap;
use tracelink_linker::{DecompositionRun, LinkRun};

/// Write a value as pretty JSON to `out`, or to stdout when `None`.
pub fn write_json<T: Serialize>(value: &T, out: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            fs::write(path, json + "\n")?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", json)?;
        }
    }
    Ok(())
}

/// Summary formatter.
pub struct Formatter {
    color_enabled: bool,
    quiet: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(color_enabled: bool, quiet: bool) -> Self {
        Self {
            color_enabled,
            quiet,
        }
    }

    /// Print to stderr unless quiet.
    pub fn emit(&self, text: &str) {
        if !self.quiet {
            eprintln!("{}", text);
        }
    }

    /// Decomposition counters.
    pub fn decomposition_summary(&self, run: &DecompositionRun) -> String {
        self.heading(&run.stats.summary())
    }

    /// Linking statistics, plus oracle usage when the LLM was consulted.
    pub fn link_summary(&self, run: &LinkRun) -> String {
        let mut out = self.heading(&run.stats.summary());
        if run.api_calls.total_calls() > 0 || run.api_calls.total_failures() > 0 {
            out.push_str("\n\n");
            out.push_str(&run.api_calls.summary());
        }
        out
    }

    /// Report summary, coverage table and the most severe gaps.
    pub fn analysis_summary(&self, report: &AnalysisReport) -> String {
        let mut out = self.heading(&report.summary());
        out.push_str("\n\n");
        out.push_str(&coverage_table(&report.coverage));

        let critical: Vec<&Gap> = report
            .gaps
            .iter()
            .filter(|g| g.severity == tracelink_domain::Severity::Critical)
            .collect();
        if !critical.is_empty() {
            out.push_str("\n\n");
            out.push_str(&self.colorize("Critical gaps:", "red"));
            for gap in critical {
                out.push_str(&format!(
                    "\n  {} {} ({})",
                    gap.gap_id,
                    gap.subject.anchor_id(),
                    gap.description
                ));
            }
        }
        out
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Warning line when critical gaps remain.
    pub fn critical_warning(&self, report: &AnalysisReport) -> Option<String> {
        let critical = report.gap_summary.critical;
        (critical > 0).then(|| self.warning(&format!("{} critical gap(s) need attention", critical)))
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize the first line of a block.
    fn heading(&self, block: &str) -> String {
        match block.split_once('\n') {
            Some((first, rest)) => format!("{}\n{}", self.colorize(first, "cyan"), rest),
            None => self.colorize(block, "cyan"),
        }
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Per-kind coverage as a table.
pub fn coverage_table(coverage: &CoverageMetrics) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Kind", "Total", "With parent", "With children", "Linked %"]);

    for kind in &coverage.by_kind {
        builder.push_record([
            kind.kind.to_string(),
            kind.total.to_string(),
            kind.with_parent.to_string(),
            kind.with_children.to_string(),
            format!("{:.1}", kind.linked_percentage),
        ]);
    }

    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracelink_analyzer::{AnalysisConfig, TraceAnalyzer};
    use tracelink_domain::{Artifact, ArtifactKind, ArtifactSet};

    fn report() -> AnalysisReport {
        let artifacts = ArtifactSet::from_artifacts(vec![
            Artifact::new("SYS-001", ArtifactKind::SystemReq, "Prevent wheel skid").unwrap(),
            Artifact::new("HLR-001", ArtifactKind::Hlr, "Limit wheel slip").unwrap(),
        ])
        .unwrap();
        TraceAnalyzer::new(AnalysisConfig::default())
            .unwrap()
            .analyze(&artifacts, &[])
            .unwrap()
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(false, false);
        assert_eq!(formatter.success("test"), "✓ test");
        assert_eq!(formatter.warning("test"), "⚠ test");
    }

    #[test]
    fn test_coverage_table_lists_every_kind() {
        let table = coverage_table(&report().coverage);
        for kind in ArtifactKind::ALL {
            assert!(table.contains(&kind.to_string()), "{}", kind);
        }
        assert!(table.contains("With parent"));
    }

    #[test]
    fn test_analysis_summary_lists_critical_gaps() {
        let formatter = Formatter::new(false, false);
        let summary = formatter.analysis_summary(&report());
        assert!(summary.starts_with("Analysis Summary"));
        assert!(summary.contains("Critical gaps:"));
        assert!(summary.contains("SYS-001"));
    }

    #[test]
    fn test_link_summary_includes_merged_oracle_usage() {
        let mut run = LinkRun {
            links: Vec::new(),
            stats: tracelink_linker::LinkingStats::new(),
            api_calls: tracelink_llm::ApiCallTracker::new(),
        };
        let mut decomposition = tracelink_llm::ApiCallTracker::new();
        decomposition.record_call(tracelink_linker::DECOMPOSITION, 120, 40);
        run.api_calls.merge(&decomposition);

        let summary = Formatter::new(false, false).link_summary(&run);
        assert!(summary.starts_with("Linking Summary"));
        assert!(summary.contains("decomposition: 1 calls"));
    }

    #[test]
    fn test_write_json_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.json");
        write_json(&report().gap_summary, Some(&path)).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["critical"], 1);
    }
}
