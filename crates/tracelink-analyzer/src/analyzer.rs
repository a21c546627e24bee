//! Whole-run analysis

use crate::config::AnalysisConfig;
use crate::coverage::CoverageAnalyzer;
use crate::error::AnalyzerError;
use crate::gaps::GapDetector;
use crate::graph::TraceGraph;
use crate::report::{
    high_level_requirements, low_level_requirements, quality_metrics, system_requirements,
    trace_paths, variables, AnalysisReport, GapSummary, LinkQuality, ReportMetadata,
};
use std::time::{SystemTime, UNIX_EPOCH};
use tracelink_domain::{ArtifactKind, ArtifactSet, Link};
use tracing::info;

/// Builds the analysis report for an artifact set and its links
pub struct TraceAnalyzer {
    config: AnalysisConfig,
}

impl TraceAnalyzer {
    /// Create an analyzer
    pub fn new(config: AnalysisConfig) -> Result<Self, AnalyzerError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Active configuration
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyse `links` over `artifacts`
    ///
    /// Fails only when a link endpoint is not an artifact.
    pub fn analyze(&self, artifacts: &ArtifactSet, links: &[Link]) -> Result<AnalysisReport, AnalyzerError> {
        info!("Analyzing {} artifacts and {} links", artifacts.len(), links.len());
        let graph = TraceGraph::validated(links, artifacts)?;
        Ok(self.analyze_graph(artifacts, &graph, links))
    }

    /// Analyse a graph already built from `links`
    pub fn analyze_graph(&self, artifacts: &ArtifactSet, graph: &TraceGraph, links: &[Link]) -> AnalysisReport {
        let analyzer = CoverageAnalyzer::new(artifacts, graph);
        let coverage = analyzer.coverage();
        let orphans = analyzer.orphans();
        let gaps = GapDetector::new(&analyzer).detect(&orphans);

        let system_requirements = system_requirements(artifacts, graph);
        let high_level_requirements = high_level_requirements(artifacts, graph);
        let low_level_requirements = low_level_requirements(artifacts, graph);
        let quality_metrics = quality_metrics(
            &system_requirements,
            &high_level_requirements,
            &low_level_requirements,
            artifacts,
            graph,
        );

        let report = AnalysisReport {
            variables: variables(artifacts, graph),
            trace_paths: trace_paths(artifacts, graph),
            link_quality: LinkQuality::from_links(links, &self.config.confidence_bands),
            gap_summary: GapSummary::from_gaps(&gaps),
            metadata: ReportMetadata {
                total_artifacts: artifacts.len(),
                total_links: links.len(),
                has_variables: artifacts.count_of(ArtifactKind::CodeVar) > 0,
                generated_at: SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or(0),
            },
            system_requirements,
            high_level_requirements,
            low_level_requirements,
            quality_metrics,
            coverage,
            orphans,
            gaps,
        };

        info!(
            "Found {} gaps; {:.1}% complete chains",
            report.gap_summary.total, report.coverage.end_to_end.complete_percentage
        );
        report
    }
}
