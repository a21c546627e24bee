//! Per-layer linking statistics

use crate::config::Layer;
use std::collections::BTreeMap;

/// Counters for one linking stage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerStats {
    /// Source artifacts that went through candidate generation
    pub sources_processed: usize,

    /// Source artifacts skipped (no embedding or oracle search failure)
    pub sources_skipped: usize,

    /// Neighbours of the target kind that were scored
    pub candidates_evaluated: usize,

    /// Candidates that cleared the gate and the layer floor
    pub candidates_accepted: usize,

    /// Adjudication calls made
    pub oracle_calls: usize,

    /// Adjudications that fell back to heuristic acceptance
    pub oracle_fallbacks: usize,

    /// Links created
    pub links_created: usize,
}

impl LayerStats {
    /// Links created per scored candidate
    pub fn selectivity(&self) -> f64 {
        if self.candidates_evaluated == 0 {
            0.0
        } else {
            self.links_created as f64 / self.candidates_evaluated as f64
        }
    }
}

/// Statistics for a whole linking run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkingStats {
    /// Deterministic decomposition links
    pub decomposition_links: usize,

    layers: BTreeMap<Layer, LayerStats>,
}

impl LinkingStats {
    /// Create empty statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters for one stage
    pub fn layer(&self, layer: Layer) -> LayerStats {
        self.layers.get(&layer).cloned().unwrap_or_default()
    }

    fn entry(&mut self, layer: Layer) -> &mut LayerStats {
        self.layers.entry(layer).or_default()
    }

    /// Record a source that went through candidate generation
    pub fn record_source(&mut self, layer: Layer, evaluated: usize, accepted: usize) {
        let stats = self.entry(layer);
        stats.sources_processed += 1;
        stats.candidates_evaluated += evaluated;
        stats.candidates_accepted += accepted;
    }

    /// Record a skipped source
    pub fn record_skip(&mut self, layer: Layer) {
        self.entry(layer).sources_skipped += 1;
    }

    /// Record an adjudication call and whether it fell back
    pub fn record_oracle_call(&mut self, layer: Layer, fell_back: bool) {
        let stats = self.entry(layer);
        stats.oracle_calls += 1;
        if fell_back {
            stats.oracle_fallbacks += 1;
        }
    }

    /// Record created links
    pub fn record_links(&mut self, layer: Layer, count: usize) {
        self.entry(layer).links_created += count;
    }

    /// Record deterministic decomposition links
    pub fn record_decomposition(&mut self, count: usize) {
        self.decomposition_links += count;
    }

    /// Links created across all stages
    pub fn total_links(&self) -> usize {
        self.decomposition_links + self.layers.values().map(|s| s.links_created).sum::<usize>()
    }

    /// Adjudication calls across all stages
    pub fn total_oracle_calls(&self) -> usize {
        self.layers.values().map(|s| s.oracle_calls).sum()
    }

    /// Generate a summary report
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Linking Summary".to_string(),
            "===============".to_string(),
            format!("Decomposition links: {}", self.decomposition_links),
        ];

        for layer in Layer::ALL {
            let s = self.layer(layer);
            lines.push(format!(
                "  {}: {} links from {} sources ({} skipped), {} candidates scored, {} accepted, selectivity {:.1}%",
                layer,
                s.links_created,
                s.sources_processed,
                s.sources_skipped,
                s.candidates_evaluated,
                s.candidates_accepted,
                s.selectivity() * 100.0
            ));
            if s.oracle_calls > 0 {
                lines.push(format!(
                    "    oracle: {} calls, {} fallbacks",
                    s.oracle_calls, s.oracle_fallbacks
                ));
            }
        }

        lines.push(format!("Total links: {}", self.total_links()));
        lines.join("\n")
    }
}
