//! Adjacency view over a link collection
//!
//! The graph is derived state: it is rebuilt from links whenever needed and
//! never stored as the authoritative record.

use crate::error::AnalyzerError;
use std::collections::BTreeMap;
use tracelink_domain::{ArtifactKind, ArtifactSet, Link};

/// Directed trace graph (`source → target` is downward)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceGraph {
    edges_down: BTreeMap<String, Vec<String>>,
    edges_up: BTreeMap<String, Vec<String>>,
    edge_count: usize,
}

impl TraceGraph {
    /// Build adjacency from link endpoints
    ///
    /// Neighbour lists keep link order. A repeated `(source, target)` pair
    /// contributes one edge.
    pub fn from_links(links: &[Link]) -> Self {
        let mut graph = Self::default();
        for link in links {
            graph.add_edge(&link.source_id, &link.target_id);
        }
        graph
    }

    /// Build adjacency, rejecting links whose endpoints are not artifacts
    pub fn validated(links: &[Link], artifacts: &ArtifactSet) -> Result<Self, AnalyzerError> {
        for link in links {
            for endpoint in [&link.source_id, &link.target_id] {
                if !artifacts.contains(endpoint) {
                    return Err(AnalyzerError::UnknownArtifact {
                        link_id: link.id.clone(),
                        artifact_id: endpoint.clone(),
                    });
                }
            }
        }
        Ok(Self::from_links(links))
    }

    fn add_edge(&mut self, source: &str, target: &str) {
        let children = self.edges_down.entry(source.to_string()).or_default();
        if children.iter().any(|c| c == target) {
            return;
        }
        children.push(target.to_string());
        self.edges_up
            .entry(target.to_string())
            .or_default()
            .push(source.to_string());
        self.edge_count += 1;
    }

    /// Direct children of `id`
    pub fn children(&self, id: &str) -> &[String] {
        self.edges_down.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Direct parents of `id`
    pub fn parents(&self, id: &str) -> &[String] {
        self.edges_up.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `id` has at least one parent
    pub fn has_parent(&self, id: &str) -> bool {
        !self.parents(id).is_empty()
    }

    /// Whether `id` has at least one child
    pub fn has_children(&self, id: &str) -> bool {
        !self.children(id).is_empty()
    }

    /// Children of `id` whose artifact is of `kind`
    pub fn children_of_kind<'g>(
        &'g self,
        id: &str,
        kind: ArtifactKind,
        artifacts: &ArtifactSet,
    ) -> Vec<&'g str> {
        self.children(id)
            .iter()
            .filter(|c| artifacts.kind_of(c) == Some(kind))
            .map(String::as_str)
            .collect()
    }

    /// Parents of `id` whose artifact is one of `kinds`
    pub fn parents_of_kind<'g>(
        &'g self,
        id: &str,
        kinds: &[ArtifactKind],
        artifacts: &ArtifactSet,
    ) -> Vec<&'g str> {
        self.parents(id)
            .iter()
            .filter(|p| artifacts.kind_of(p).is_some_and(|k| kinds.contains(&k)))
            .map(String::as_str)
            .collect()
    }

    /// Number of distinct edges
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Downward adjacency
    pub fn edges_down(&self) -> &BTreeMap<String, Vec<String>> {
        &self.edges_down
    }

    /// Upward adjacency
    pub fn edges_up(&self) -> &BTreeMap<String, Vec<String>> {
        &self.edges_up
    }
}
