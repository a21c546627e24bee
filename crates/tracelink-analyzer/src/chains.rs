//! Chain enumeration and classification

use crate::graph::TraceGraph;
use serde::Serialize;
use tracelink_domain::{ArtifactKind, ArtifactSet, ChainClass};

/// Every downward path from `root` to a leaf
///
/// Uses an explicit stack of `(node, path)` frames. A node already on the
/// current path is never revisited, so malformed cyclic input still
/// terminates; a node whose every child is on its path ends a path. Paths
/// come out in the same order as a recursive depth-first walk, one per leaf
/// reached.
pub fn enumerate_forward(graph: &TraceGraph, root: &str) -> Vec<Vec<String>> {
    walk(root, |id| graph.children(id), false)
}

/// Every upward path ending at `start`, ordered from the top node down
pub fn enumerate_backward(graph: &TraceGraph, start: &str) -> Vec<Vec<String>> {
    walk(start, |id| graph.parents(id), true)
}

fn walk<'g, F>(start: &str, next: F, reverse: bool) -> Vec<Vec<String>>
where
    F: Fn(&str) -> &'g [String],
{
    let mut paths = Vec::new();
    let mut stack: Vec<(String, Vec<String>)> = vec![(start.to_string(), Vec::new())];

    while let Some((node, mut path)) = stack.pop() {
        path.push(node.clone());

        let unvisited: Vec<&String> = next(&node)
            .iter()
            .filter(|n| !path.contains(*n))
            .collect();

        if unvisited.is_empty() {
            if reverse {
                path.reverse();
            }
            paths.push(path);
            continue;
        }
        for n in unvisited.into_iter().rev() {
            stack.push((n.clone(), path.clone()));
        }
    }
    paths
}

/// A path and its classification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedChain {
    /// Node ids from root to leaf
    pub path: Vec<String>,

    /// Classification
    pub classification: ChainClass,
}

impl ClassifiedChain {
    /// Number of nodes on the path
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Last node reached
    pub fn leaf(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or_default()
    }
}

/// Classifies root-to-leaf paths against the type hierarchy
pub struct ChainClassifier<'a> {
    artifacts: &'a ArtifactSet,
}

impl<'a> ChainClassifier<'a> {
    /// Create a classifier over an artifact set
    pub fn new(artifacts: &'a ArtifactSet) -> Self {
        Self { artifacts }
    }

    /// Classify one path; `None` for an empty path
    ///
    /// - `COMPLETE`: ends at `CODE_VAR` at or beyond the root's expected depth
    /// - `INCOMPLETE`: the root alone
    /// - `PARTIAL`: shorter than expected with every step moving down the
    ///   hierarchy
    /// - `BROKEN`: anything else, including unknown nodes
    pub fn classify(&self, path: &[String]) -> Option<ChainClass> {
        if path.is_empty() {
            return None;
        }
        let kinds: Option<Vec<ArtifactKind>> =
            path.iter().map(|id| self.artifacts.kind_of(id)).collect();
        let Some(kinds) = kinds else {
            return Some(if path.len() == 1 {
                ChainClass::Incomplete
            } else {
                ChainClass::Broken
            });
        };

        let expected = kinds[0].expected_chain_depth();
        let depth = path.len();
        let terminal = kinds[kinds.len() - 1];

        let class = if terminal == ArtifactKind::CodeVar && depth >= expected {
            ChainClass::Complete
        } else if depth == 1 {
            ChainClass::Incomplete
        } else if depth < expected && descends(&kinds) {
            ChainClass::Partial
        } else {
            ChainClass::Broken
        };
        Some(class)
    }

    /// Enumerate and classify every path below `root`
    pub fn chains_from(&self, graph: &TraceGraph, root: &str) -> Vec<ClassifiedChain> {
        enumerate_forward(graph, root)
            .into_iter()
            .filter_map(|path| {
                self.classify(&path).map(|classification| ClassifiedChain {
                    path,
                    classification,
                })
            })
            .collect()
    }
}

fn descends(kinds: &[ArtifactKind]) -> bool {
    kinds.windows(2).all(|w| w[1].level() > w[0].level())
}

/// Chain counts by classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ChainTally {
    /// Paths counted
    pub total: usize,
    /// `COMPLETE` paths
    pub complete: usize,
    /// `PARTIAL` paths
    pub partial: usize,
    /// `INCOMPLETE` paths
    pub incomplete: usize,
    /// `BROKEN` paths
    pub broken: usize,
}

impl ChainTally {
    /// Count one classified path
    pub fn record(&mut self, class: ChainClass) {
        self.total += 1;
        match class {
            ChainClass::Complete => self.complete += 1,
            ChainClass::Partial => self.partial += 1,
            ChainClass::Incomplete => self.incomplete += 1,
            ChainClass::Broken => self.broken += 1,
        }
    }

    /// Share of complete paths, in percent
    pub fn complete_percentage(&self) -> f64 {
        crate::percentage(self.complete, self.total)
    }
}
