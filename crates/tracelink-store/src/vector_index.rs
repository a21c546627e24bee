//! HNSW Vector Index for Similarity Search
//!
//! This module wraps the HNSW algorithm for nearest-neighbour search over
//! artifact embeddings.
//!
//! # HNSW Parameters
//!
//! - **M**: Number of bi-directional links per node (default: 16)
//!   Higher M = better accuracy but more memory
//! - **efConstruction**: Size of dynamic candidate list during construction (default: 200)
//!   Higher efConstruction = better index quality but slower build
//! - **efSearch**: Size of dynamic candidate list during search (at least 64)
//!   Higher efSearch = better recall but slower queries

use hnsw_rs::prelude::*;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

/// Default HNSW parameters
const DEFAULT_M: usize = 16;
const DEFAULT_EF_CONSTRUCTION: usize = 200;
const DEFAULT_MAX_ELEMENTS: usize = 100_000;
const MIN_EF_SEARCH: usize = 64;

/// Errors that can occur during vector index operations
#[derive(Error, Debug)]
pub enum VectorIndexError {
    /// Invalid embedding dimension
    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension provided
        actual: usize,
    },

    /// Identifier already indexed
    #[error("Duplicate entry: {0}")]
    Duplicate(String),
}

/// A wrapper around HNSW for vector similarity search
///
/// This index stores `(artifact_id, embedding)` pairs and answers
/// nearest-neighbour queries with cosine similarity scores.
///
/// # Examples
///
/// ```
/// use tracelink_store::vector_index::VectorIndex;
///
/// let index = VectorIndex::new(3);
/// index.add("HLR-001", &[1.0, 0.0, 0.0]).unwrap();
/// index.add("HLR-002", &[0.0, 1.0, 0.0]).unwrap();
///
/// let results = index.search(&[1.0, 0.0, 0.0], 1).unwrap();
/// assert_eq!(results[0].0, "HLR-001");
/// ```
pub struct VectorIndex {
    /// Expected embedding dimension
    dimension: usize,

    /// HNSW graph
    hnsw: Mutex<Hnsw<'static, f32, DistCosine>>,

    /// Internal HNSW ids to artifact ids
    ids: Mutex<HashMap<usize, String>>,
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn new_hnsw() -> Hnsw<'static, f32, DistCosine> {
    let nb_layer = 16.min((DEFAULT_MAX_ELEMENTS as f32).ln().trunc() as usize);
    Hnsw::<'static, f32, DistCosine>::new(
        DEFAULT_M,
        DEFAULT_MAX_ELEMENTS,
        nb_layer,
        DEFAULT_EF_CONSTRUCTION,
        DistCosine {},
    )
}

impl VectorIndex {
    /// Create a new vector index with the specified dimension
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            hnsw: Mutex::new(new_hnsw()),
            ids: Mutex::new(HashMap::new()),
        }
    }

    /// Embedding dimension accepted by this index
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Add an embedding under an artifact id
    pub fn add(&self, id: &str, embedding: &[f32]) -> Result<(), VectorIndexError> {
        self.check_dimension(embedding)?;

        let mut ids = locked(&self.ids);
        if ids.values().any(|existing| existing == id) {
            return Err(VectorIndexError::Duplicate(id.to_string()));
        }
        let internal_id = ids.len();
        ids.insert(internal_id, id.to_string());
        drop(ids);

        // hnsw_rs copies the slice into its own storage
        locked(&self.hnsw).insert((embedding, internal_id));

        Ok(())
    }

    /// Search for the k nearest neighbours to the given embedding
    ///
    /// Returns `(artifact_id, similarity)` pairs sorted by similarity
    /// (descending).
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(String, f32)>, VectorIndexError> {
        self.check_dimension(query)?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let hnsw = locked(&self.hnsw);
        let ids = locked(&self.ids);
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let ef_search = k.max(MIN_EF_SEARCH);
        let mut results: Vec<(String, f32)> = hnsw
            .search(query, k, ef_search)
            .into_iter()
            .filter_map(|neighbour| {
                ids.get(&neighbour.d_id).map(|id| {
                    // DistCosine returns 1 - cosine
                    (id.clone(), 1.0 - neighbour.distance)
                })
            })
            .collect();

        results.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(results)
    }

    /// Get the number of vectors in the index
    pub fn len(&self) -> usize {
        locked(&self.ids).len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), VectorIndexError> {
        if vector.len() != self.dimension {
            return Err(VectorIndexError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}
