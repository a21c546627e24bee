//! Tracelink Similarity Layer
//!
//! Implements the `SimilarityOracle` trait over an HNSW vector index.
//!
//! # Architecture
//!
//! - A local embedding model turns artifact text into unit vectors
//! - HNSW answers nearest-neighbour queries over every indexed artifact
//! - Embeddings are computed once at build time and reused by the linker
//!
//! The oracle is explicitly constructed and owned by the caller; nothing in
//! this crate keeps global state.
//!
//! # Examples
//!
//! ```
//! use tracelink_domain::{Artifact, ArtifactKind, ArtifactSet};
//! use tracelink_domain::traits::SimilarityOracle;
//! use tracelink_store::EmbeddingIndex;
//! use tracelink_store::embedding::HashingEmbeddingModel;
//!
//! let artifacts = ArtifactSet::from_artifacts(vec![
//!     Artifact::new("HLR-001", ArtifactKind::Hlr, "Compute wheel slip ratio").unwrap(),
//!     Artifact::new("LLR-001", ArtifactKind::Llr, "Wheel slip ratio shall be computed every cycle").unwrap(),
//! ]).unwrap();
//!
//! let index = EmbeddingIndex::build(HashingEmbeddingModel::new(384), &artifacts).unwrap();
//! let query = index.embedding_of("HLR-001").unwrap().to_vec();
//! let hits = index.search(&query, 5, 0.1).unwrap();
//! assert_eq!(hits[0].0, "HLR-001");
//! ```

#![warn(missing_docs)]

pub mod embedding;
pub mod vector_index;

use embedding::{cosine_similarity, EmbeddingError, EmbeddingModel};
use std::collections::HashMap;
use thiserror::Error;
use tracelink_domain::traits::SimilarityOracle;
use tracelink_domain::{Artifact, ArtifactSet};
use tracing::{debug, warn};
use vector_index::{VectorIndex, VectorIndexError};

/// Errors that can occur in the similarity layer
#[derive(Error, Debug)]
pub enum StoreError {
    /// Embedding generation failed
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Vector index rejected an operation
    #[error("Index error: {0}")]
    Index(#[from] VectorIndexError),
}

/// Text an artifact is embedded from: its statement plus extracted keywords
pub fn embedding_text(artifact: &Artifact) -> String {
    let mut text = artifact.text.clone();
    if let Some(name) = &artifact.name {
        text.push(' ');
        text.push_str(name);
    }
    for keyword in &artifact.extracted.keywords {
        text.push(' ');
        text.push_str(keyword);
    }
    text
}

/// HNSW-backed similarity oracle over a fixed artifact set
pub struct EmbeddingIndex<M: EmbeddingModel> {
    model: M,
    index: VectorIndex,
    embeddings: HashMap<String, Vec<f32>>,
}

impl<M: EmbeddingModel> EmbeddingIndex<M> {
    /// Create an empty index for the given model
    pub fn new(model: M) -> Self {
        let index = VectorIndex::new(model.dimension());
        Self {
            model,
            index,
            embeddings: HashMap::new(),
        }
    }

    /// Embed and index every artifact in the set
    ///
    /// Artifacts whose text cannot be embedded are skipped with a warning;
    /// the linker later treats them as having no embedding.
    pub fn build(model: M, artifacts: &ArtifactSet) -> Result<Self, StoreError> {
        let mut oracle = Self::new(model);
        for artifact in artifacts.iter() {
            match oracle.insert(&artifact.id, &embedding_text(artifact)) {
                Ok(()) => {}
                Err(StoreError::Embedding(e)) => {
                    warn!("No embedding for {}: {}", artifact.id, e);
                }
                Err(e) => return Err(e),
            }
        }
        debug!("Indexed {} of {} artifacts", oracle.len(), artifacts.len());
        Ok(oracle)
    }

    /// Embed `text` and index it under `id`
    pub fn insert(&mut self, id: &str, text: &str) -> Result<(), StoreError> {
        let embedding = self.model.embed(text)?;
        self.index.add(id, &embedding)?;
        self.embeddings.insert(id.to_string(), embedding);
        Ok(())
    }

    /// Number of indexed artifacts
    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    /// Whether nothing is indexed
    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }
}

impl<M: EmbeddingModel> SimilarityOracle for EmbeddingIndex<M> {
    type Error = StoreError;

    fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error> {
        Ok(self.model.embed(text)?)
    }

    fn embedding_of(&self, artifact_id: &str) -> Option<&[f32]> {
        self.embeddings.get(artifact_id).map(Vec::as_slice)
    }

    fn search(
        &self,
        query: &[f32],
        top_k: usize,
        min_score: f32,
    ) -> Result<Vec<(String, f32)>, Self::Error> {
        let mut hits = self.index.search(query, top_k)?;
        hits.retain(|(_, score)| *score >= min_score);
        Ok(hits)
    }
}

/// Exact-search oracle over explicitly supplied vectors
///
/// Scores are plain cosine similarity, so callers can script exact
/// similarity values. Suited to small artifact sets and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOracle {
    embeddings: Vec<(String, Vec<f32>)>,
}

impl InMemoryOracle {
    /// Create an empty oracle
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an embedding for an artifact (replacing any previous one)
    pub fn add(&mut self, id: impl Into<String>, embedding: Vec<f32>) {
        let id = id.into();
        self.embeddings.retain(|(existing, _)| *existing != id);
        self.embeddings.push((id, embedding));
    }

    /// Builder-style [`add`](Self::add)
    pub fn with(mut self, id: impl Into<String>, embedding: Vec<f32>) -> Self {
        self.add(id, embedding);
        self
    }
}

impl SimilarityOracle for InMemoryOracle {
    type Error = StoreError;

    fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error> {
        Err(StoreError::Embedding(EmbeddingError::InferenceFailed(format!(
            "In-memory oracle has no model for '{}'",
            text
        ))))
    }

    fn embedding_of(&self, artifact_id: &str) -> Option<&[f32]> {
        self.embeddings
            .iter()
            .find(|(id, _)| id == artifact_id)
            .map(|(_, e)| e.as_slice())
    }

    fn search(
        &self,
        query: &[f32],
        top_k: usize,
        min_score: f32,
    ) -> Result<Vec<(String, f32)>, Self::Error> {
        let mut hits: Vec<(String, f32)> = self
            .embeddings
            .iter()
            .map(|(id, e)| (id.clone(), cosine_similarity(query, e)))
            .filter(|(_, score)| *score >= min_score)
            .collect();
        hits.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        hits.truncate(top_k);
        Ok(hits)
    }
}
