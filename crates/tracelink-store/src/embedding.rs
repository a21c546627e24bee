//! Embedding Model for Text Vectorization
//!
//! This module provides text-to-vector conversion for similarity search.
//!
//! # Architecture
//!
//! - **EmbeddingModel**: Trait for any text encoder
//! - **HashingEmbeddingModel**: Deterministic feature-hashing encoder that
//!   needs no model files. Texts sharing words share vector components, so
//!   lexical overlap shows up as cosine similarity.
//!
//! # Examples
//!
//! ```rust
//! use tracelink_store::embedding::{cosine_similarity, EmbeddingModel, HashingEmbeddingModel};
//!
//! let model = HashingEmbeddingModel::new(384);
//! let a = model.embed("The BCU shall compute wheel slip").unwrap();
//! let b = model.embed("Compute wheel slip ratio").unwrap();
//! let c = model.embed("Display altitude on the cockpit panel").unwrap();
//! assert!(cosine_similarity(&a, &b) > cosine_similarity(&a, &c));
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Errors that can occur during embedding generation
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Invalid input text
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Model inference error
    #[error("Model inference failed: {0}")]
    InferenceFailed(String),
}

/// Trait for embedding models
pub trait EmbeddingModel {
    /// Generate a unit-length embedding vector for the given text
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Get the dimension of embeddings produced by this model
    fn dimension(&self) -> usize;
}

/// Feature-hashing embedding model
///
/// Each lowercase word and adjacent word pair is hashed to a signed
/// component; the vector is then normalised to unit length. The result is:
///
/// - **Deterministic**: Same text always produces same embedding
/// - **Normalized**: All vectors have unit length (for cosine similarity)
/// - **Lexical**: Shared vocabulary raises similarity
pub struct HashingEmbeddingModel {
    dimension: usize,
}

impl HashingEmbeddingModel {
    /// Create a new model
    ///
    /// # Parameters
    ///
    /// - `dimension`: The embedding dimension (e.g., 384)
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn bucket(feature: &str, dimension: usize) -> (usize, f32) {
        let mut hasher = DefaultHasher::new();
        feature.hash(&mut hasher);
        let hash = hasher.finish();
        let index = (hash % dimension as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        (index, sign)
    }
}

impl EmbeddingModel for HashingEmbeddingModel {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if self.dimension == 0 {
            return Err(EmbeddingError::InferenceFailed(
                "Embedding dimension must be positive".to_string(),
            ));
        }

        let words: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|w| !w.is_empty())
            .map(|w| w.to_lowercase())
            .collect();

        if words.is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "Empty text cannot be embedded".to_string(),
            ));
        }

        let mut embedding = vec![0.0f32; self.dimension];
        for word in &words {
            let (index, sign) = Self::bucket(word, self.dimension);
            embedding[index] += sign;
        }
        for pair in words.windows(2) {
            let (index, sign) = Self::bucket(&format!("{} {}", pair[0], pair[1]), self.dimension);
            embedding[index] += 0.5 * sign;
        }

        // Normalize to unit length for cosine similarity
        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut embedding {
                *value /= magnitude;
            }
        }

        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Calculate cosine similarity between two embedding vectors
///
/// Returns a value in [-1, 1]; vectors of different length or zero
/// magnitude have similarity 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}
