//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the linking engine and the
//! oracles it consumes. Implementations live in other crates and are
//! constructed and owned by the orchestrating caller.

/// Embedding and similarity oracle
///
/// Implemented by the infrastructure layer (tracelink-store)
pub trait SimilarityOracle {
    /// Error type for oracle operations
    type Error;

    /// Embed free text
    fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error>;

    /// Precomputed embedding of an indexed artifact, if any
    fn embedding_of(&self, artifact_id: &str) -> Option<&[f32]>;

    /// Ranked `(artifact_id, score)` neighbours with score at least `min_score`
    fn search(
        &self,
        query: &[f32],
        top_k: usize,
        min_score: f32,
    ) -> Result<Vec<(String, f32)>, Self::Error>;
}

/// Trait for LLM provider operations
///
/// Implemented by the infrastructure layer (tracelink-llm)
pub trait LlmProvider {
    /// Error type for LLM operations
    type Error;

    /// Generate text completion
    fn generate(&self, prompt: &str) -> Result<String, Self::Error>;

    /// Generate output constrained to a JSON shape (if supported)
    fn generate_structured(&self, prompt: &str, schema: &str) -> Result<String, Self::Error>;
}
