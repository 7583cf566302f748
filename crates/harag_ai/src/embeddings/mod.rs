use harag_core::error::AppError;

/// Text to vector provider.
///
/// `embed_one` is for query-like strings and `embed_many` for document-like strings.
/// Implementations may encode the two differently, but every vector they return must be
/// cosine-comparable with every other. `embed_many` preserves input order.
pub trait Embedder: Send + Sync {
    fn model(&self) -> &str;

    fn embed_one(&self, input: &str) -> Result<Vec<f32>, AppError>;

    fn embed_many(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AppError>;
}

/// Fails with `AI_EMBEDDINGS_FAILED` unless every vector in `others` has the length of `reference`.
pub(crate) fn ensure_same_dims(reference: &[f32], others: &[Vec<f32>]) -> Result<(), AppError> {
    match others.iter().find(|v| v.len() != reference.len()) {
        Some(v) => Err(AppError::new(
            "AI_EMBEDDINGS_FAILED",
            "Embedder returned vectors of different dimensions",
        )
        .with_details(format!("expected={}; got={}", reference.len(), v.len()))),
        None => Ok(()),
    }
}

pub mod ollama_embed;

pub use ollama_embed::OllamaEmbedder;
