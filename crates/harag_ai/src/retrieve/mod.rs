pub mod similarity;

use harag_core::domain::ContextSet;
use harag_core::error::AppError;
use tracing::debug;

use crate::embeddings::Embedder;
use crate::index::VectorIndex;

pub const MIN_TOP_K: usize = 1;
pub const MAX_TOP_K: usize = 50;

/// Top-`k` chunks for `query`, in citation order.
///
/// `k` is clamped to `1..=50`. `index == None` means nothing has been built or restored yet.
pub fn retrieve(
    index: Option<&VectorIndex>,
    embedder: &dyn Embedder,
    query: &str,
    top_k: usize,
) -> Result<ContextSet, AppError> {
    let Some(index) = index else {
        return Err(AppError::new(
            "AI_INDEX_NOT_READY",
            "Vector index is not built; ingest documents first",
        ));
    };
    let q = query.trim();
    if q.is_empty() {
        return Err(AppError::new("AI_RETRIEVAL_FAILED", "Query is empty"));
    }
    let k = top_k.clamp(MIN_TOP_K, MAX_TOP_K);

    let hits = index.search(embedder, q, k)?;
    debug!(
        k,
        hits = hits.len(),
        top_score = hits.first().map(|h| h.score).unwrap_or(0.0),
        "retrieved context"
    );
    Ok(ContextSet::new(hits.into_iter().map(|h| h.chunk).collect()))
}
