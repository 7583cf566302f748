use std::sync::Arc;

use harag_core::domain::ContextSet;
use harag_core::error::AppError;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::cache::{ContextEmbeddingMemo, ContextEmbeddingPolicy};
use super::sentences::split_sentences;
use crate::embeddings::{ensure_same_dims, Embedder};
use crate::retrieve::similarity;

pub const DEFAULT_SEMANTIC_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityStatus {
    Supported,
    Hallucinated,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SentenceSimilarity {
    pub sentence: String,
    pub max_similarity: f64,
    pub status: SimilarityStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimilarityResult {
    #[serde(rename = "score_similarity")]
    pub score: f64,
    pub details: Vec<SentenceSimilarity>,
}

/// Embedding-based grounding check: each answer sentence must be close to some chunk.
pub struct SemanticVerifier {
    embedder: Arc<dyn Embedder>,
    threshold: f64,
    memo: Option<ContextEmbeddingMemo>,
}

impl SemanticVerifier {
    pub fn new(embedder: Arc<dyn Embedder>, threshold: f64) -> Self {
        Self {
            embedder,
            threshold,
            memo: None,
        }
    }

    pub fn with_policy(mut self, policy: ContextEmbeddingPolicy) -> Self {
        self.memo = match policy {
            ContextEmbeddingPolicy::Fresh => None,
            ContextEmbeddingPolicy::Memoized { max_entries } => Some(ContextEmbeddingMemo::new(max_entries)),
        };
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn check(&self, answer: &str, context: &ContextSet) -> Result<SimilarityResult, AppError> {
        let sentences = split_sentences(answer);
        if sentences.is_empty() {
            return Ok(SimilarityResult {
                score: 0.0,
                details: Vec::new(),
            });
        }

        let context_vectors = self.context_embeddings(context)?;
        let sentence_vectors = self.embedder.embed_many(&sentences)?;
        if sentence_vectors.len() != sentences.len() {
            return Err(AppError::new(
                "AI_EMBEDDINGS_FAILED",
                "Embedder returned a different number of vectors than sentences",
            )
            .with_details(format!("expected={}; got={}", sentences.len(), sentence_vectors.len())));
        }

        let context_norms = context_vectors
            .iter()
            .map(|v| similarity::l2_norm(v))
            .collect::<Vec<_>>();

        let mut supported = 0usize;
        let mut details = Vec::with_capacity(sentences.len());
        for (sentence, sv) in sentences.into_iter().zip(sentence_vectors.iter()) {
            ensure_same_dims(sv, &context_vectors)?;
            let s_norm = similarity::l2_norm(sv);
            let max_similarity = context_vectors
                .iter()
                .zip(context_norms.iter())
                .map(|(cv, c_norm)| similarity::cosine_similarity(sv, cv, s_norm, *c_norm) as f64)
                .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |m| m.max(s))))
                .unwrap_or(0.0);

            let status = if max_similarity >= self.threshold {
                supported += 1;
                SimilarityStatus::Supported
            } else {
                SimilarityStatus::Hallucinated
            };
            details.push(SentenceSimilarity {
                sentence,
                max_similarity,
                status,
            });
        }

        let score = supported as f64 / details.len() as f64;
        debug!(sentences = details.len(), supported, score, "semantic check");
        Ok(SimilarityResult { score, details })
    }

    fn context_embeddings(&self, context: &ContextSet) -> Result<Vec<Vec<f32>>, AppError> {
        if context.is_empty() {
            return Ok(Vec::new());
        }
        let texts = context.texts();
        let vectors = match &self.memo {
            Some(memo) => memo.embed(self.embedder.as_ref(), &texts)?,
            None => self.embedder.embed_many(&texts)?,
        };
        if vectors.len() != texts.len() {
            return Err(AppError::new(
                "AI_EMBEDDINGS_FAILED",
                "Embedder returned a different number of vectors than chunks",
            )
            .with_details(format!("expected={}; got={}", texts.len(), vectors.len())));
        }
        Ok(vectors)
    }
}
