use std::sync::Arc;

use harag_core::domain::ContextSet;
use harag_core::error::AppError;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::embeddings::{ensure_same_dims, Embedder};
use crate::retrieve::similarity;
use crate::verify::SimilarityResult;

// Answers at or above this many words count as fully complete on the length axis.
const COMPLETE_ANSWER_WORDS: f64 = 50.0;

/// Scalar evaluation metrics for one answer. Values are raw cosine-derived and not clamped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MetricsReport {
    pub faithfulness: f64,
    pub answer_relevance: f64,
    pub context_precision: f64,
    pub answer_completeness: f64,
}

pub struct MetricsCalculator {
    embedder: Arc<dyn Embedder>,
}

impl MetricsCalculator {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// `semantic`, when present, is reused as faithfulness instead of re-embedding the answer.
    pub fn calculate(
        &self,
        query: &str,
        answer: &str,
        context: &ContextSet,
        semantic: Option<&SimilarityResult>,
    ) -> Result<MetricsReport, AppError> {
        let blank_answer = answer.trim().is_empty();
        let context_vectors = if context.is_empty() {
            Vec::new()
        } else {
            self.embedder.embed_many(&context.texts())?
        };

        let faithfulness = match semantic {
            Some(s) => s.score,
            None if blank_answer || context_vectors.is_empty() => 0.0,
            None => {
                let av = self.embedder.embed_one(answer)?;
                ensure_same_dims(&av, &context_vectors)?;
                similarity::mean_cosine(&av, &context_vectors)
            }
        };

        let answer_relevance = if blank_answer {
            0.0
        } else {
            self.relevance(query, answer)?
        };

        let context_precision = if context_vectors.is_empty() {
            0.0
        } else {
            let qv = self.embedder.embed_one(query)?;
            ensure_same_dims(&qv, &context_vectors)?;
            similarity::mean_cosine(&qv, &context_vectors)
        };

        let words = answer.split_whitespace().count() as f64;
        let answer_completeness = ((words / COMPLETE_ANSWER_WORDS).min(1.0) + answer_relevance) / 2.0;

        let report = MetricsReport {
            faithfulness,
            answer_relevance,
            context_precision,
            answer_completeness,
        };
        debug!(?report, "computed metrics");
        Ok(report)
    }

    fn relevance(&self, query: &str, answer: &str) -> Result<f64, AppError> {
        let pair = self
            .embedder
            .embed_many(&[query.to_string(), answer.to_string()])?;
        match pair.as_slice() {
            [q, a] => {
                ensure_same_dims(q, std::slice::from_ref(a))?;
                Ok(similarity::cosine(q, a) as f64)
            }
            _ => Err(AppError::new(
                "AI_EMBEDDINGS_FAILED",
                "Embedder returned a different number of vectors than inputs",
            )
            .with_details(format!("expected=2; got={}", pair.len()))),
        }
    }
}
