use std::collections::HashMap;
use std::sync::Mutex;

use harag_core::domain::sha256_hex;
use harag_core::error::AppError;
use tracing::debug;

use crate::embeddings::Embedder;

/// How the semantic check obtains context-chunk embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextEmbeddingPolicy {
    /// Re-embed every chunk on every check.
    #[default]
    Fresh,
    /// Keep chunk embeddings across checks; the memo is emptied once it would exceed
    /// `max_entries`.
    Memoized { max_entries: usize },
}

impl ContextEmbeddingPolicy {
    /// `0` disables memoization.
    pub fn from_cache_entries(max_entries: usize) -> Self {
        if max_entries == 0 {
            Self::Fresh
        } else {
            Self::Memoized { max_entries }
        }
    }
}

#[derive(Debug)]
pub(crate) struct ContextEmbeddingMemo {
    max_entries: usize,
    entries: Mutex<HashMap<String, Vec<f32>>>,
}

impl ContextEmbeddingMemo {
    pub(crate) fn new(max_entries: usize) -> Self {
        Self {
            max_entries,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Embeddings for `texts` in order; misses are embedded in one batch.
    pub(crate) fn embed(&self, embedder: &dyn Embedder, texts: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        let keys = texts.iter().map(|t| memo_key(embedder.model(), t)).collect::<Vec<_>>();

        let mut found: Vec<Option<Vec<f32>>> = {
            let memo = self.entries.lock().unwrap_or_else(|p| p.into_inner());
            keys.iter().map(|k| memo.get(k).cloned()).collect()
        };
        let misses = found
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_none())
            .map(|(i, _)| i)
            .collect::<Vec<_>>();
        debug!(hits = texts.len() - misses.len(), misses = misses.len(), "context embedding memo");

        if !misses.is_empty() {
            let miss_texts = misses.iter().map(|&i| texts[i].clone()).collect::<Vec<_>>();
            let vectors = embedder.embed_many(&miss_texts)?;
            if vectors.len() != misses.len() {
                return Err(AppError::new(
                    "AI_EMBEDDINGS_FAILED",
                    "Embedder returned a different number of vectors than inputs",
                )
                .with_details(format!("expected={}; got={}", misses.len(), vectors.len())));
            }

            let mut memo = self.entries.lock().unwrap_or_else(|p| p.into_inner());
            if memo.len() + misses.len() > self.max_entries {
                memo.clear();
            }
            for (&i, v) in misses.iter().zip(vectors) {
                if memo.len() < self.max_entries {
                    memo.insert(keys[i].clone(), v.clone());
                }
                found[i] = Some(v);
            }
        }

        Ok(found.into_iter().flatten().collect())
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().map(|m| m.len()).unwrap_or(0)
    }
}

fn memo_key(model: &str, text: &str) -> String {
    sha256_hex(format!("{model}\n{text}").as_bytes())
}
