use std::fs;
use std::path::{Path, PathBuf};

use harag_core::domain::Chunk;
use harag_core::error::AppError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::embeddings::Embedder;
use crate::retrieve::similarity;

const STATUS_FILE: &str = "index_status.json";
const ENTRIES_FILE: &str = "index_entries.json";
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexStatus {
    pub format_version: u32,
    pub model: String,
    pub dims: u32,
    pub chunk_count: u32,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    chunk: Chunk,
    vector: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub chunk: Chunk,
    pub score: f32,
}

/// Exact cosine-similarity index over chunk embeddings.
///
/// Rebuilding is a whole-index replace. Persisted as two JSON files in one directory, each
/// written to a temp file then renamed; the status file is written last and marks the index
/// complete.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    status: IndexStatus,
    entries: Vec<IndexEntry>,
    norms: Vec<f32>,
}

impl VectorIndex {
    pub fn build(embedder: &dyn Embedder, chunks: Vec<Chunk>, updated_at: &str) -> Result<Self, AppError> {
        if chunks.is_empty() {
            return Err(AppError::new(
                "AI_INDEX_BUILD_FAILED",
                "No chunks available; ingest documents before building the index",
            ));
        }

        let texts = chunks.iter().map(|c| c.text.clone()).collect::<Vec<_>>();
        let vectors = embedder.embed_many(&texts).map_err(|e| {
            AppError::new("AI_EMBEDDINGS_FAILED", "Failed to compute embeddings")
                .with_details(format!("chunks={}; err={}", chunks.len(), e))
                .with_retryable(e.retryable)
        })?;
        if vectors.len() != chunks.len() {
            return Err(AppError::new(
                "AI_INDEX_BUILD_FAILED",
                "Embedder returned a different number of vectors than chunks",
            )
            .with_details(format!("chunks={}; vectors={}", chunks.len(), vectors.len())));
        }

        let dims = vectors[0].len();
        for (chunk, v) in chunks.iter().zip(vectors.iter()) {
            if v.len() != dims {
                return Err(AppError::new(
                    "AI_INDEX_BUILD_FAILED",
                    "Embedding dimension mismatch across chunks",
                )
                .with_details(format!("expected={}; got={}; chunk_id={}", dims, v.len(), chunk.chunk_id)));
            }
        }

        let entries = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexEntry { chunk, vector })
            .collect::<Vec<_>>();

        let status = IndexStatus {
            format_version: FORMAT_VERSION,
            model: embedder.model().to_string(),
            dims: dims as u32,
            chunk_count: entries.len() as u32,
            updated_at: updated_at.to_string(),
        };
        info!(model = %status.model, dims, chunks = entries.len(), "built vector index");
        Ok(Self::from_parts(status, entries))
    }

    fn from_parts(status: IndexStatus, entries: Vec<IndexEntry>) -> Self {
        let norms = entries.iter().map(|e| similarity::l2_norm(&e.vector)).collect();
        Self {
            status,
            entries,
            norms,
        }
    }

    pub fn status(&self) -> &IndexStatus {
        &self.status
    }

    pub fn model(&self) -> &str {
        &self.status.model
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn persist(&self, dir: &Path) -> Result<(), AppError> {
        fs::create_dir_all(dir).map_err(|e| {
            AppError::new("AI_INDEX_PERSIST_FAILED", "Failed to create index directory")
                .with_details(format!("path={}; err={}", dir.display(), e))
        })?;
        write_json_atomic(&dir.join(ENTRIES_FILE), &self.entries)?;
        write_json_atomic(&dir.join(STATUS_FILE), &self.status)?;
        info!(path = %dir.display(), chunks = self.entries.len(), "persisted vector index");
        Ok(())
    }

    pub fn restore(dir: &Path) -> Result<Self, AppError> {
        let status_path = dir.join(STATUS_FILE);
        if !status_path.exists() {
            return Err(AppError::new(
                "AI_INDEX_NOT_READY",
                "No persisted index found; ingest documents first",
            )
            .with_details(format!("path={}", dir.display())));
        }
        let status: IndexStatus = read_json(&status_path)?;
        if status.format_version != FORMAT_VERSION {
            return Err(AppError::new("AI_INDEX_CORRUPT", "Unsupported index format version")
                .with_details(format!("expected={FORMAT_VERSION}; got={}", status.format_version)));
        }
        let entries: Vec<IndexEntry> = read_json(&dir.join(ENTRIES_FILE))?;

        if entries.len() != status.chunk_count as usize {
            return Err(AppError::new("AI_INDEX_CORRUPT", "Index entry count does not match status")
                .with_details(format!("expected={}; got={}", status.chunk_count, entries.len())));
        }
        if let Some(bad) = entries.iter().find(|e| e.vector.len() != status.dims as usize) {
            return Err(AppError::new("AI_INDEX_CORRUPT", "Index vector dims mismatch")
                .with_details(format!(
                    "chunk_id={}; expected={}; got={}",
                    bad.chunk.chunk_id,
                    status.dims,
                    bad.vector.len()
                )));
        }

        info!(path = %dir.display(), chunks = entries.len(), model = %status.model, "restored vector index");
        Ok(Self::from_parts(status, entries))
    }

    /// Top-`k` chunks by descending cosine similarity to `query`; ties by `chunk_id` asc.
    pub fn search(&self, embedder: &dyn Embedder, query: &str, k: usize) -> Result<Vec<SearchHit>, AppError> {
        let qv = embedder.embed_one(query)?;
        if qv.len() != self.status.dims as usize {
            return Err(AppError::new(
                "AI_RETRIEVAL_FAILED",
                "Query embedding dims do not match index dims",
            )
            .with_details(format!("index_dims={}; query_dims={}", self.status.dims, qv.len())));
        }
        let qnorm = similarity::l2_norm(&qv);

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .zip(self.norms.iter())
            .enumerate()
            .map(|(i, (e, norm))| (i, similarity::cosine_similarity(&qv, &e.vector, qnorm, *norm)))
            .collect();

        // NaN scores rank below every number.
        let rank = |score: f32| if score.is_nan() { f32::NEG_INFINITY } else { score };
        scored.sort_by(|a, b| {
            rank(b.1)
                .total_cmp(&rank(a.1))
                .then_with(|| self.entries[a.0].chunk.chunk_id.cmp(&self.entries[b.0].chunk.chunk_id))
        });
        scored.truncate(k);

        debug!(k, hits = scored.len(), "index search");
        Ok(scored
            .into_iter()
            .map(|(i, score)| SearchHit {
                chunk: self.entries[i].chunk.clone(),
                score,
            })
            .collect())
    }
}

pub fn default_index_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("index")
}

fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), AppError> {
    let tmp = path.with_extension("tmp");
    let json = serde_json::to_vec(value).map_err(|e| {
        AppError::new("AI_INDEX_PERSIST_FAILED", "Failed to encode index file")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    fs::write(&tmp, json).map_err(|e| {
        AppError::new("AI_INDEX_PERSIST_FAILED", "Failed to write index file")
            .with_details(format!("path={}; err={}", tmp.display(), e))
    })?;
    fs::rename(&tmp, path).map_err(|e| {
        AppError::new("AI_INDEX_PERSIST_FAILED", "Failed to finalize index file write")
            .with_details(format!("tmp={}; dest={}; err={}", tmp.display(), path.display(), e))
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let bytes = fs::read(path).map_err(|e| {
        AppError::new("AI_INDEX_CORRUPT", "Failed to read index file")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    serde_json::from_slice(&bytes).map_err(|e| {
        AppError::new("AI_INDEX_CORRUPT", "Failed to decode index file")
            .with_details(format!("path={}; err={}", path.display(), e))
    })
}
