use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::Chunk;
use crate::error::AppError;

mod pdf;
pub mod splitter;

pub use splitter::TextSplitter;

/// Text of one page (or of a whole unpaged document).
#[derive(Debug, Clone)]
pub(crate) struct PageText {
    pub page: Option<u32>,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentKind {
    Pdf,
    PlainText,
}

impl DocumentKind {
    fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" => Some(Self::PlainText),
            _ => None,
        }
    }
}

/// A document that could not be loaded; ingestion continues without it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkippedDocument {
    pub path: String,
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadedCorpus {
    pub chunks: Vec<Chunk>,
    pub file_count: usize,
    pub skipped: Vec<SkippedDocument>,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentLoader {
    splitter: TextSplitter,
}

impl DocumentLoader {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            splitter: TextSplitter::new(chunk_size, chunk_overlap),
        }
    }

    /// Load and chunk every file.
    ///
    /// A file that is missing, has an unsupported extension or fails to parse is logged
    /// and recorded in `skipped`. Fails with `INGEST_EMPTY` only when no chunk survives.
    pub fn load_documents(&self, paths: &[PathBuf]) -> Result<LoadedCorpus, AppError> {
        let mut chunks = Vec::new();
        let mut skipped = Vec::new();

        for path in paths {
            match self.load_one(path) {
                Ok(mut file_chunks) => {
                    info!(path = %path.display(), chunks = file_chunks.len(), "loaded document");
                    chunks.append(&mut file_chunks);
                }
                Err(e) => {
                    warn!(path = %path.display(), code = %e.code, error = %e, "skipping document");
                    skipped.push(SkippedDocument {
                        path: path.display().to_string(),
                        code: e.code,
                        message: e.message,
                    });
                }
            }
        }

        if chunks.is_empty() {
            return Err(AppError::new("INGEST_EMPTY", "No documents could be loaded.")
                .with_details(format!("files={}; skipped={}", paths.len(), skipped.len())));
        }

        Ok(LoadedCorpus {
            chunks,
            file_count: paths.len(),
            skipped,
        })
    }

    fn load_one(&self, path: &Path) -> Result<Vec<Chunk>, AppError> {
        if !path.is_file() {
            return Err(AppError::new("INGEST_FILE_NOT_FOUND", "Document file not found")
                .with_details(format!("path={}", path.display())));
        }
        let kind = DocumentKind::from_path(path).ok_or_else(|| {
            AppError::new("INGEST_UNSUPPORTED_TYPE", "Unsupported document type")
                .with_details(format!("path={}", path.display()))
        })?;

        let pages = match kind {
            DocumentKind::Pdf => pdf::load_pdf_pages(path)?,
            DocumentKind::PlainText => vec![PageText {
                page: None,
                text: read_text_file(path)?,
            }],
        };

        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Ok(self.chunk_pages(&source, pages))
    }

    fn chunk_pages(&self, source: &str, pages: Vec<PageText>) -> Vec<Chunk> {
        let mut out = Vec::new();
        let mut ordinal: u32 = 0;
        for page in pages {
            let text = normalize_text(&page.text);
            for piece in self.splitter.split_text(&text) {
                out.push(Chunk::new(source, page.page, ordinal, piece));
                ordinal += 1;
            }
        }
        debug!(source, chunks = out.len(), "chunked document");
        out
    }
}

fn read_text_file(path: &Path) -> Result<String, AppError> {
    let bytes = fs::read(path).map_err(|e| {
        AppError::new("INGEST_LOAD_FAILED", "Failed to read document file")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    String::from_utf8(bytes).map_err(|e| {
        AppError::new("INGEST_LOAD_FAILED", "Document is not valid UTF-8 text")
            .with_details(format!("path={}; err={}", path.display(), e))
    })
}

pub fn normalize_text(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "\n")
}
