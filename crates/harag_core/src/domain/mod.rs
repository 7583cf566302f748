use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A passage of source text with file/page provenance.
///
/// Notes:
/// - `source` is the originating file's base name (no directories).
/// - `page` is zero-based for paged documents and `None` when the format has no pages.
/// - `chunk_id` is content-derived, so re-ingesting the same file yields the same ids.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    pub chunk_id: String,
    pub text: String,
    pub source: String,
    pub page: Option<u32>,
    pub ordinal: u32,
}

impl Chunk {
    pub fn new(source: impl Into<String>, page: Option<u32>, ordinal: u32, text: impl Into<String>) -> Self {
        let source = source.into();
        let text = text.into();
        let text_sha256 = sha256_hex(text.as_bytes());
        let page_label = page.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string());
        let id_input = format!("v1|{source}|{page_label}|{ordinal}|{text_sha256}");
        Self {
            chunk_id: sha256_hex(id_input.as_bytes()),
            text,
            source,
            page,
            ordinal,
        }
    }

    /// Page number as rendered into prompts; unknown pages render as 0.
    pub fn page_or_default(&self) -> u32 {
        self.page.unwrap_or(0)
    }
}

/// Ordered passages retrieved for one query.
///
/// Position is meaningful: the chunk at index `i` is what `[Source i]` refers to, both in
/// the generation prompt and during verification. The set is never reordered after
/// construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ContextSet {
    chunks: Vec<Chunk>,
}

impl ContextSet {
    pub fn new(chunks: Vec<Chunk>) -> Self {
        Self { chunks }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Chunk> {
        self.chunks.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Chunk> {
        self.chunks.iter()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Chunk texts in citation order.
    pub fn texts(&self) -> Vec<String> {
        self.chunks.iter().map(|c| c.text.clone()).collect()
    }

    /// A citation index is valid iff it addresses a position in this set.
    pub fn is_valid_citation(&self, index: u64) -> bool {
        usize::try_from(index).map(|i| i < self.chunks.len()).unwrap_or(false)
    }
}

impl From<Vec<Chunk>> for ContextSet {
    fn from(chunks: Vec<Chunk>) -> Self {
        Self::new(chunks)
    }
}

impl<'a> IntoIterator for &'a ContextSet {
    type Item = &'a Chunk;
    type IntoIter = std::slice::Iter<'a, Chunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.iter()
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(digest)
}
