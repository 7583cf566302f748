use harag_core::error::AppError;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Embedder;
use crate::ollama::OllamaClient;

const MAX_INPUT_CHARS: usize = 12_000;
const MAX_BATCH: usize = 32;

#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: OllamaClient,
    model: String,
    query_prefix: String,
    document_prefix: String,
}

impl OllamaEmbedder {
    pub fn new(client: OllamaClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            query_prefix: String::new(),
            document_prefix: String::new(),
        }
    }

    /// Prefixes for asymmetric models (e.g. `search_query: ` / `search_document: `).
    pub fn with_prefixes(mut self, query_prefix: impl Into<String>, document_prefix: impl Into<String>) -> Self {
        self.query_prefix = query_prefix.into();
        self.document_prefix = document_prefix.into();
        self
    }

    fn request(&self, inputs: Vec<String>) -> Result<Vec<Vec<f32>>, AppError> {
        let expected = inputs.len();
        let req = EmbedRequest {
            model: &self.model,
            input: inputs,
        };
        let resp: EmbedResponse = self.client.post_json("/api/embed", &req, "AI_EMBEDDINGS_FAILED")?;

        if resp.embeddings.len() != expected {
            return Err(AppError::new(
                "AI_EMBEDDINGS_FAILED",
                "Embeddings response length does not match request",
            )
            .with_details(format!("expected={expected}; got={}", resp.embeddings.len())));
        }
        if resp.embeddings.iter().any(|v| v.is_empty()) {
            return Err(AppError::new(
                "AI_EMBEDDINGS_FAILED",
                "Embeddings response was empty",
            ));
        }
        Ok(resp.embeddings)
    }
}

#[derive(Debug, Clone, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl Embedder for OllamaEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    fn embed_one(&self, input: &str) -> Result<Vec<f32>, AppError> {
        let text = prepare(&self.query_prefix, input);
        self.request(vec![text])?
            .pop()
            .ok_or_else(|| AppError::new("AI_EMBEDDINGS_FAILED", "Embeddings response was empty"))
    }

    fn embed_many(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        let mut out = Vec::with_capacity(inputs.len());
        for batch in inputs.chunks(MAX_BATCH) {
            let texts = batch
                .iter()
                .map(|t| prepare(&self.document_prefix, t))
                .collect::<Vec<_>>();
            out.extend(self.request(texts)?);
        }
        debug!(model = %self.model, count = out.len(), "embedded documents");
        Ok(out)
    }
}

// Keep requests bounded. Chunking enforces reasonable sizes, but guard anyway.
fn prepare(prefix: &str, input: &str) -> String {
    let mut s = String::with_capacity(prefix.len() + input.len().min(MAX_INPUT_CHARS * 4));
    s.push_str(prefix);
    s.extend(input.chars().take(MAX_INPUT_CHARS));
    s
}

#[cfg(test)]
mod tests {
    use super::prepare;

    #[test]
    fn prepare_applies_prefix_and_bounds_length() {
        assert_eq!(prepare("search_query: ", "hi"), "search_query: hi");
        let long = "é".repeat(20_000);
        let out = prepare("", &long);
        assert_eq!(out.chars().count(), 12_000);
    }
}
