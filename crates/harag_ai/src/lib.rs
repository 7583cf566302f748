pub mod app;
pub mod config;
pub mod embeddings;
pub mod generate;
pub mod index;
pub mod llm;
pub mod metrics;
pub mod ollama;
pub mod retrieve;
pub mod verify;

pub use app::{ContextEntry, IngestSummary, QueryResponse, RagApp};
pub use config::RagConfig;
