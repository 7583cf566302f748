use harag_core::error::AppError;

/// Text-generation provider. Used both to answer questions and as a claim judge.
pub trait Llm: Send + Sync {
    fn model(&self) -> &str;

    fn generate(&self, prompt: &str) -> Result<String, AppError>;
}

pub mod ollama_llm;

pub use ollama_llm::OllamaLlm;
