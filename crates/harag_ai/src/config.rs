//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `HARAG_*` environment variables.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use harag_core::error::AppError;

use crate::index::default_index_dir;
use crate::ollama::OllamaClient;
use crate::retrieve::{MAX_TOP_K, MIN_TOP_K};
use crate::verify::semantic::DEFAULT_SEMANTIC_THRESHOLD;
use crate::verify::{ContextEmbeddingPolicy, VerificationStrategy};

pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://127.0.0.1:11434";

#[derive(Debug, Clone, PartialEq)]
pub struct RagConfig {
    /// Root for persisted state; the index lives in `<data_dir>/index`. Default: `data`.
    pub data_dir: PathBuf,
    /// Local Ollama endpoint. Only `127.0.0.1` is accepted.
    pub ollama_base_url: String,
    /// Default: `mistral`.
    pub generation_model: String,
    /// Default: `all-minilm`.
    pub embedding_model: String,
    /// Sampling temperature for answer generation. Default: `0.1`.
    pub temperature: f32,
    pub query_prefix: String,
    pub document_prefix: String,
    /// Unset means the HTTP client's own behavior (no explicit timeout).
    pub http_timeout_secs: Option<u64>,
    /// Default: `3`.
    pub top_k: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub semantic_threshold: f64,
    pub claim_verification: bool,
    /// `0` re-embeds context chunks on every check.
    pub context_cache_entries: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            ollama_base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            generation_model: "mistral".to_string(),
            embedding_model: "all-minilm".to_string(),
            temperature: 0.1,
            query_prefix: String::new(),
            document_prefix: String::new(),
            http_timeout_secs: None,
            top_k: 3,
            chunk_size: 1000,
            chunk_overlap: 200,
            semantic_threshold: DEFAULT_SEMANTIC_THRESHOLD,
            claim_verification: false,
            context_cache_entries: 0,
        }
    }
}

impl RagConfig {
    const ENV_DATA_DIR: &'static str = "HARAG_DATA_DIR";
    const ENV_OLLAMA_BASE_URL: &'static str = "HARAG_OLLAMA_BASE_URL";
    const ENV_GENERATION_MODEL: &'static str = "HARAG_GENERATION_MODEL";
    const ENV_EMBEDDING_MODEL: &'static str = "HARAG_EMBEDDING_MODEL";
    const ENV_TEMPERATURE: &'static str = "HARAG_TEMPERATURE";
    const ENV_QUERY_PREFIX: &'static str = "HARAG_QUERY_PREFIX";
    const ENV_DOCUMENT_PREFIX: &'static str = "HARAG_DOCUMENT_PREFIX";
    const ENV_HTTP_TIMEOUT_SECS: &'static str = "HARAG_HTTP_TIMEOUT_SECS";
    const ENV_TOP_K: &'static str = "HARAG_TOP_K";
    const ENV_CHUNK_SIZE: &'static str = "HARAG_CHUNK_SIZE";
    const ENV_CHUNK_OVERLAP: &'static str = "HARAG_CHUNK_OVERLAP";
    const ENV_SEMANTIC_THRESHOLD: &'static str = "HARAG_SEMANTIC_THRESHOLD";
    const ENV_CLAIM_VERIFICATION: &'static str = "HARAG_CLAIM_VERIFICATION";
    const ENV_CONTEXT_CACHE_ENTRIES: &'static str = "HARAG_CONTEXT_CACHE_ENTRIES";

    /// Defaults overlaid with `HARAG_*` environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let d = Self::default();

        let config = Self {
            data_dir: get(Self::ENV_DATA_DIR).map(PathBuf::from).unwrap_or(d.data_dir),
            ollama_base_url: get(Self::ENV_OLLAMA_BASE_URL).unwrap_or(d.ollama_base_url),
            generation_model: get(Self::ENV_GENERATION_MODEL).unwrap_or(d.generation_model),
            embedding_model: get(Self::ENV_EMBEDDING_MODEL).unwrap_or(d.embedding_model),
            temperature: parse_or(Self::ENV_TEMPERATURE, get(Self::ENV_TEMPERATURE), d.temperature)?,
            // Prefixes may legitimately end in whitespace; read them untrimmed.
            query_prefix: lookup(Self::ENV_QUERY_PREFIX).unwrap_or(d.query_prefix),
            document_prefix: lookup(Self::ENV_DOCUMENT_PREFIX).unwrap_or(d.document_prefix),
            http_timeout_secs: match get(Self::ENV_HTTP_TIMEOUT_SECS) {
                Some(v) => Some(parse(Self::ENV_HTTP_TIMEOUT_SECS, &v)?),
                None => d.http_timeout_secs,
            },
            top_k: parse_or(Self::ENV_TOP_K, get(Self::ENV_TOP_K), d.top_k)?,
            chunk_size: parse_or(Self::ENV_CHUNK_SIZE, get(Self::ENV_CHUNK_SIZE), d.chunk_size)?,
            chunk_overlap: parse_or(Self::ENV_CHUNK_OVERLAP, get(Self::ENV_CHUNK_OVERLAP), d.chunk_overlap)?,
            semantic_threshold: parse_or(
                Self::ENV_SEMANTIC_THRESHOLD,
                get(Self::ENV_SEMANTIC_THRESHOLD),
                d.semantic_threshold,
            )?,
            claim_verification: match get(Self::ENV_CLAIM_VERIFICATION) {
                Some(v) => parse_bool(Self::ENV_CLAIM_VERIFICATION, &v)?,
                None => d.claim_verification,
            },
            context_cache_entries: parse_or(
                Self::ENV_CONTEXT_CACHE_ENTRIES,
                get(Self::ENV_CONTEXT_CACHE_ENTRIES),
                d.context_cache_entries,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks basic invariants. Does not touch the filesystem or network.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(invalid("data_dir must not be empty"));
        }
        if self.generation_model.trim().is_empty() || self.embedding_model.trim().is_empty() {
            return Err(invalid("model names must not be empty"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(invalid("temperature must be within 0.0..=2.0")
                .with_details(format!("temperature={}", self.temperature)));
        }
        if !(MIN_TOP_K..=MAX_TOP_K).contains(&self.top_k) {
            return Err(invalid("top_k out of range")
                .with_details(format!("top_k={}; allowed={MIN_TOP_K}..={MAX_TOP_K}", self.top_k)));
        }
        if self.chunk_size == 0 || self.chunk_overlap >= self.chunk_size {
            return Err(invalid("chunk_overlap must be smaller than a non-zero chunk_size")
                .with_details(format!("chunk_size={}; chunk_overlap={}", self.chunk_size, self.chunk_overlap)));
        }
        if !(-1.0..=1.0).contains(&self.semantic_threshold) {
            return Err(invalid("semantic_threshold must be a cosine value in -1.0..=1.0")
                .with_details(format!("semantic_threshold={}", self.semantic_threshold)));
        }
        if self.http_timeout_secs == Some(0) {
            return Err(invalid("http_timeout_secs must be positive when set"));
        }
        OllamaClient::new(&self.ollama_base_url).map(|_| ()).map_err(|e| {
            invalid("ollama_base_url is not an allowed local endpoint").with_details(e.to_string())
        })
    }

    pub fn index_dir(&self) -> PathBuf {
        default_index_dir(Path::new(&self.data_dir))
    }

    pub fn http_timeout(&self) -> Option<Duration> {
        self.http_timeout_secs.map(Duration::from_secs)
    }

    pub fn verification_strategy(&self) -> VerificationStrategy {
        if self.claim_verification {
            VerificationStrategy::LlmJudge
        } else {
            VerificationStrategy::Disabled
        }
    }

    pub fn context_embedding_policy(&self) -> ContextEmbeddingPolicy {
        ContextEmbeddingPolicy::from_cache_entries(self.context_cache_entries)
    }
}

fn invalid(message: &str) -> AppError {
    AppError::new("CONFIG_INVALID", message)
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, AppError> {
    value
        .parse::<T>()
        .map_err(|_| invalid("Could not parse environment value").with_details(format!("{key}={value}")))
}

fn parse_or<T: FromStr>(key: &str, value: Option<String>, default: T) -> Result<T, AppError> {
    match value {
        Some(v) => parse(key, &v),
        None => Ok(default),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, AppError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid("Could not parse boolean environment value").with_details(format!("{key}={value}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let c = RagConfig::from_lookup(|_| None).unwrap();
        assert_eq!(c, RagConfig::default());
        assert_eq!(c.index_dir(), PathBuf::from("data").join("index"));
        assert_eq!(c.verification_strategy(), VerificationStrategy::Disabled);
        assert_eq!(c.context_embedding_policy(), ContextEmbeddingPolicy::Fresh);
        assert_eq!(c.http_timeout(), None);
    }

    #[test]
    fn overrides_are_applied() {
        let c = RagConfig::from_lookup(lookup(&[
            ("HARAG_DATA_DIR", "/srv/rag"),
            ("HARAG_TOP_K", "5"),
            ("HARAG_CLAIM_VERIFICATION", "yes"),
            ("HARAG_CONTEXT_CACHE_ENTRIES", "128"),
            ("HARAG_HTTP_TIMEOUT_SECS", "30"),
            ("HARAG_QUERY_PREFIX", "search_query: "),
            ("HARAG_OLLAMA_BASE_URL", "http://127.0.0.1:9999"),
        ]))
        .unwrap();
        assert_eq!(c.data_dir, PathBuf::from("/srv/rag"));
        assert_eq!(c.top_k, 5);
        assert_eq!(c.verification_strategy(), VerificationStrategy::LlmJudge);
        assert_eq!(c.context_embedding_policy(), ContextEmbeddingPolicy::Memoized { max_entries: 128 });
        assert_eq!(c.http_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(c.query_prefix, "search_query: ");
        assert_eq!(c.ollama_base_url, "http://127.0.0.1:9999");
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let c = RagConfig::from_lookup(lookup(&[("HARAG_TOP_K", "  "), ("HARAG_GENERATION_MODEL", "")])).unwrap();
        assert_eq!(c.top_k, 3);
        assert_eq!(c.generation_model, "mistral");
    }

    #[test]
    fn bad_values_are_config_errors() {
        for pairs in [
            vec![("HARAG_TOP_K", "three")],
            vec![("HARAG_TOP_K", "0")],
            vec![("HARAG_TOP_K", "51")],
            vec![("HARAG_CHUNK_OVERLAP", "1000")],
            vec![("HARAG_CLAIM_VERIFICATION", "maybe")],
            vec![("HARAG_SEMANTIC_THRESHOLD", "1.5")],
            vec![("HARAG_HTTP_TIMEOUT_SECS", "0")],
            vec![("HARAG_OLLAMA_BASE_URL", "http://example.com:11434")],
        ] {
            let err = RagConfig::from_lookup(lookup(&pairs)).unwrap_err();
            assert_eq!(err.code, "CONFIG_INVALID", "{pairs:?}");
        }
    }
}
