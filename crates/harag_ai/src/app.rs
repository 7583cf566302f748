use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread;

use harag_core::error::AppError;
use harag_core::ingest::{DocumentLoader, SkippedDocument};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::config::RagConfig;
use crate::embeddings::{Embedder, OllamaEmbedder};
use crate::generate::generate_answer;
use crate::index::VectorIndex;
use crate::llm::{Llm, OllamaLlm};
use crate::metrics::{MetricsCalculator, MetricsReport};
use crate::ollama::OllamaClient;
use crate::retrieve::retrieve;
use crate::verify::{check_attribution, ClaimVerifier, HallucinationAnalysis, SemanticVerifier, VerificationStrategy};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestSummary {
    pub chunk_count: usize,
    pub file_count: usize,
    pub skipped: Vec<SkippedDocument>,
}

/// One retrieved passage as returned to callers; position is its citation index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContextEntry {
    pub content: String,
    pub source: String,
    pub page: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryResponse {
    pub answer: String,
    pub context: Vec<ContextEntry>,
    pub hallucination_analysis: HallucinationAnalysis,
    pub metrics: MetricsReport,
}

/// Application context: providers, verifiers and the current index.
///
/// Constructed once and shared by reference. The index is swapped whole by `ingest`;
/// `query` holds the read lock only while retrieving.
pub struct RagApp {
    config: RagConfig,
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn Llm>,
    loader: DocumentLoader,
    semantic: SemanticVerifier,
    claims: Option<ClaimVerifier>,
    metrics: MetricsCalculator,
    index: RwLock<Option<VectorIndex>>,
}

impl RagApp {
    /// An app with no index loaded.
    pub fn new(config: RagConfig, embedder: Arc<dyn Embedder>, llm: Arc<dyn Llm>) -> Result<Self, AppError> {
        config.validate()?;
        let semantic = SemanticVerifier::new(embedder.clone(), config.semantic_threshold)
            .with_policy(config.context_embedding_policy());
        let claims = match config.verification_strategy() {
            VerificationStrategy::LlmJudge => Some(ClaimVerifier::new(llm.clone())),
            VerificationStrategy::Disabled => None,
        };
        Ok(Self {
            loader: DocumentLoader::new(config.chunk_size, config.chunk_overlap),
            metrics: MetricsCalculator::new(embedder.clone()),
            semantic,
            claims,
            embedder,
            llm,
            config,
            index: RwLock::new(None),
        })
    }

    /// Like [`RagApp::new`], then restores a persisted index from `<data_dir>/index` if one
    /// exists and was built with the same embedding model.
    pub fn open(config: RagConfig, embedder: Arc<dyn Embedder>, llm: Arc<dyn Llm>) -> Result<Self, AppError> {
        let app = Self::new(config, embedder, llm)?;
        app.restore_index()?;
        Ok(app)
    }

    /// Opens an app backed by the local Ollama server named in `config`.
    ///
    /// Fails with `AI_OLLAMA_UNREACHABLE` or `AI_OLLAMA_UNHEALTHY` when the server does not answer.
    pub fn with_ollama(config: RagConfig) -> Result<Self, AppError> {
        let client = OllamaClient::new(&config.ollama_base_url)?.with_timeout(config.http_timeout());
        client.health_check()?;
        let embedder = OllamaEmbedder::new(client.clone(), config.embedding_model.clone())
            .with_prefixes(config.query_prefix.clone(), config.document_prefix.clone());
        let llm = OllamaLlm::new(client, config.generation_model.clone(), config.temperature);
        Self::open(config, Arc::new(embedder), Arc::new(llm))
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn is_ready(&self) -> bool {
        self.read_index().map(|g| g.is_some()).unwrap_or(false)
    }

    /// Load, chunk and index `files`, persist the index, then swap it in.
    ///
    /// Unloadable files are reported in `skipped`. On any failure the previous index stays.
    pub fn ingest(&self, files: &[PathBuf]) -> Result<IngestSummary, AppError> {
        let corpus = self.loader.load_documents(files)?;
        let chunk_count = corpus.chunks.len();

        let updated_at = OffsetDateTime::now_utc().format(&Rfc3339).map_err(|e| {
            AppError::new("AI_INDEX_BUILD_FAILED", "Failed to format index timestamp").with_details(e.to_string())
        })?;
        let index = VectorIndex::build(self.embedder.as_ref(), corpus.chunks, &updated_at)?;
        index.persist(&self.config.index_dir())?;
        *self.write_index()? = Some(index);

        info!(
            files = corpus.file_count,
            chunks = chunk_count,
            skipped = corpus.skipped.len(),
            "ingest complete"
        );
        Ok(IngestSummary {
            chunk_count,
            file_count: corpus.file_count,
            skipped: corpus.skipped,
        })
    }

    pub fn query(&self, question: &str) -> Result<QueryResponse, AppError> {
        let context = {
            let guard = self.read_index()?;
            retrieve(guard.as_ref(), self.embedder.as_ref(), question, self.config.top_k)?
        };

        let answer = generate_answer(self.llm.as_ref(), question, &context)?.answer;

        let (attribution_check, semantic_check) = thread::scope(|s| {
            let attribution = s.spawn(|| check_attribution(&answer, &context));
            let semantic = self.semantic.check(&answer, &context);
            let attribution = attribution.join().map_err(|_| {
                AppError::new("AI_VERIFICATION_FAILED", "Attribution check did not complete")
            })?;
            Ok::<_, AppError>((attribution, semantic?))
        })?;

        let claim_verification = match &self.claims {
            Some(verifier) => Some(verifier.verify(&answer, &context)?),
            None => None,
        };

        let metrics = self
            .metrics
            .calculate(question, &answer, &context, Some(&semantic_check))?;

        info!(
            sources = context.len(),
            attribution = attribution_check.score,
            similarity = semantic_check.score,
            faithfulness = metrics.faithfulness,
            "query answered"
        );

        let context = context
            .iter()
            .map(|c| ContextEntry {
                content: c.text.clone(),
                source: c.source.clone(),
                page: c.page_or_default(),
            })
            .collect();

        Ok(QueryResponse {
            answer,
            context,
            hallucination_analysis: HallucinationAnalysis {
                attribution_check,
                semantic_check,
                claim_verification,
            },
            metrics,
        })
    }

    fn restore_index(&self) -> Result<(), AppError> {
        let dir = self.config.index_dir();
        match VectorIndex::restore(&dir) {
            Ok(index) if index.model() != self.embedder.model() => {
                warn!(
                    path = %dir.display(),
                    index_model = index.model(),
                    embedder_model = self.embedder.model(),
                    "ignoring persisted index built with a different embedding model"
                );
            }
            Ok(index) => {
                *self.write_index()? = Some(index);
            }
            Err(e) if e.has_code("AI_INDEX_NOT_READY") => {
                info!(path = %dir.display(), "no persisted index; ingest documents to build one");
            }
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "ignoring unreadable persisted index");
            }
        }
        Ok(())
    }

    fn read_index(&self) -> Result<RwLockReadGuard<'_, Option<VectorIndex>>, AppError> {
        self.index
            .read()
            .map_err(|_| AppError::new("AI_INDEX_UNAVAILABLE", "Index lock poisoned"))
    }

    fn write_index(&self) -> Result<RwLockWriteGuard<'_, Option<VectorIndex>>, AppError> {
        self.index
            .write()
            .map_err(|_| AppError::new("AI_INDEX_UNAVAILABLE", "Index lock poisoned"))
    }
}
