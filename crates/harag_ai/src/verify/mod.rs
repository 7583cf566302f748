//! Hallucination checks over a generated answer and the context it was generated from.
//!
//! - `attribution`: citation-marker presence and validity per sentence.
//! - `semantic`: embedding similarity of each sentence to the context.
//! - `claims`: optional LLM judge.
//!
//! The first two are independent and may disagree.

use serde::{Deserialize, Serialize};

pub mod attribution;
pub mod cache;
pub mod citations;
pub mod claims;
pub mod semantic;
pub mod sentences;

pub use attribution::{check_attribution, AttributionResult, AttributionStatus, SentenceAttribution};
pub use cache::ContextEmbeddingPolicy;
pub use citations::extract_citations;
pub use claims::{ClaimVerification, ClaimVerifier};
pub use semantic::{SemanticVerifier, SentenceSimilarity, SimilarityResult, SimilarityStatus};
pub use sentences::split_sentences;

/// Whether the LLM judge runs after the attribution and semantic checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStrategy {
    #[default]
    Disabled,
    LlmJudge,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HallucinationAnalysis {
    pub attribution_check: AttributionResult,
    pub semantic_check: SimilarityResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_verification: Option<ClaimVerification>,
}
