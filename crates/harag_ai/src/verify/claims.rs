use std::sync::Arc;

use harag_core::domain::ContextSet;
use harag_core::error::AppError;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::generate::prompts::claim_judge_prompt;
use crate::llm::Llm;

pub const JUDGE_CONTEXT_MAX_CHARS: usize = 4000;
pub const SUPPORTED_MARKER: &str = "Supported: Yes";

const SCORE_SUPPORTED: f64 = 1.0;
const SCORE_NOT_SUPPORTED: f64 = 0.5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClaimVerification {
    #[serde(rename = "score_faithfulness")]
    pub score: f64,
    pub agent_response: String,
}

/// Asks a judge model whether the answer is supported by the context.
///
/// Anything other than a literal `Supported: Yes` in the response counts as not supported;
/// malformed judge output is never an error.
pub struct ClaimVerifier {
    llm: Arc<dyn Llm>,
}

impl ClaimVerifier {
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self { llm }
    }

    pub fn verify(&self, answer: &str, context: &ContextSet) -> Result<ClaimVerification, AppError> {
        let prompt = claim_judge_prompt(answer, &judge_context(context));
        let agent_response = self.llm.generate(&prompt)?;
        let supported = agent_response.contains(SUPPORTED_MARKER);
        debug!(model = self.llm.model(), supported, "claim verification");
        Ok(ClaimVerification {
            score: if supported { SCORE_SUPPORTED } else { SCORE_NOT_SUPPORTED },
            agent_response,
        })
    }
}

/// Chunk texts joined by blank lines, cut to the first 4000 characters.
pub fn judge_context(context: &ContextSet) -> String {
    let joined = context.texts().join("\n\n");
    match joined.char_indices().nth(JUDGE_CONTEXT_MAX_CHARS) {
        Some((cut, _)) => joined[..cut].to_string(),
        None => joined,
    }
}
