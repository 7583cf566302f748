use harag_core::domain::ContextSet;
use harag_core::error::AppError;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::llm::Llm;

pub(crate) mod prompts;

pub use prompts::CANNOT_ANSWER;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratedAnswer {
    pub answer: String,
    pub formatted_context: String,
}

/// Render the context in citation order as
/// `[Source <i>] (File: <name>, Page: <page>): <text>` blocks separated by a blank line.
pub fn format_context(context: &ContextSet) -> String {
    let mut out = String::new();
    for (i, chunk) in context.iter().enumerate() {
        out.push_str(&format!(
            "[Source {i}] (File: {}, Page: {}): {}\n\n",
            chunk.source,
            chunk.page_or_default(),
            chunk.text
        ));
    }
    out
}

pub fn generate_answer(llm: &dyn Llm, question: &str, context: &ContextSet) -> Result<GeneratedAnswer, AppError> {
    let formatted_context = format_context(context);
    let prompt = prompts::grounded_answer_prompt(question, &formatted_context);
    let answer = llm.generate(&prompt)?;
    debug!(
        model = llm.model(),
        sources = context.len(),
        answer_chars = answer.chars().count(),
        "generated answer"
    );
    Ok(GeneratedAnswer {
        answer,
        formatted_context,
    })
}
