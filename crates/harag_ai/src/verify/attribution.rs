use harag_core::domain::ContextSet;
use serde::{Deserialize, Serialize};

use super::citations::extract_citations;
use super::sentences::split_sentences;

pub const DETAIL_SHORT: &str = "Conversational/Short";
pub const DETAIL_MISSING_CITATION: &str = "Missing or invalid citation";

// Sentences with at most this many whitespace tokens may go uncited.
const SHORT_SENTENCE_MAX_TOKENS: usize = 4;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AttributionStatus {
    Supported,
    Unsupported,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SentenceAttribution {
    pub sentence: String,
    pub status: AttributionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<u64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttributionResult {
    #[serde(rename = "score_attribution")]
    pub score: f64,
    pub results: Vec<SentenceAttribution>,
}

/// Check that every substantive sentence of `answer` cites a chunk that exists in `context`.
///
/// A sentence passes with at least one in-range citation, or when it is short enough to be
/// conversational filler. Score is `1 - unsupported / sentences`, and `0.0` for no sentences.
pub fn check_attribution(answer: &str, context: &ContextSet) -> AttributionResult {
    let sentences = split_sentences(answer);
    let mut results = Vec::with_capacity(sentences.len());
    let mut unsupported = 0usize;

    for sentence in sentences {
        let citations = extract_citations(&sentence);
        let cited = citations.iter().any(|&c| context.is_valid_citation(c));

        let entry = if cited {
            SentenceAttribution {
                sentence,
                status: AttributionStatus::Supported,
                detail: None,
                citations: Some(citations),
            }
        } else if sentence.split_whitespace().count() > SHORT_SENTENCE_MAX_TOKENS {
            unsupported += 1;
            SentenceAttribution {
                sentence,
                status: AttributionStatus::Unsupported,
                detail: Some(DETAIL_MISSING_CITATION.to_string()),
                citations: None,
            }
        } else {
            SentenceAttribution {
                sentence,
                status: AttributionStatus::Supported,
                detail: Some(DETAIL_SHORT.to_string()),
                citations: None,
            }
        };
        results.push(entry);
    }

    let score = if results.is_empty() {
        0.0
    } else {
        1.0 - unsupported as f64 / results.len() as f64
    };
    AttributionResult { score, results }
}
