pub const CANNOT_ANSWER: &str = "I cannot answer this based on the provided documents.";

pub fn grounded_answer_prompt(question: &str, context_blocks: &str) -> String {
    format!(
        r#"You are a trustworthy assistant. Answer the user's question based ONLY on the context passages below.
Each passage is labelled with a numeric source ID.

Rules (non-negotiable):
1) Answer using ONLY the provided context. Do not invent facts.
2) If the answer is not in the context, say "{CANNOT_ANSWER}"
3) Cite the source ID for every sentence you write, in the form [Source ID] (for example [Source 0]).
4) If you are unsure, say so.

Context:
{context_blocks}
Question:
{question}

Answer:
"#
    )
}

pub fn claim_judge_prompt(answer: &str, context: &str) -> String {
    format!(
        r#"You are a fact-checking judge. Decide whether every claim in the answer is supported by the context.

Context:
{context}

Answer:
{answer}

Respond in exactly this format:
Supported: [Yes/No]
Unsupported Sentences: [list any sentences not supported by the context]
Reasoning: [one short explanation]
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grounded_prompt_carries_question_context_and_fallback() {
        let p = grounded_answer_prompt("Where is Paris?", "[Source 0] (File: a.txt, Page: 0): x\n\n");
        assert!(p.contains("Question:\nWhere is Paris?"));
        assert!(p.contains("[Source 0] (File: a.txt, Page: 0): x"));
        assert!(p.contains(CANNOT_ANSWER));
        assert!(p.contains("[Source ID]"));
    }

    #[test]
    fn judge_prompt_names_the_three_line_schema() {
        let p = claim_judge_prompt("A.", "ctx");
        assert!(p.contains("Supported: [Yes/No]"));
        assert!(p.contains("Unsupported Sentences:"));
        assert!(p.contains("Reasoning:"));
    }
}
