//! Prompt templates for answer generation and correction.
//!
//! Templates use plain `format!()` interpolation.

/// System prompt for first-pass answer generation.
pub const ANSWER_SYSTEM_PROMPT: &str =
    "Answer the user's question factually and concisely in a few sentences.";

/// Builds the correction prompt: every evidence passage is placed in the
/// context, followed by the question.
///
/// # Example
/// ```
/// use veracity::llm::prompts::correction_prompt;
///
/// let prompt = correction_prompt(
///     "What is the capital of France?",
///     &["Paris is the capital of France.".to_string()],
/// );
/// assert!(prompt.contains("Paris is the capital of France."));
/// assert!(prompt.ends_with("Answer:"));
/// ```
pub fn correction_prompt(question: &str, evidence: &[String]) -> String {
    let context = evidence
        .iter()
        .map(|passage| passage.trim())
        .filter(|passage| !passage.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"Use only the following pieces of context to answer the question at the end.
If the context does not contain the answer, say that you don't know instead of guessing.

Context:
{context}

Question: {question}
Answer:"#
    )
}
