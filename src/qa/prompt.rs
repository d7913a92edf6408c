//! Prompt template used for every question.

/// Default number of leading document characters placed into the prompt.
pub const DEFAULT_EXCERPT_CHARS: usize = 2000;

/// Return at most the first `max_chars` characters of `text`, never splitting a character.
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Assemble the prompt from the document excerpt and the question as given.
pub fn build_prompt(document: &str, question: &str, max_chars: usize) -> String {
    format!(
        "Context: {}\n\nQuestion: {question}\n\nAnswer:",
        excerpt(document, max_chars)
    )
}
