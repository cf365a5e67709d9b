//! Markdown fence stripping for model output.
//!
//! Models routinely wrap code in ```` ``` ```` blocks even when asked
//! not to; the generator normalizes that away before anything else
//! looks at the text.

/// Removes markdown code-fence delimiter lines from `text`.
///
/// Every line whose trimmed form starts with ```` ``` ```` is dropped
/// (including fences carrying a language tag such as ```` ```python ````),
/// the remainder is re-joined and trimmed. Idempotent; empty input
/// yields empty output.
pub fn strip_code_fences(text: &str) -> String {
    let text = text.trim();
    if !text.contains("```") {
        return text.to_string();
    }
    text.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
