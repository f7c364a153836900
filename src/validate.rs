//! Acceptance checks applied to model output before it reaches the caller.

use crate::error::{DigestError, Result};

/// Characters of a rejected response quoted in the error message.
const PREVIEW_CHARS: usize = 100;

/// Returns the summary, or an explanatory placeholder when it is empty or
/// shorter than `min_chars`.
pub fn accept_summary(text: &str, name: &str, min_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.chars().count() < min_chars {
        return format!(
            "The model returned a very short or empty summary for '{}'. This might indicate \
an issue with the content or the summarization process.",
            name
        );
    }
    trimmed.to_string()
}

/// Accepts a report only if it is a full HTML document.
pub fn validate_html(text: &str) -> Result<String> {
    let trimmed = text.trim_start();
    let starts_with_doctype = trimmed
        .get(..14)
        .map(|prefix| prefix.eq_ignore_ascii_case("<!doctype html"))
        .unwrap_or(false);

    if starts_with_doctype {
        return Ok(text.to_string());
    }

    let preview: String = text.chars().take(PREVIEW_CHARS).collect();
    Err(DigestError::Validation(format!(
        "model did not return a valid HTML document. Received: {}...",
        preview
    )))
}
