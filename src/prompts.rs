//! Message templates for every completion call.
//!
//! Builders are pure: they take text and settings and return the role-tagged
//! message list. Model, temperature and token limits are attached by
//! [`crate::pipeline`].

use std::borrow::Cow;
use tracing::info;

use crate::config::SummaryConfig;
use crate::models::{ChatTurn, Role};

pub const SUMMARY_SYSTEM_PROMPT: &str = "You are an expert summarization assistant. \
Write a detailed, well-structured summary of the text you are given. Cover the key points, \
important figures, dates and conclusions, so that a reader understands the main aspects of \
the document without reading it in full.";

/// Separator placed between source summaries in the chat context.
pub const SUMMARY_SEPARATOR: &str = "\n\n---\n\n";

pub const NO_CONTEXT_PROMPT: &str = "You are a helpful AI assistant. No source material \
has been selected for this conversation, so answer the question from general knowledge \
and say so when it matters.";

pub const REPORT_SYSTEM_PROMPT: &str = "You are an expert HTML generator. Create a valid, \
well-formatted HTML document from the user's request. The output must be a complete \
document starting with <!DOCTYPE html> and containing html, head and body tags.";

/// Layout brief embedded in every report request.
pub const REPORT_DESIGN_BRIEF: &str = "Design requirements:
1. Bento grid layout: a compact grid of cards of different sizes, each card holding one category of information.
2. Cards: 20px border radius, white or light gray background, a subtle shadow, and a slight lift on hover.
3. Colors: a minimal white and light gray palette with a gradient accent, for example from light purple #C084FC to deep purple #7E22CE.
4. Typography:
- large bold numbers and headings in the gradient accent for key data points
- medium headings for card titles that name the content category
- small gray text for supporting descriptions
5. Content order:
- top row: the main message, highlights or key metrics
- middle row: details, specifications and features
- bottom row: guidance and the conclusion or call to action
6. Visual elements: simple icons for features, progress bars or charts for comparisons, small pill-shaped tags for categories.
7. Responsive: the page must stay readable on mobile screens.
Style reference: a product specification page with generous whitespace, few words, emphasized numbers and clear spacing between cards.";

pub const REPORT_OUTPUT_RULE: &str = "Output rules: output only the HTML code and nothing else. \
Do not wrap it in Markdown code fences such as ```html ... ```; the first characters of \
your answer must be <!DOCTYPE html>.";

/// Cuts `text` to at most `max_tokens * chars_per_token` characters.
///
/// Returns the (possibly borrowed) text and whether anything was cut. Cuts
/// always land on a char boundary.
pub fn truncate_for_budget(text: &str, max_tokens: usize, chars_per_token: usize) -> (Cow<'_, str>, bool) {
    let max_chars = max_tokens.saturating_mul(chars_per_token);
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (Cow::Borrowed(&text[..byte_idx]), true),
        None => (Cow::Borrowed(text), false),
    }
}

/// `[system, user]` messages asking for a detailed summary of `text`.
pub fn summary_messages(text: &str, name: &str, budget: &SummaryConfig) -> Vec<ChatTurn> {
    let (body, truncated) = truncate_for_budget(text, budget.max_input_tokens, budget.chars_per_token);
    if truncated {
        info!(
            document = name,
            original_chars = text.chars().count(),
            kept_chars = budget.max_input_chars(),
            "source text truncated for summarization"
        );
    }

    let name_part = if name.trim().is_empty() {
        String::new()
    } else {
        format!(" for the document titled '{}'", name)
    };

    vec![
        ChatTurn::system(SUMMARY_SYSTEM_PROMPT),
        ChatTurn::user(format!(
            "Please provide a detailed summary of the following text{}:\n\n---\n{}\n---\n\nDetailed Summary:",
            name_part, body
        )),
    ]
}

/// System turn that grounds the answer in the selected summaries.
pub fn chat_context(summaries: &[String]) -> String {
    let selected: Vec<&str> = summaries
        .iter()
        .map(|s| s.as_str())
        .filter(|s| !s.trim().is_empty())
        .collect();
    if selected.is_empty() {
        return NO_CONTEXT_PROMPT.to_string();
    }

    format!(
        "Relevant context from the selected sources:\n{}{}Answer the question using only \
the material above. If the material does not contain the answer, say so plainly instead \
of guessing.",
        selected.join(SUMMARY_SEPARATOR),
        SUMMARY_SEPARATOR
    )
}

/// Conversation history, the current message, then one system turn.
///
/// Callers usually send the current message as the last history entry; it
/// is only appended when it isn't already there.
pub fn chat_messages(mut history: Vec<ChatTurn>, message: &str, summaries: &[String]) -> Vec<ChatTurn> {
    let message = message.trim();
    let already_last = history
        .last()
        .map(|t| t.role == Role::User && t.content.trim() == message)
        .unwrap_or(false);
    if !message.is_empty() && !already_last {
        history.push(ChatTurn::user(message));
    }
    history.push(ChatTurn::system(chat_context(summaries)));
    history
}

/// `[system, user]` messages asking for a standalone HTML report.
pub fn report_messages(title: &str, summary: &str) -> Vec<ChatTurn> {
    vec![
        ChatTurn::system(REPORT_SYSTEM_PROMPT),
        ChatTurn::user(format!(
            "Generate a complete HTML document from the following text. It should be well \
structured, easy to read and presentable as a report. Use the title '{}' for the <title> tag \
and as the main <h1> heading.\n\nContent:\n{}\n\n{}\n\n{}",
            title, summary, REPORT_DESIGN_BRIEF, REPORT_OUTPUT_RULE
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_char_boundaries() {
        let (out, cut) = truncate_for_budget("héllo wörld", 2, 2);
        assert_eq!(out, "héll");
        assert!(cut);

        let (out, cut) = truncate_for_budget("short", 10, 4);
        assert_eq!(out, "short");
        assert!(!cut);

        let (out, cut) = truncate_for_budget("exact", 5, 1);
        assert_eq!(out, "exact");
        assert!(!cut);
    }

    #[test]
    fn summary_prompt_embeds_name_and_truncated_text() {
        let budget = SummaryConfig {
            max_input_tokens: 2,
            chars_per_token: 4,
            ..SummaryConfig::default()
        };
        let messages = summary_messages("0123456789abcdef", "notes.txt", &budget);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
        assert!(messages[1].content.contains("titled 'notes.txt'"));
        assert!(messages[1].content.contains("---\n01234567\n---"));
        assert!(!messages[1].content.contains('8'));
    }

    #[test]
    fn grounded_template_when_summaries_present() {
        let summaries = vec!["First source.".to_string(), "Second source.".to_string()];
        let messages = chat_messages(vec![ChatTurn::user("What is it?")], "What is it?", &summaries);

        assert_eq!(messages.len(), 2);
        let system = messages.last().unwrap();
        assert_eq!(system.role, Role::System);
        assert!(system.content.contains("First source.\n\n---\n\nSecond source."));
        assert!(system.content.contains("only"));
        assert!(!system.content.contains("general knowledge"));
    }

    #[test]
    fn general_template_without_summaries() {
        let messages = chat_messages(Vec::new(), "Hello?", &[]);
        assert_eq!(messages, vec![ChatTurn::user("Hello?"), ChatTurn::system(NO_CONTEXT_PROMPT)]);

        let blank_only = chat_messages(Vec::new(), "Hello?", &["  ".to_string()]);
        assert_eq!(blank_only.last().unwrap().content, NO_CONTEXT_PROMPT);
    }

    #[test]
    fn current_message_is_appended_once() {
        let history = vec![ChatTurn::user("Earlier"), ChatTurn::assistant("Answer")];
        let messages = chat_messages(history, "Follow-up", &[]);
        let roles: Vec<Role> = messages.iter().map(|t| t.role).collect();
        assert_eq!(roles, [Role::User, Role::Assistant, Role::User, Role::System]);
        assert_eq!(messages[2].content, "Follow-up");
    }

    #[test]
    fn report_prompt_carries_title_content_and_rules() {
        let messages = report_messages("Quarterly Review", "Revenue grew 12%.");
        assert_eq!(messages[0].content, REPORT_SYSTEM_PROMPT);
        let user = &messages[1].content;
        assert!(user.contains("'Quarterly Review'"));
        assert!(user.contains("Revenue grew 12%."));
        assert!(user.contains("Bento grid"));
        assert!(user.contains("code fences"));
    }
}
