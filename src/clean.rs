//! Heuristic cleanup of flattened caption text.
//!
//! [`STAGES`] lists the filters in the order they run. Later stages assume
//! the noise handled by earlier ones is already gone, so the order is part of
//! the behavior. [`clean_transcript`] repeats the whole pass until the text
//! stops changing, which makes cleaning idempotent.
//!
//! The phrase lists and the uppercase threshold are best-effort: they can
//! drop legitimate content (an acronym-heavy short line, a transcript that
//! happens to start with "Follow us on") and miss noise they don't know about.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::{DigestError, Result};

/// A single cleaning pass.
pub type Stage = fn(&str) -> String;

pub const STAGES: &[(&str, Stage)] = &[
    ("attributions", strip_attributions),
    ("promotions", strip_promotions),
    ("urls", strip_urls),
    ("timing_residue", strip_timing_residue),
    ("shouting_lines", drop_shouting_lines),
    ("blank_lines", collapse_blank_lines),
];

/// Lines at or above this length are never treated as headers.
const SHOUT_MAX_CHARS: usize = 50;
/// Share of uppercase non-whitespace characters above which a short line is dropped.
const SHOUT_UPPER_RATIO: f64 = 0.7;

static ATTRIBUTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?im)^[ \t]*(?:subtitles generated by|subtitles by|transcript by|captions by)[^\n]*(?:\n|$)",
    )
    .expect("valid attribution regex")
});

static PROMOTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?im)^[ \t]*(?:visit our website|support us on patreon|check out our merch|follow us on|please consider subscribing|like and subscribe)[^\n]*(?:\n|$)",
    )
    .expect("valid promotion regex")
});

static SCHEME_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:https?|ftp)://[-\w+&@#/%?=~|!:,.;]*[-\w+&@#/%=~|]")
        .expect("valid url regex")
});

static WWW_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bwww\.[-\w+&@#/%?=~|!:,.;]*[-\w+&@#/%=~|]").expect("valid www regex")
});

static TIMESTAMP_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:\d{1,2}:)?\d{2}:\d{2}[,.]\d{3}[ \t]*-->[^\n]*(?:\n|$)",
    )
    .expect("valid timestamp regex")
});

static SEQUENCE_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*\d+[ \t]*$").expect("valid sequence regex"));

static BLANK_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("valid blank-run regex"));

/// Runs every stage until the output is stable.
///
/// Returns [`DigestError::EmptyContent`] when nothing is left.
pub fn clean_transcript(text: &str) -> Result<String> {
    // Every line break is a bare \n from here on.
    let mut current = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut passes = 0;

    loop {
        let next = clean_once(&current);
        passes += 1;
        // Every stage only removes text, so an unchanged pass means a fixpoint.
        if next == current {
            break;
        }
        current = next;
    }

    debug!(
        input_chars = text.len(),
        output_chars = current.len(),
        passes,
        "caption text cleaned"
    );

    if current.trim().is_empty() {
        return Err(DigestError::EmptyContent);
    }
    Ok(current)
}

/// One pass through [`STAGES`].
pub fn clean_once(text: &str) -> String {
    STAGES
        .iter()
        .fold(text.to_string(), |acc, (_, stage)| stage(&acc))
}

/// Removes "Subtitles by …", "Transcript by …" style lines.
pub fn strip_attributions(text: &str) -> String {
    ATTRIBUTION_RE.replace_all(text, "").into_owned()
}

/// Removes lines that open with a channel plug.
pub fn strip_promotions(text: &str) -> String {
    PROMOTION_RE.replace_all(text, "").into_owned()
}

pub fn strip_urls(text: &str) -> String {
    let text = SCHEME_URL_RE.replace_all(text, "");
    WWW_URL_RE.replace_all(&text, "").into_owned()
}

/// Removes SRT/VTT timing lines and bare sequence numbers the parser left behind.
pub fn strip_timing_residue(text: &str) -> String {
    let text = TIMESTAMP_LINE_RE.replace_all(text, "");
    SEQUENCE_LINE_RE.replace_all(&text, "").into_owned()
}

/// Drops short lines that are mostly uppercase (`[MUSIC]`, `APPLAUSE`, headers).
pub fn drop_shouting_lines(text: &str) -> String {
    text.split('\n')
        .filter(|line| !is_shouting(line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_shouting(line: &str) -> bool {
    let stripped = line.trim();
    if stripped.is_empty() || stripped.chars().count() >= SHOUT_MAX_CHARS {
        return false;
    }
    let visible = stripped.chars().filter(|c| !c.is_whitespace()).count();
    let upper = stripped.chars().filter(|c| c.is_uppercase()).count();
    upper as f64 / visible as f64 > SHOUT_UPPER_RATIO
}

pub fn collapse_blank_lines(text: &str) -> String {
    BLANK_RUN_RE.replace_all(text, "\n").trim().to_string()
}
