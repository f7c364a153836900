//! SRT and WebVTT caption parsing.
//!
//! Parsing only normalizes the format: timing, numbering, headers and inline
//! markup go away and the cue text is flattened into one blob. Heuristic
//! noise removal is the job of [`crate::clean`].

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use crate::models::{CaptionFormat, CaptionTrack};

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));

/// Reads a caption file from disk and flattens it.
pub fn parse_file(path: &Path, format: CaptionFormat) -> std::io::Result<String> {
    Ok(parse(&CaptionTrack::load(path, format)?))
}

pub fn parse(track: &CaptionTrack) -> String {
    match track.format {
        CaptionFormat::Srt => parse_srt(&track.raw_lines),
        CaptionFormat::Vtt => parse_vtt(&track.raw_lines),
    }
}

/// Joins the text of each SRT entry with single spaces.
///
/// An entry is a run of non-blank lines: an optional index, the timing line,
/// then one or more text lines. Lines of a multi-line entry stay
/// newline-separated.
fn parse_srt(lines: &[String]) -> String {
    let mut entries: Vec<String> = Vec::new();
    let mut block: Vec<&str> = Vec::new();

    for line in lines.iter().map(|l| l.trim()) {
        if line.is_empty() {
            if let Some(text) = srt_entry_text(&block) {
                entries.push(text);
            }
            block.clear();
        } else {
            block.push(line);
        }
    }
    if let Some(text) = srt_entry_text(&block) {
        entries.push(text);
    }

    entries.join(" ")
}

fn srt_entry_text(block: &[&str]) -> Option<String> {
    let timing = block.iter().position(|l| l.contains("-->"))?;
    let text: Vec<String> = block[timing + 1..]
        .iter()
        .map(|l| strip_tags(l))
        .filter(|l| !l.is_empty())
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text.join("\n"))
    }
}

fn parse_vtt(lines: &[String]) -> String {
    let mut text_lines: Vec<String> = Vec::new();

    for line in lines.iter().map(|l| l.trim()) {
        if line.is_empty()
            || line.starts_with("WEBVTT")
            || line.starts_with("Kind:")
            || line.starts_with("Language:")
            || line.contains("-->")
            || line.starts_with("NOTE")
        {
            continue;
        }
        let cleaned = strip_tags(line);
        if !cleaned.is_empty() {
            text_lines.push(cleaned);
        }
    }

    text_lines.join(" ")
}

/// Removes `<c.colorE5E5E5>`, `<i>`, `<00:00:01.000>` style markup.
fn strip_tags(line: &str) -> String {
    TAG_RE.replace_all(line, "").trim().to_string()
}
