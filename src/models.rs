//! Request-scoped data types that flow through the digest pipeline.
//!
//! Nothing here is persisted: a [`SourceDocument`] is built per request and
//! handed back to the caller, and chat history arrives with every request.

use serde::{Deserialize, Serialize};

/// Which extractor produced a document. Serialized with the wire names the
/// front-end expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    File,
    Website,
    Youtube,
}

/// An input to summarize, resolved once at the entry point.
#[derive(Debug, Clone)]
pub enum SourceKind {
    /// An uploaded document. The extension of `name` selects the reader.
    File { name: String, bytes: Vec<u8> },
    Website { url: String },
    /// A video whose auto-generated captions are summarized.
    Video { url: String },
}

impl SourceKind {
    pub fn source_type(&self) -> SourceType {
        match self {
            SourceKind::File { .. } => SourceType::File,
            SourceKind::Website { .. } => SourceType::Website,
            SourceKind::Video { .. } => SourceType::Youtube,
        }
    }
}

/// Normalized text plus its summary, as returned by the summarize routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub name: String,
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub original_content: String,
    pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionFormat {
    Srt,
    Vtt,
}

impl CaptionFormat {
    /// Detects the format from a file name's extension.
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "srt" => Some(CaptionFormat::Srt),
            "vtt" => Some(CaptionFormat::Vtt),
            _ => None,
        }
    }
}

/// Raw caption file content, split into lines.
#[derive(Debug, Clone)]
pub struct CaptionTrack {
    pub format: CaptionFormat,
    pub raw_lines: Vec<String>,
}

impl CaptionTrack {
    pub fn new(format: CaptionFormat, content: &str) -> Self {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        Self {
            format,
            raw_lines: content.lines().map(|l| l.to_string()).collect(),
        }
    }

    /// Reads a caption file, replacing invalid UTF-8 sequences.
    pub fn load(path: &std::path::Path, format: CaptionFormat) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self::new(format, &String::from_utf8_lossy(&bytes)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Accepts the OpenAI role names and the front-end's `sender` values.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "system" => Some(Role::System),
            "user" => Some(Role::User),
            "assistant" | "ai" => Some(Role::Assistant),
            _ => None,
        }
    }
}

/// One message in a role-tagged conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A chat turn as sent by callers: either `{role, content}` or the
/// front-end's `{sender, text}` shape.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncomingTurn {
    #[serde(default, alias = "sender")]
    pub role: Option<String>,
    #[serde(default, alias = "text")]
    pub content: Option<String>,
}

impl IncomingTurn {
    /// Converts to a [`ChatTurn`], or `None` when the role is unknown or the
    /// content is empty.
    pub fn into_turn(self) -> Option<ChatTurn> {
        let role = Role::parse(self.role.as_deref()?.trim())?;
        let content = self.content?;
        if content.trim().is_empty() {
            return None;
        }
        Some(ChatTurn { role, content })
    }
}

/// One call to the completion endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatTurn>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}
