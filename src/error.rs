//! Error taxonomy for the digest pipeline.
//!
//! Every component returns [`DigestError`]. The HTTP layer maps each
//! variant to a status code with [`DigestError::status`] and, where useful,
//! attaches structured [`DigestError::details`] to the JSON error body.
//!
//! | Variant | Status |
//! |---------|--------|
//! | `InvalidRequest`, `UnsupportedFileType`, `EmptyDocument`, `InvalidEncoding`, `Fetch`, `Parse` | 400 |
//! | `NoSubtitles`, `EmptyContent` | 404 |
//! | `Configuration`, `Download`, `CompletionService`, `Validation` | 500 |

use axum::http::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;

/// Result alias used across the pipeline modules.
pub type Result<T> = std::result::Result<T, DigestError>;

#[derive(Debug, Error)]
pub enum DigestError {
    /// The request is missing a required field or is malformed.
    #[error("{0}")]
    InvalidRequest(String),

    /// Credentials or endpoint settings are missing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The subtitle downloader failed to run or exited non-zero.
    #[error("failed to download subtitles: {message}")]
    Download {
        message: String,
        stdout: String,
        stderr: String,
    },

    /// The downloader succeeded but left no caption file behind.
    #[error("no subtitles found for this video")]
    NoSubtitles { files: Vec<String> },

    /// Caption text was empty after cleaning.
    #[error("could not find meaningful subtitles after cleaning")]
    EmptyContent,

    #[error("unsupported file type '{0}', please upload a .txt, .md or .pdf file")]
    UnsupportedFileType(String),

    #[error("no text could be extracted from '{0}'")]
    EmptyDocument(String),

    #[error("'{0}' is not valid UTF-8 text")]
    InvalidEncoding(String),

    #[error("failed to fetch or read URL: {url}. Error: {reason}")]
    Fetch { url: String, reason: String },

    #[error("failed to parse content from URL: {url}. Error: {reason}")]
    Parse { url: String, reason: String },

    /// The completion endpoint rejected the call or could not be reached.
    #[error("completion service error: {0}")]
    CompletionService(String),

    /// The model's output did not meet the acceptance criteria.
    #[error("{0}")]
    Validation(String),
}

impl DigestError {
    pub fn status(&self) -> StatusCode {
        match self {
            DigestError::InvalidRequest(_)
            | DigestError::UnsupportedFileType(_)
            | DigestError::EmptyDocument(_)
            | DigestError::InvalidEncoding(_)
            | DigestError::Fetch { .. }
            | DigestError::Parse { .. } => StatusCode::BAD_REQUEST,
            DigestError::NoSubtitles { .. } | DigestError::EmptyContent => StatusCode::NOT_FOUND,
            DigestError::Configuration(_)
            | DigestError::Download { .. }
            | DigestError::CompletionService(_)
            | DigestError::Validation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Extra diagnostic payload surfaced next to the error message.
    pub fn details(&self) -> Option<Value> {
        match self {
            DigestError::Download { stdout, stderr, .. } => {
                Some(json!({ "stdout": stdout, "stderr": stderr }))
            }
            DigestError::NoSubtitles { files } => Some(json!({ "files": files })),
            _ => None,
        }
    }
}
