//! Plain-text extraction for uploaded documents.
//!
//! The file extension picks the reader ([`DocumentFormat`]) before any byte
//! is read. PDFs are read page by page so that one broken page costs only its
//! own text; `.txt` and `.md` must be valid UTF-8.

use tracing::{debug, warn};

use crate::error::{DigestError, Result};

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Text,
    Markdown,
}

impl DocumentFormat {
    /// Resolves the format from a file name (case-insensitive extension).
    pub fn from_file_name(name: &str) -> Result<Self> {
        let ext = std::path::Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Ok(DocumentFormat::Pdf),
            "txt" => Ok(DocumentFormat::Text),
            "md" => Ok(DocumentFormat::Markdown),
            "" => Err(DigestError::UnsupportedFileType(name.to_string())),
            other => Err(DigestError::UnsupportedFileType(format!(".{}", other))),
        }
    }
}

/// Extracts text from an in-memory upload.
pub fn extract_document(name: &str, bytes: &[u8]) -> Result<String> {
    let format = DocumentFormat::from_file_name(name)?;
    extract_with_format(name, format, bytes)
}

fn extract_with_format(name: &str, format: DocumentFormat, bytes: &[u8]) -> Result<String> {
    let text = match format {
        DocumentFormat::Pdf => extract_pdf(name, bytes),
        DocumentFormat::Text | DocumentFormat::Markdown => decode_text(name, bytes)?,
    };

    if text.trim().is_empty() {
        return Err(DigestError::EmptyDocument(name.to_string()));
    }
    debug!(document = name, chars = text.len(), ?format, "document text extracted");
    Ok(text)
}

fn decode_text(name: &str, bytes: &[u8]) -> Result<String> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| DigestError::InvalidEncoding(name.to_string()))?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_string())
}

/// Page-by-page PDF text. Unreadable pages (or an unreadable document)
/// contribute nothing; the caller decides whether the result is empty.
fn extract_pdf(name: &str, bytes: &[u8]) -> String {
    let pages = pdf_page_texts(name, bytes);
    let text = pages
        .iter()
        .map(|p| p.trim_end())
        .filter(|p| !p.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    if !text.trim().is_empty() {
        return text;
    }

    // Some PDFs only yield text through pdf-extract's font handling.
    match pdf_extract::extract_text_from_mem(bytes) {
        Ok(text) => text,
        Err(e) => {
            warn!(document = name, error = %e, "PDF extraction failed");
            String::new()
        }
    }
}

/// Text of every page in order; a page that fails to decode yields `""`.
pub fn pdf_page_texts(name: &str, bytes: &[u8]) -> Vec<String> {
    let doc = match lopdf::Document::load_mem(bytes) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(document = name, error = %e, "could not open PDF");
            return Vec::new();
        }
    };

    doc.get_pages()
        .keys()
        .map(|&number| match doc.extract_text(&[number]) {
            Ok(text) => text,
            Err(e) => {
                warn!(document = name, page = number, error = %e, "skipping unreadable PDF page");
                String::new()
            }
        })
        .collect()
}
