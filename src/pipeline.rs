//! Request orchestration.
//!
//! A [`Digester`] owns one instance of every pipeline component and runs
//! them in order for a request:
//!
//! ```text
//! SourceKind ─► extractor ─► prompts ─► ChatClient ─► validate ─► SourceDocument
//! ```
//!
//! Chat and report requests skip extraction. The digester holds no per-request
//! state, so one instance serves every request concurrently.

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{DigestError, Result};
use crate::extract;
use crate::llm::ChatClient;
use crate::models::{ChatTurn, SourceDocument, SourceKind, SourceType};
use crate::prompts;
use crate::subtitles::SubtitleAcquirer;
use crate::validate;
use crate::web::WebExtractor;

/// Normalized text of a source, before any completion call.
#[derive(Debug, Clone)]
pub struct ExtractedSource {
    pub name: String,
    pub source_type: SourceType,
    pub text: String,
    /// The text is a fixed notice for a video link; it must not be summarized.
    pub video_redirect: bool,
}

pub struct Digester {
    config: Arc<Config>,
    llm: ChatClient,
    web: WebExtractor,
    subtitles: SubtitleAcquirer,
}

impl Digester {
    pub fn new(config: Arc<Config>) -> Result<Self> {
        Ok(Self {
            llm: ChatClient::new(&config.llm)?,
            web: WebExtractor::new(&config.web)?,
            subtitles: SubtitleAcquirer::new(config.subtitles.clone()),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the extractor matching `source`.
    pub async fn extract(&self, source: SourceKind) -> Result<ExtractedSource> {
        let source_type = source.source_type();
        match source {
            SourceKind::File { name, bytes } => {
                let file_name = name.clone();
                let text = tokio::task::spawn_blocking(move || extract::extract_document(&file_name, &bytes))
                    .await
                    .map_err(|e| {
                        warn!(document = %name, error = %e, "document extraction aborted");
                        DigestError::EmptyDocument(name.clone())
                    })??;
                Ok(ExtractedSource {
                    name,
                    source_type,
                    text,
                    video_redirect: false,
                })
            }
            SourceKind::Website { url } => {
                let page = self.web.extract(&url).await?;
                if page.text.trim().is_empty() {
                    return Err(DigestError::EmptyDocument(url));
                }
                Ok(ExtractedSource {
                    name: page.title,
                    source_type,
                    text: page.text,
                    video_redirect: page.video_redirect,
                })
            }
            SourceKind::Video { url } => {
                let text = self.subtitles.transcript(&url).await?;
                Ok(ExtractedSource {
                    name: url,
                    source_type,
                    text,
                    video_redirect: false,
                })
            }
        }
    }

    /// Extracts and summarizes one source.
    ///
    /// Video links submitted as websites are answered with the redirect
    /// notice as both content and summary, without a completion call.
    pub async fn summarize(&self, source: SourceKind) -> Result<SourceDocument> {
        let extracted = self.extract(source).await?;

        if extracted.video_redirect {
            info!(name = %extracted.name, "video link answered with redirect notice");
            return Ok(SourceDocument {
                name: extracted.name,
                source_type: extracted.source_type,
                summary: extracted.text.clone(),
                original_content: extracted.text,
            });
        }

        let messages = prompts::summary_messages(&extracted.text, &extracted.name, &self.config.summary);
        let request = self.llm.request(
            messages,
            self.config.llm.summary_temperature,
            Some(self.config.llm.summary_max_tokens),
        );
        let raw = self.llm.complete(&request).await?;
        let summary = validate::accept_summary(&raw, &extracted.name, self.config.summary.min_summary_chars);

        info!(
            name = %extracted.name,
            source = ?extracted.source_type,
            content_chars = extracted.text.len(),
            summary_chars = summary.len(),
            "source summarized"
        );

        Ok(SourceDocument {
            name: extracted.name,
            source_type: extracted.source_type,
            original_content: extracted.text,
            summary,
        })
    }

    /// Answers `message` given prior turns and the summaries of the selected sources.
    pub async fn chat(&self, message: &str, summaries: &[String], history: Vec<ChatTurn>) -> Result<String> {
        if message.trim().is_empty() {
            return Err(DigestError::InvalidRequest("Message is required".to_string()));
        }
        let messages = prompts::chat_messages(history, message, summaries);
        let request = self.llm.request(messages, self.config.llm.chat_temperature, None);
        let reply = self.llm.complete(&request).await?;
        info!(summaries = summaries.len(), reply_chars = reply.len(), "chat answered");
        Ok(reply)
    }

    /// Renders a summary as a standalone HTML page.
    pub async fn report(&self, title: &str, summary: &str) -> Result<String> {
        if title.trim().is_empty() || summary.trim().is_empty() {
            return Err(DigestError::InvalidRequest(
                "summary_text and title are required".to_string(),
            ));
        }
        let messages = prompts::report_messages(title, summary);
        let request = self.llm.request(messages, self.config.llm.report_temperature, None);
        let html = validate::validate_html(&self.llm.complete(&request).await?)?;
        info!(title, html_chars = html.len(), "HTML report generated");
        Ok(html)
    }
}
