//! Web page text extraction.
//!
//! Links to video sites are never scraped: the extractor looks up the page
//! title on a best-effort basis and returns [`VIDEO_REDIRECT_MESSAGE`] so the
//! caller can use the caption pipeline instead. Every other page is fetched
//! with a browser-like User-Agent and reduced to readable text by
//! [`extract_from_html`].
//!
//! Content selection, first match wins:
//!
//! 1. every `<article>` / `<main>` element
//! 2. `<div>`s with a class in [`CONTENT_CLASSES`]
//! 3. `<body>`
//!
//! Inside each container, paragraph, heading and list-item text is preferred.
//! A result shorter than [`MIN_ARTICLE_CHARS`] is replaced by the full body
//! text when that is meaningfully longer.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::config::WebConfig;
use crate::error::{DigestError, Result};

/// Body returned for links to video sites.
pub const VIDEO_REDIRECT_MESSAGE: &str = "This link points to a video hosting site. \
Video pages are not scraped for content; submit the link to the video summarizer \
to summarize its transcript instead.";

pub const CONTENT_CLASSES: [&str; 4] = ["content", "post-content", "entry-content", "article-body"];

/// Extracted text shorter than this triggers the body-text fallback.
pub const MIN_ARTICLE_CHARS: usize = 200;
/// How much longer the body text must be to replace a short extraction.
const BODY_FALLBACK_MARGIN: usize = 100;

static TITLE_SEL: Lazy<Selector> = Lazy::new(|| selector("title"));
static H1_SEL: Lazy<Selector> = Lazy::new(|| selector("h1"));
static BODY_SEL: Lazy<Selector> = Lazy::new(|| selector("body"));
static MAIN_SEL: Lazy<Selector> = Lazy::new(|| selector("article, main"));
static CLASS_SEL: Lazy<Selector> = Lazy::new(|| {
    let list = CONTENT_CLASSES
        .iter()
        .map(|c| format!("div.{}", c))
        .collect::<Vec<_>>()
        .join(", ");
    selector(&list)
});
static BLOCK_SEL: Lazy<Selector> = Lazy::new(|| selector("p, h1, h2, h3, h4, h5, h6, li"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

/// Title and text of a page.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPage {
    pub title: String,
    pub text: String,
    /// `true` when the URL belonged to a video site and was not scraped.
    pub video_redirect: bool,
}

pub struct WebExtractor {
    client: reqwest::Client,
    title_client: reqwest::Client,
    video_hosts: Vec<String>,
}

impl WebExtractor {
    pub fn new(config: &WebConfig) -> Result<Self> {
        let build = |timeout: u64| {
            reqwest::Client::builder()
                .user_agent(config.user_agent.clone())
                .timeout(Duration::from_secs(timeout))
                .build()
                .map_err(|e| DigestError::Configuration(format!("HTTP client: {}", e)))
        };

        Ok(Self {
            client: build(config.timeout_secs)?,
            title_client: build(config.title_timeout_secs)?,
            video_hosts: config
                .video_hosts
                .iter()
                .map(|h| h.trim().to_ascii_lowercase())
                .collect(),
        })
    }

    pub fn is_video_url(&self, url: &str) -> bool {
        is_video_url(url, &self.video_hosts)
    }

    pub async fn extract(&self, url: &str) -> Result<ExtractedPage> {
        let parsed = Url::parse(url).map_err(|e| DigestError::Parse {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DigestError::Parse {
                url: url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        if self.is_video_url(url) {
            info!(url, "video link detected, skipping page scrape");
            let title = self.video_title(url).await;
            return Ok(ExtractedPage {
                title,
                text: VIDEO_REDIRECT_MESSAGE.to_string(),
                video_redirect: true,
            });
        }

        let html = fetch_html(&self.client, url).await?;
        let page = extract_from_html(&html, url);
        info!(url, title = %page.title, chars = page.text.len(), "web page extracted");
        Ok(page)
    }

    /// `<title>` of a video page, or the URL when it can't be fetched quickly.
    async fn video_title(&self, url: &str) -> String {
        match fetch_html(&self.title_client, url).await {
            Ok(html) => extract_title(&Html::parse_document(&html)).unwrap_or_else(|| url.to_string()),
            Err(e) => {
                debug!(url, error = %e, "video title lookup failed");
                url.to_string()
            }
        }
    }
}

async fn fetch_html(client: &reqwest::Client, url: &str) -> Result<String> {
    let response = client.get(url).send().await.map_err(|e| DigestError::Fetch {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(DigestError::Fetch {
            url: url.to_string(),
            reason: format!("HTTP {}", status),
        });
    }

    response.text().await.map_err(|e| DigestError::Parse {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// `true` when the URL's host is one of `hosts` or a subdomain of one.
pub fn is_video_url(url: &str, hosts: &[String]) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    hosts.iter().any(|h| {
        let h = h.as_str();
        host == h || host.ends_with(&format!(".{}", h))
    })
}

/// Reduces an HTML document to a title and readable text.
pub fn extract_from_html(html: &str, url: &str) -> ExtractedPage {
    let document = Html::parse_document(html);
    let body = document.select(&BODY_SEL).next();

    let mut title = extract_title(&document).unwrap_or_else(|| url.to_string());

    let mut containers: Vec<ElementRef> = document.select(&MAIN_SEL).collect();
    if containers.is_empty() {
        containers = document.select(&CLASS_SEL).collect();
    }
    if containers.is_empty() {
        containers.extend(body);
    }

    let mut parts: Vec<String> = Vec::new();
    for container in &containers {
        let blocks: Vec<ElementRef> = container.select(&BLOCK_SEL).collect();
        if blocks.is_empty() {
            parts.push(element_text(*container, " "));
        } else {
            parts.extend(blocks.into_iter().map(|b| element_text(b, " ")));
        }
    }
    let mut text = parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    if let Some(body) = body {
        let text_len = text.chars().count();
        if text_len < MIN_ARTICLE_CHARS {
            let body_text = element_text(body, "\n");
            let body_len = body_text.chars().count();
            if body_len > text_len + BODY_FALLBACK_MARGIN || (text.is_empty() && !body_text.is_empty()) {
                debug!(url, text_len, body_len, "short extraction, using body text");
                text = body_text;
            }
        }
    }

    if title == url && !text.is_empty() {
        if let Some(heading) = document
            .select(&H1_SEL)
            .map(|h| element_text(h, " "))
            .find(|h| !h.is_empty())
        {
            title = heading;
        }
    }

    ExtractedPage {
        title,
        text,
        video_redirect: false,
    }
}

fn extract_title(document: &Html) -> Option<String> {
    document
        .select(&TITLE_SEL)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Trimmed text nodes under `element` joined by `separator`, skipping
/// anything inside `<script>` or `<style>`.
fn element_text(element: ElementRef, separator: &str) -> String {
    element
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .map(|e| matches!(e.name(), "script" | "style"))
                    .unwrap_or(false)
            });
            let trimmed = text.trim();
            if hidden || trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect::<Vec<_>>()
        .join(separator)
}
