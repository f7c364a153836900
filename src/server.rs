//! HTTP API for the digest pipeline.
//!
//! # Endpoints
//!
//! | Method | Path | Body | Response |
//! |--------|------|------|----------|
//! | `POST` | `/summarize-text-file` | multipart field `file` | [`SourceDocument`] |
//! | `POST` | `/summarize-youtube` | `{"youtube_url"}` | [`SourceDocument`] |
//! | `POST` | `/summarize-website` | `{"url"}` | [`SourceDocument`] |
//! | `POST` | `/chat` | `{"message", "summaries", "chat_history"}` | `{"reply"}` |
//! | `POST` | `/generate-html-report` | `{"summary_text", "title"}` | `{"html_content"}` |
//! | `GET`  | `/health` | | `{"status", "version"}` |
//!
//! # Error Contract
//!
//! Every failure is a JSON object with a human-readable `error` and, for
//! subtitle download problems, a `details` object:
//!
//! ```json
//! { "error": "failed to download subtitles: exit status: 1",
//!   "details": { "stdout": "", "stderr": "ERROR: Video unavailable" } }
//! ```
//!
//! Status codes follow [`DigestError::status`].
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so a browser front-end
//! served from another origin can call the API.

use axum::{
    extract::{multipart::Multipart, rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::DigestError;
use crate::extract::DocumentFormat;
use crate::models::{IncomingTurn, SourceDocument, SourceKind};
use crate::pipeline::Digester;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    digester: Arc<Digester>,
}

/// Starts the HTTP server on `[server].bind` and serves until the process exits.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let digester = Arc::new(Digester::new(Arc::new(config.clone()))?);
    let app = router(digester);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "digest server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the router with CORS and the upload size limit applied.
pub fn router(digester: Arc<Digester>) -> Router {
    let max_upload = digester.config().server.max_upload_bytes;
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/summarize-text-file", post(handle_summarize_file))
        .route("/summarize-youtube", post(handle_summarize_youtube))
        .route("/summarize-website", post(handle_summarize_website))
        .route("/chat", post(handle_chat))
        .route("/generate-html-report", post(handle_report))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(cors)
        .with_state(AppState { digester })
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    message: String,
    details: Option<Value>,
}

impl From<DigestError> for AppError {
    fn from(err: DigestError) -> Self {
        AppError {
            status: err.status(),
            message: err.to_string(),
            details: err.details(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        bad_request(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, error = %self.message, "request failed");
        } else {
            warn!(status = %self.status, error = %self.message, "request rejected");
        }
        let body = ErrorBody {
            error: self.message,
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError::from(DigestError::InvalidRequest(message.into()))
}

/// Returns the trimmed value, or a 400 naming the missing field.
fn required(value: Option<String>, message: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| bad_request(message))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /summarize-text-file ============

/// Reads the `file` field, checking the extension before the body is read.
async fn handle_summarize_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SourceDocument>, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let name = field.file_name().unwrap_or_default().trim().to_string();
        if name.is_empty() {
            return Err(bad_request("No selected file"));
        }
        DocumentFormat::from_file_name(&name)?;

        let bytes = field.bytes().await.map_err(multipart_error)?;
        let document = state
            .digester
            .summarize(SourceKind::File {
                name,
                bytes: bytes.to_vec(),
            })
            .await?;
        return Ok(Json(document));
    }

    Err(bad_request("No file part in the request"))
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError {
        status: err.status(),
        message: err.body_text(),
        details: None,
    }
}

// ============ POST /summarize-youtube ============

#[derive(Deserialize)]
struct YoutubeRequest {
    youtube_url: Option<String>,
}

async fn handle_summarize_youtube(
    State(state): State<AppState>,
    payload: Result<Json<YoutubeRequest>, JsonRejection>,
) -> Result<Json<SourceDocument>, AppError> {
    let Json(request) = payload?;
    let url = required(request.youtube_url, "youtube_url is required")?;
    let document = state.digester.summarize(SourceKind::Video { url }).await?;
    Ok(Json(document))
}

// ============ POST /summarize-website ============

#[derive(Deserialize)]
struct WebsiteRequest {
    url: Option<String>,
}

async fn handle_summarize_website(
    State(state): State<AppState>,
    payload: Result<Json<WebsiteRequest>, JsonRejection>,
) -> Result<Json<SourceDocument>, AppError> {
    let Json(request) = payload?;
    let url = required(request.url, "URL is required")?;
    let document = state.digester.summarize(SourceKind::Website { url }).await?;
    Ok(Json(document))
}

// ============ POST /chat ============

#[derive(Deserialize)]
struct ChatRequest {
    message: Option<String>,
    #[serde(default)]
    summaries: Vec<String>,
    #[serde(default)]
    chat_history: Vec<IncomingTurn>,
}

#[derive(Serialize)]
struct ChatResponse {
    reply: String,
}

async fn handle_chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(request) = payload?;
    let message = required(request.message, "Message is required")?;
    let history = request
        .chat_history
        .into_iter()
        .filter_map(IncomingTurn::into_turn)
        .collect();

    let reply = state
        .digester
        .chat(&message, &request.summaries, history)
        .await?;
    Ok(Json(ChatResponse { reply }))
}

// ============ POST /generate-html-report ============

#[derive(Deserialize)]
struct ReportRequest {
    summary_text: Option<String>,
    title: Option<String>,
}

#[derive(Serialize)]
struct ReportResponse {
    html_content: String,
}

async fn handle_report(
    State(state): State<AppState>,
    payload: Result<Json<ReportRequest>, JsonRejection>,
) -> Result<Json<ReportResponse>, AppError> {
    let Json(request) = payload?;
    let missing = "summary_text and title are required";
    let summary = required(request.summary_text, missing)?;
    let title = required(request.title, missing)?;

    let html_content = state.digester.report(&title, &summary).await?;
    Ok(Json(ReportResponse { html_content }))
}
