//! # Source Digest
//!
//! Turns uploaded documents, web pages and video transcripts into clean plain
//! text, summarizes them with an OpenAI-compatible chat model, answers
//! follow-up questions grounded in those summaries, and renders a summary as
//! a standalone HTML report.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌──────────┐   ┌──────────┐
//! │  Extractors  │──▶│   Prompts   │──▶│  ChatAPI │──▶│ Validate │
//! │ file/web/vid │   │  templates  │   │  (llm)   │   │          │
//! └──────────────┘   └─────────────┘   └──────────┘   └────┬─────┘
//!                                                          │
//!                                  ┌───────────────────────┤
//!                                  ▼                       ▼
//!                             ┌──────────┐           ┌──────────┐
//!                             │   CLI    │           │   HTTP   │
//!                             │ (digest) │           │  (axum)  │
//!                             └──────────┘           └──────────┘
//! ```
//!
//! Video transcripts take a longer road: [`subtitles`] downloads the caption
//! file, [`captions`] flattens it and [`clean`] strips caption noise.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment overrides |
//! | [`error`] | Error taxonomy and HTTP status mapping |
//! | [`models`] | Request-scoped data types |
//! | [`subtitles`] | Caption download through `yt-dlp` |
//! | [`captions`] | SRT / WebVTT parsing |
//! | [`clean`] | Caption noise removal |
//! | [`extract`] | PDF / text / Markdown extraction |
//! | [`web`] | Web page text extraction |
//! | [`prompts`] | Message templates |
//! | [`llm`] | Chat completion client |
//! | [`validate`] | Output acceptance checks |
//! | [`pipeline`] | Request orchestration |
//! | [`server`] | HTTP API |

pub mod captions;
pub mod clean;
pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod server;
pub mod subtitles;
pub mod validate;
pub mod web;
