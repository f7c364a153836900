//! # Source Digest CLI (`digest`)
//!
//! Runs the HTTP API or a single pipeline step from the command line.
//!
//! ## Usage
//!
//! ```bash
//! digest --config ./config/digest.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `digest serve` | Start the HTTP API |
//! | `digest extract file\|website\|video <target>` | Print normalized text, no model call |
//! | `digest summarize file\|website\|video <target>` | Print the summarized document as JSON |
//! | `digest captions <path>` | Parse and clean a local `.srt`/`.vtt` file |
//! | `digest report --title <t> <summary-file>` | Print an HTML report for a summary |
//!
//! When the config file does not exist, built-in defaults plus environment
//! variables (and a `.env` file) are used.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use source_digest::captions;
use source_digest::clean;
use source_digest::config::{self, Config};
use source_digest::extract::DocumentFormat;
use source_digest::models::{CaptionFormat, SourceKind};
use source_digest::pipeline::Digester;
use source_digest::server;

/// Source Digest: summaries, chat and reports over documents, web pages
/// and video transcripts.
#[derive(Parser)]
#[command(
    name = "digest",
    about = "Summarize documents, web pages and video transcripts with an OpenAI-compatible model",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/digest.toml`. A missing file means defaults
    /// plus environment overrides.
    #[arg(long, global = true, default_value = "./config/digest.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API on `[server].bind`.
    Serve,

    /// Print the normalized text of a source without calling the model.
    Extract {
        #[command(subcommand)]
        source: SourceArg,
    },

    /// Summarize a source and print the document as JSON.
    Summarize {
        #[command(subcommand)]
        source: SourceArg,
    },

    /// Parse and clean a local caption file.
    Captions {
        /// `.srt` or `.vtt` file.
        path: PathBuf,
    },

    /// Render a summary file as a standalone HTML report.
    Report {
        /// Report title, used for `<title>` and the main heading.
        #[arg(long)]
        title: String,
        /// File containing the summary text.
        summary: PathBuf,
    },
}

#[derive(Subcommand)]
enum SourceArg {
    /// A local `.txt`, `.md` or `.pdf` file.
    File { path: PathBuf },
    /// A web page URL.
    Website { url: String },
    /// A video URL; its auto-generated captions are used.
    Video { url: String },
}

impl SourceArg {
    fn into_source(self) -> Result<SourceKind> {
        Ok(match self {
            SourceArg::File { path } => {
                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or_default()
                    .to_string();
                DocumentFormat::from_file_name(&name)?;
                let bytes = std::fs::read(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                SourceKind::File { name, bytes }
            }
            SourceArg::Website { url } => SourceKind::Website { url },
            SourceArg::Video { url } => SourceKind::Video { url },
        })
    }
}

fn load(path: &Path) -> Result<Config> {
    if path.exists() {
        config::load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Config::from_env()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Captions { path } = &cli.command {
        let format = CaptionFormat::from_path(path)
            .with_context(|| format!("{} is not a .srt or .vtt file", path.display()))?;
        let raw = captions::parse_file(path, format)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        println!("{}", clean::clean_transcript(&raw)?);
        return Ok(());
    }

    let cfg = load(&cli.config)?;

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Extract { source } => {
            let digester = Digester::new(Arc::new(cfg))?;
            let extracted = digester.extract(source.into_source()?).await?;
            println!("{}", extracted.text);
        }
        Commands::Summarize { source } => {
            let digester = Digester::new(Arc::new(cfg))?;
            let document = digester.summarize(source.into_source()?).await?;
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
        Commands::Report { title, summary } => {
            let summary = std::fs::read_to_string(&summary)
                .with_context(|| format!("Failed to read {}", summary.display()))?;
            let digester = Digester::new(Arc::new(cfg))?;
            println!("{}", digester.report(&title, &summary).await?);
        }
        Commands::Captions { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
