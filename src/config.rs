//! TOML configuration with environment overrides.
//!
//! Every section has defaults, so an empty file is a valid configuration.
//! Credentials are usually supplied through the environment (or a `.env`
//! file loaded by the binary); see [`Config::apply_env`].

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub subtitles: SubtitleConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}
fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Inline key. Prefer `api_key_env` outside of tests.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_summary_temperature")]
    pub summary_temperature: f32,
    #[serde(default = "default_chat_temperature")]
    pub chat_temperature: f32,
    #[serde(default = "default_report_temperature")]
    pub report_temperature: f32,
    #[serde(default = "default_summary_max_tokens")]
    pub summary_max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            api_key_env: default_api_key_env(),
            summary_temperature: default_summary_temperature(),
            chat_temperature: default_chat_temperature(),
            report_temperature: default_report_temperature(),
            summary_max_tokens: default_summary_max_tokens(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_summary_temperature() -> f32 {
    0.5
}
fn default_chat_temperature() -> f32 {
    0.7
}
fn default_report_temperature() -> f32 {
    0.3
}
fn default_summary_max_tokens() -> u32 {
    800
}

#[derive(Debug, Deserialize, Clone)]
pub struct SummaryConfig {
    /// Approximate token budget for the source text in a summary prompt.
    #[serde(default = "default_max_input_tokens")]
    pub max_input_tokens: usize,
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: usize,
    /// Summaries shorter than this are replaced by an explanatory placeholder.
    #[serde(default = "default_min_summary_chars")]
    pub min_summary_chars: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            max_input_tokens: default_max_input_tokens(),
            chars_per_token: default_chars_per_token(),
            min_summary_chars: default_min_summary_chars(),
        }
    }
}

impl SummaryConfig {
    pub fn max_input_chars(&self) -> usize {
        self.max_input_tokens.saturating_mul(self.chars_per_token)
    }
}

fn default_max_input_tokens() -> usize {
    3000
}
fn default_chars_per_token() -> usize {
    4
}
fn default_min_summary_chars() -> usize {
    20
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_web_timeout_secs")]
    pub timeout_secs: u64,
    /// Timeout for the best-effort title lookup on video links.
    #[serde(default = "default_title_timeout_secs")]
    pub title_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Hosts (and their subdomains) treated as video sites.
    #[serde(default = "default_video_hosts")]
    pub video_hosts: Vec<String>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_web_timeout_secs(),
            title_timeout_secs: default_title_timeout_secs(),
            user_agent: default_user_agent(),
            video_hosts: default_video_hosts(),
        }
    }
}

fn default_web_timeout_secs() -> u64 {
    10
}
fn default_title_timeout_secs() -> u64 {
    5
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36".to_string()
}
fn default_video_hosts() -> Vec<String> {
    [
        "youtube.com",
        "youtu.be",
        "youtube-nocookie.com",
        "vimeo.com",
        "dailymotion.com",
        "bilibili.com",
        "twitch.tv",
        "tiktok.com",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SubtitleConfig {
    /// Downloader executable, resolved through `PATH` when not absolute.
    #[serde(default = "default_program")]
    pub program: PathBuf,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub cookies_file: Option<PathBuf>,
    #[serde(default)]
    pub cookies_from_browser: Option<String>,
    #[serde(default = "default_subtitle_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SubtitleConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            language: default_language(),
            cookies_file: None,
            cookies_from_browser: None,
            timeout_secs: default_subtitle_timeout_secs(),
        }
    }
}

fn default_program() -> PathBuf {
    PathBuf::from("yt-dlp")
}
fn default_language() -> String {
    "en".to_string()
}
fn default_subtitle_timeout_secs() -> u64 {
    300
}

impl Config {
    /// Built-in defaults with environment overrides applied.
    ///
    /// Used when no configuration file exists.
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env();
        validate(&config)?;
        Ok(config)
    }

    /// Resolves credentials and endpoint overrides from the environment.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `$api_key_env` (default `OPENAI_API_KEY`) | `llm.api_key` when not set inline |
    /// | `OPENAI_BASE_URL` | `llm.base_url` |
    /// | `OPENAI_MODEL` | `llm.model` |
    /// | `YOUTUBE_COOKIES_FILE` | `subtitles.cookies_file` |
    /// | `YOUTUBE_BROWSER_FOR_COOKIES` | `subtitles.cookies_from_browser` |
    pub fn apply_env(&mut self) {
        if self.llm.api_key.is_none() {
            self.llm.api_key = non_empty_env(&self.llm.api_key_env);
        }
        if let Some(url) = non_empty_env("OPENAI_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(model) = non_empty_env("OPENAI_MODEL") {
            self.llm.model = model;
        }
        if let Some(path) = non_empty_env("YOUTUBE_COOKIES_FILE") {
            self.subtitles.cookies_file = Some(PathBuf::from(path));
        }
        if let Some(browser) = non_empty_env("YOUTUBE_BROWSER_FOR_COOKIES") {
            self.subtitles.cookies_from_browser = Some(browser);
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.apply_env();
    validate(&config)?;

    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.llm.model.trim().is_empty() {
        anyhow::bail!("llm.model must not be empty");
    }

    for (name, value) in [
        ("llm.summary_temperature", config.llm.summary_temperature),
        ("llm.chat_temperature", config.llm.chat_temperature),
        ("llm.report_temperature", config.llm.report_temperature),
    ] {
        if !(0.0..=2.0).contains(&value) {
            anyhow::bail!("{} must be in [0.0, 2.0]", name);
        }
    }

    if config.summary.chars_per_token == 0 {
        anyhow::bail!("summary.chars_per_token must be > 0");
    }
    if config.summary.max_input_tokens == 0 {
        anyhow::bail!("summary.max_input_tokens must be > 0");
    }

    if config.web.timeout_secs == 0 || config.web.title_timeout_secs == 0 {
        anyhow::bail!("web timeouts must be > 0");
    }
    if config.subtitles.timeout_secs == 0 {
        anyhow::bail!("subtitles.timeout_secs must be > 0");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:5000");
        assert_eq!(config.llm.model, "gpt-3.5-turbo");
        assert_eq!(config.summary.max_input_chars(), 12_000);
        assert!(config.web.video_hosts.iter().any(|h| h == "youtu.be"));
        assert_eq!(config.subtitles.program, PathBuf::from("yt-dlp"));
        validate(&config).unwrap();
    }

    #[test]
    fn sections_override_defaults() {
        let config: Config = toml::from_str(
            r#"
[llm]
model = "gpt-4o-mini"
api_key = "sk-test"

[summary]
max_input_tokens = 10
chars_per_token = 3

[web]
video_hosts = ["example.com"]
"#,
        )
        .unwrap();
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.summary.max_input_chars(), 30);
        assert_eq!(config.web.video_hosts, vec!["example.com".to_string()]);
    }

    #[test]
    fn rejects_out_of_range_temperature() {
        let config: Config = toml::from_str("[llm]\nchat_temperature = 3.5\n").unwrap();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("llm.chat_temperature"));
    }

    #[test]
    fn rejects_zero_chars_per_token() {
        let config: Config = toml::from_str("[summary]\nchars_per_token = 0\n").unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn example_config_is_valid() {
        let config: Config =
            toml::from_str(include_str!("../config/digest.example.toml")).unwrap();
        validate(&config).unwrap();
        assert_eq!(config.subtitles.language, "en");
        assert_eq!(config.server.max_upload_bytes, 20 * 1024 * 1024);
    }

    #[test]
    fn load_config_reports_missing_file() {
        let err = load_config(Path::new("/nonexistent/digest.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
