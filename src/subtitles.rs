//! Auto-generated caption download via an external `yt-dlp`-compatible tool.
//!
//! Each call gets its own temporary directory, removed when the call
//! returns whether or not it succeeded. The downloader is asked for
//! subtitles only (`--skip-download`); whatever `.srt`/`.vtt` file it leaves
//! behind is loaded as a [`CaptionTrack`].

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::captions;
use crate::clean;
use crate::config::SubtitleConfig;
use crate::error::{DigestError, Result};
use crate::models::{CaptionFormat, CaptionTrack};

pub struct SubtitleAcquirer {
    config: SubtitleConfig,
}

impl SubtitleAcquirer {
    pub fn new(config: SubtitleConfig) -> Self {
        Self { config }
    }

    /// Arguments passed to the downloader for `url`, writing into `output_dir`.
    pub fn command_args(&self, url: &str, output_dir: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--write-auto-sub".into(),
            "--sub-lang".into(),
            self.config.language.clone().into(),
            "--skip-download".into(),
            "-o".into(),
            output_dir.join("%(id)s.%(ext)s").into_os_string(),
        ];
        if let Some(browser) = &self.config.cookies_from_browser {
            args.push("--cookies-from-browser".into());
            args.push(browser.into());
        }
        if let Some(file) = &self.config.cookies_file {
            args.push("--cookies".into());
            args.push(file.clone().into_os_string());
        }
        args.push(url.into());
        args
    }

    /// Downloads the caption track for a video URL.
    pub async fn acquire(&self, url: &str) -> Result<CaptionTrack> {
        let workdir = tempfile::Builder::new()
            .prefix("digest-subs-")
            .tempdir()
            .map_err(|e| download_error(format!("failed to create temp dir: {}", e)))?;

        let mut command = Command::new(&self.config.program);
        command
            .args(self.command_args(url, workdir.path()))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        debug!(program = %self.config.program.display(), url, "running subtitle downloader");
        let limit = Duration::from_secs(self.config.timeout_secs);
        let output = match tokio::time::timeout(limit, command.output()).await {
            Err(_) => {
                return Err(download_error(format!(
                    "downloader timed out after {}s",
                    self.config.timeout_secs
                )))
            }
            Ok(Err(e)) => {
                return Err(download_error(format!(
                    "failed to run '{}': {}",
                    self.config.program.display(),
                    e
                )))
            }
            Ok(Ok(output)) => output,
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            warn!(url, status = %output.status, "subtitle downloader failed");
            return Err(DigestError::Download {
                message: output.status.to_string(),
                stdout,
                stderr,
            });
        }

        let mut files: Vec<String> = std::fs::read_dir(workdir.path())
            .map_err(|e| download_error(format!("failed to list downloads: {}", e)))?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        files.sort();

        let found = files
            .iter()
            .find_map(|f| CaptionFormat::from_path(Path::new(f)).map(|format| (f.clone(), format)));
        let Some((file, format)) = found else {
            return Err(DigestError::NoSubtitles { files });
        };

        let track = CaptionTrack::load(&workdir.path().join(&file), format)
            .map_err(|e| download_error(format!("failed to read '{}': {}", file, e)))?;
        info!(url, file = %file, lines = track.raw_lines.len(), "captions downloaded");
        Ok(track)
    }

    /// Downloads, flattens and cleans the captions of a video.
    pub async fn transcript(&self, url: &str) -> Result<String> {
        let track = self.acquire(url).await?;
        clean::clean_transcript(&captions::parse(&track))
    }
}

fn download_error(message: String) -> DigestError {
    DigestError::Download {
        message,
        stdout: String::new(),
        stderr: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config(program: PathBuf) -> SubtitleConfig {
        SubtitleConfig {
            program,
            timeout_secs: 10,
            ..SubtitleConfig::default()
        }
    }

    /// Writes an executable shell script that receives the downloader
    /// arguments. `$out_dir` holds the directory of the `-o` template.
    #[cfg(unix)]
    fn fake_downloader(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-yt-dlp");
        let script = format!(
            "#!/bin/sh\nout=\"\"\nwhile [ $# -gt 0 ]; do\n  if [ \"$1\" = \"-o\" ]; then out=\"$2\"; shift; fi\n  shift\ndone\nout_dir=$(dirname \"$out\")\n{}\n",
            body
        );
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn command_args_follow_downloader_contract() {
        let acquirer = SubtitleAcquirer::new(SubtitleConfig {
            cookies_from_browser: Some("firefox".into()),
            cookies_file: Some(PathBuf::from("/etc/cookies.txt")),
            ..SubtitleConfig::default()
        });
        let args: Vec<String> = acquirer
            .command_args("https://youtu.be/abc", Path::new("/tmp/work"))
            .into_iter()
            .map(|a| a.into_string().unwrap())
            .collect();
        assert_eq!(
            args,
            [
                "--write-auto-sub",
                "--sub-lang",
                "en",
                "--skip-download",
                "-o",
                "/tmp/work/%(id)s.%(ext)s",
                "--cookies-from-browser",
                "firefox",
                "--cookies",
                "/etc/cookies.txt",
                "https://youtu.be/abc",
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn downloaded_vtt_becomes_clean_transcript() {
        let dir = tempfile::TempDir::new().unwrap();
        let program = fake_downloader(
            dir.path(),
            "echo '{}' > \"$out_dir/abc123.info.json\"\nprintf 'WEBVTT\\nKind: captions\\n\\n00:00:00.000 --> 00:00:02.000\\nhello from the <c>fake</c>\\n\\n00:00:02.000 --> 00:00:04.000\\ndownloader\\n' > \"$out_dir/abc123.en.vtt\"",
        );
        let acquirer = SubtitleAcquirer::new(config(program));

        let track = acquirer.acquire("https://youtu.be/abc123").await.unwrap();
        assert_eq!(track.format, CaptionFormat::Vtt);

        let transcript = acquirer.transcript("https://youtu.be/abc123").await.unwrap();
        assert_eq!(transcript, "hello from the fake downloader");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_download_error_with_output() {
        let dir = tempfile::TempDir::new().unwrap();
        let program = fake_downloader(
            dir.path(),
            "echo 'starting'\necho 'ERROR: Video unavailable' >&2\nexit 1",
        );
        let err = SubtitleAcquirer::new(config(program))
            .acquire("https://youtu.be/gone")
            .await
            .unwrap_err();
        match err {
            DigestError::Download { stdout, stderr, .. } => {
                assert_eq!(stdout.trim(), "starting");
                assert_eq!(stderr.trim(), "ERROR: Video unavailable");
            }
            other => panic!("expected Download, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn no_caption_file_lists_what_was_found() {
        let dir = tempfile::TempDir::new().unwrap();
        let program = fake_downloader(dir.path(), "echo '{}' > \"$out_dir/abc123.info.json\"");
        let err = SubtitleAcquirer::new(config(program))
            .acquire("https://youtu.be/abc123")
            .await
            .unwrap_err();
        match err {
            DigestError::NoSubtitles { files } => assert_eq!(files, ["abc123.info.json"]),
            other => panic!("expected NoSubtitles, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captions_that_clean_to_nothing_are_empty_content() {
        let dir = tempfile::TempDir::new().unwrap();
        let program = fake_downloader(
            dir.path(),
            "printf '1\\n00:00:01,000 --> 00:00:02,000\\n[MUSIC]\\n' > \"$out_dir/abc.en.srt\"",
        );
        let err = SubtitleAcquirer::new(config(program))
            .transcript("https://youtu.be/abc")
            .await
            .unwrap_err();
        assert!(matches!(err, DigestError::EmptyContent));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn work_directory_is_removed_on_every_outcome() {
        let cases = [
            (
                "success",
                "printf 'WEBVTT\\n\\n00:00:00.000 --> 00:00:01.000\\nhello there\\n' > \"$out_dir/v.en.vtt\"",
                true,
            ),
            ("failure", "exit 3", false),
            ("no captions", "echo '{}' > \"$out_dir/v.info.json\"", false),
        ];

        for (label, body, should_succeed) in cases {
            let dir = tempfile::TempDir::new().unwrap();
            let marker = dir.path().join("out_dir.txt");
            let script = format!("echo \"$out_dir\" > '{}'\n{}", marker.display(), body);
            let program = fake_downloader(dir.path(), &script);

            let result = SubtitleAcquirer::new(config(program))
                .acquire("https://youtu.be/v")
                .await;
            assert_eq!(result.is_ok(), should_succeed, "{label}: {result:?}");

            let out_dir = std::fs::read_to_string(&marker).unwrap();
            let out_dir = Path::new(out_dir.trim());
            let dir_name = out_dir.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            assert!(dir_name.starts_with("digest-subs-"), "{label}: {}", out_dir.display());
            assert!(!out_dir.exists(), "{label}: {} still exists", out_dir.display());
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_downloader_times_out() {
        let dir = tempfile::TempDir::new().unwrap();
        let program = fake_downloader(dir.path(), "sleep 5");
        let err = SubtitleAcquirer::new(SubtitleConfig {
            timeout_secs: 1,
            ..config(program)
        })
        .acquire("https://youtu.be/slow")
        .await
        .unwrap_err();
        assert!(err.to_string().contains("timed out"), "got: {err}");
    }

    #[tokio::test]
    async fn missing_program_is_download_error() {
        let err = SubtitleAcquirer::new(config(PathBuf::from("/nonexistent/yt-dlp")))
            .acquire("https://youtu.be/abc")
            .await
            .unwrap_err();
        assert!(matches!(err, DigestError::Download { .. }));
        assert_eq!(err.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
