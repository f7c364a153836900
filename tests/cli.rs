use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn digest_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("digest");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("digest.toml");
    fs::write(
        &config_path,
        r#"[llm]
api_key_env = "DIGEST_TEST_UNSET_KEY"
"#,
    )
    .unwrap();
    (tmp, config_path)
}

fn run_digest(dir: &Path, config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = digest_binary();
    let output = Command::new(&binary)
        .current_dir(dir)
        .env_remove("DIGEST_TEST_UNSET_KEY")
        .env("RUST_LOG", "warn")
        .arg("--config")
        .arg(config_path)
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run digest binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_extract_text_file() {
    let (tmp, config_path) = setup_test_env();
    let file = tmp.path().join("notes.md");
    fs::write(&file, "# Notes\n\nBorrowing lets code use a value without owning it.").unwrap();

    let (stdout, stderr, success) =
        run_digest(tmp.path(), &config_path, &["extract", "file", file.to_str().unwrap()]);
    assert!(success, "stderr: {}", stderr);
    assert_eq!(
        stdout.trim_end(),
        "# Notes\n\nBorrowing lets code use a value without owning it."
    );
}

#[test]
fn test_extract_rejects_unsupported_file() {
    let (tmp, config_path) = setup_test_env();
    let file = tmp.path().join("contract.docx");
    fs::write(&file, "not really a docx").unwrap();

    let (_stdout, stderr, success) =
        run_digest(tmp.path(), &config_path, &["extract", "file", file.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains(".docx"), "stderr: {}", stderr);
}

#[test]
fn test_captions_are_parsed_and_cleaned() {
    let (tmp, config_path) = setup_test_env();
    let file = tmp.path().join("talk.en.srt");
    fs::write(
        &file,
        "1\n00:00:00,000 --> 00:00:02,000\n[MUSIC]\n\n\
         2\n00:00:02,000 --> 00:00:05,000\nToday we talk about <i>lifetimes</i>.\n\n\
         3\n00:00:05,000 --> 00:00:07,000\nSubtitles by the community\n",
    )
    .unwrap();

    let (stdout, stderr, success) =
        run_digest(tmp.path(), &config_path, &["captions", file.to_str().unwrap()]);
    assert!(success, "stderr: {}", stderr);
    let text = stdout.trim_end();
    assert!(text.contains("Today we talk about lifetimes."), "stdout: {}", text);
    assert!(!text.contains("-->"));
    assert!(!text.contains("<i>"));
}

#[test]
fn test_captions_rejects_unknown_format() {
    let (tmp, config_path) = setup_test_env();
    let file = tmp.path().join("talk.json");
    fs::write(&file, "{}").unwrap();

    let (_stdout, stderr, success) =
        run_digest(tmp.path(), &config_path, &["captions", file.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("not a .srt or .vtt file"), "stderr: {}", stderr);
}

#[test]
fn test_summarize_without_api_key_fails() {
    let (tmp, config_path) = setup_test_env();
    let file = tmp.path().join("notes.txt");
    fs::write(&file, "Some content worth summarizing.").unwrap();

    let (_stdout, stderr, success) =
        run_digest(tmp.path(), &config_path, &["summarize", "file", file.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("API key not configured"), "stderr: {}", stderr);
}

#[test]
fn test_invalid_config_is_reported() {
    let (tmp, config_path) = setup_test_env();
    fs::write(&config_path, "[summary]\nchars_per_token = 0\n").unwrap();
    let file = tmp.path().join("notes.txt");
    fs::write(&file, "text").unwrap();

    let (_stdout, stderr, success) =
        run_digest(tmp.path(), &config_path, &["extract", "file", file.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("chars_per_token"), "stderr: {}", stderr);
}
