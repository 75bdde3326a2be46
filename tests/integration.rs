use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn reel_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_reel"))
}

fn setup_test_env(sites: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/reel.sqlite"

[fetch]
timeout_secs = 5

[log]
level = "warn"

{}
"#,
        root.display(),
        sites
    );

    let config_path = config_dir.join("reel.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_reel(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = reel_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run reel binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env("");

    let (stdout, stderr, success) = run_reel(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data").join("reel.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env("");

    let (_, _, first) = run_reel(&config_path, &["init"]);
    assert!(first, "First init failed");
    let (_, _, second) = run_reel(&config_path, &["init"]);
    assert!(second, "Second init failed (not idempotent)");
}

#[test]
fn test_stats_on_empty_database() {
    let (_tmp, config_path) = setup_test_env("");

    run_reel(&config_path, &["init"]);
    let (stdout, stderr, success) = run_reel(&config_path, &["stats"]);
    assert!(success, "stats failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Movies:      0"));
    assert!(stdout.contains("Reviews:     0"));
}

#[test]
fn test_movies_on_empty_database() {
    let (_tmp, config_path) = setup_test_env("");

    run_reel(&config_path, &["init"]);
    let (stdout, _, success) = run_reel(&config_path, &["movies", "--title", "dune"]);
    assert!(success);
    assert!(stdout.contains("No movies found."));
}

#[test]
fn test_sites_lists_enabled_scrapers() {
    let (_tmp, config_path) = setup_test_env(
        r#"[sites.imdb]
list = true
reviews = true
"#,
    );

    let (stdout, stderr, success) = run_reel(&config_path, &["sites"]);
    assert!(success, "sites failed: stdout={}, stderr={}", stdout, stderr);
    let imdb = stdout.lines().find(|l| l.starts_with("imdb")).unwrap();
    assert!(imdb.contains("enabled"));
    let bom = stdout
        .lines()
        .find(|l| l.starts_with("boxofficemojo"))
        .unwrap();
    assert!(bom.contains("n/a"));
}

#[test]
fn test_run_without_sites_fails() {
    let (_tmp, config_path) = setup_test_env("");

    let (_, stderr, success) = run_reel(&config_path, &["run", "--progress", "off"]);
    assert!(!success);
    assert!(stderr.contains("No sites enabled"));
}

#[test]
fn test_invalid_site_config_is_rejected() {
    let (_tmp, config_path) = setup_test_env(
        r#"[sites.boxofficemojo]
reviews = true
"#,
    );

    let (_, stderr, success) = run_reel(&config_path, &["init"]);
    assert!(!success);
    assert!(stderr.contains("no review pages"));
}
