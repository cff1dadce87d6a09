//! Integration tests for the mcorpus binary.
//!
//! Run with: `cargo test --package method-corpus-cli --test cli_integration`

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

/// Run mcorpus inside `dir` with an isolated environment.
fn run_mcorpus(dir: &Path, args: &[&str], envs: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_mcorpus"));
    cmd.current_dir(dir)
        .args(args)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join("config"))
        .env("XDG_CACHE_HOME", dir.join("cache"))
        .env_remove("GITHUB_TOKEN")
        .env_remove("RUST_LOG");
    for (key, value) in envs {
        cmd.env(key, value);
    }
    cmd.output().expect("Failed to execute mcorpus")
}

#[test]
fn test_help_lists_logging_switches() {
    let temp = TempDir::new().unwrap();
    let output = run_mcorpus(temp.path(), &["--help"], &[]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--verbose"));
    assert!(stdout.contains("--quiet"));
}

#[test]
fn test_version() {
    let temp = TempDir::new().unwrap();
    let output = run_mcorpus(temp.path(), &["--version"], &[]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("mcorpus"));
}

#[test]
fn test_unknown_argument_is_rejected() {
    let temp = TempDir::new().unwrap();
    let output = run_mcorpus(temp.path(), &["--output", "x.csv"], &[]);

    assert!(!output.status.success());
}

#[test]
fn test_invalid_override_fails_before_running() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("methods.csv");
    let output = run_mcorpus(
        temp.path(),
        &["--quiet"],
        &[
            ("MCORPUS_MIN_STARS", "lots"),
            ("MCORPUS_OUTPUT", out.to_str().unwrap()),
        ],
    );

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("MCORPUS_MIN_STARS"));
    assert!(!out.exists());
}

#[test]
fn test_zero_repositories_writes_header_only() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out").join("methods.csv");
    let work = temp.path().join("work");
    let output = run_mcorpus(
        temp.path(),
        &[],
        &[
            ("MCORPUS_MAX_REPOS", "0"),
            ("MCORPUS_OUTPUT", out.to_str().unwrap()),
            ("MCORPUS_WORK_DIR", work.to_str().unwrap()),
        ],
    );

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Methods:      0"));

    let contents = fs::read_to_string(&out).unwrap();
    assert_eq!(
        contents.trim_end(),
        "dataset_split,repo_name,repo_url,commit_sha,file_path,method_name,start_line,end_line,signature,original_code,code_tokens"
    );
}
