//! End-to-end tests for the `git-crossref` binary.
//!
//! Remotes are real git repositories on disk, addressed by path.

use std::path::Path;

use assert_cmd::Command;
use crossref_test_utils::{UpstreamRepo, WorkTree};
use predicates::prelude::*;

fn crossref(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("git-crossref"));
    cmd.current_dir(dir)
        .env_remove("GITCROSSREF_CONFIG")
        .env_remove("GITCROSSREF_CACHE_DIR")
        .env_remove("GITCROSSREF_SCHEMA")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

fn config_for(upstream: &UpstreamRepo) -> String {
    format!(
        "\
remotes:
  origin:
    url: {}
    version: main
files:
  origin:
    - source: a.txt
      destination: out/a.txt
",
        upstream.url()
    )
}

#[test]
fn help_mentions_the_configuration_file() {
    let dir = tempfile::tempdir().unwrap();
    crossref(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(".gitcrossref"))
        .stdout(predicate::str::contains("sync"));
}

#[test]
fn version_flag() {
    let dir = tempfile::tempdir().unwrap();
    crossref(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("git-crossref"));
}

#[test]
fn missing_configuration_suggests_init() {
    let work = WorkTree::new();
    crossref(work.root())
        .arg("sync")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "Run 'git-crossref init' to create a configuration file.",
        ));
}

#[test]
fn init_writes_template_once() {
    let work = WorkTree::new();
    crossref(work.root())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Edit this file to configure your remotes and files."));
    assert!(work.read_config().contains("remotes:"));

    work.write_config("# mine\n");
    crossref(work.root())
        .arg("init")
        .assert()
        .success()
        .stderr(predicate::str::contains("Configuration file already exists"));
    assert_eq!(work.read_config(), "# mine\n");
}

#[test]
fn validate_accepts_the_template() {
    let work = WorkTree::new();
    crossref(work.root()).arg("init").assert().success();

    crossref(work.root())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration file is valid"))
        .stderr(predicate::str::contains("Schema validation passed for"))
        .stderr(predicate::str::contains("Configuration file is valid"));
}

#[test]
fn validate_names_the_undeclared_remote() {
    let work = WorkTree::new();
    work.write_config(
        "\
remotes:
  origin:
    url: https://example/repo.git
files:
  ghost:
    - source: a.txt
      destination: out/a.txt
",
    );

    crossref(work.root())
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("files.ghost"));
}

#[test]
fn sync_check_force_round_trip() {
    let upstream = UpstreamRepo::with_files(&[("a.txt", "hello")]);
    let work = WorkTree::new();
    work.write_config(&config_for(&upstream));

    crossref(work.root()).arg("sync").assert().success();
    assert_eq!(work.read("out/a.txt"), "hello");
    assert!(work.read_config().contains("hash: sha256:"));

    crossref(work.root())
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("up to date"));

    work.write("out/a.txt", "hacked");
    crossref(work.root())
        .arg("check")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("conflict"));
    assert_eq!(work.read("out/a.txt"), "hacked");

    crossref(work.root()).args(["sync", "--force"]).assert().success();
    assert_eq!(work.read("out/a.txt"), "hello");
}

#[test]
fn dry_run_writes_nothing() {
    let upstream = UpstreamRepo::with_files(&[("a.txt", "hello")]);
    let work = WorkTree::new();
    let config = config_for(&upstream);
    work.write_config(&config);

    crossref(work.root())
        .args(["sync", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("would create"));
    assert!(!work.exists("out/a.txt"));
    assert_eq!(work.read_config(), config);
}

#[test]
fn json_report_lists_outcomes() {
    let upstream = UpstreamRepo::with_files(&[("a.txt", "hello")]);
    let work = WorkTree::new();
    work.write_config(&config_for(&upstream));

    let output = crossref(work.root()).args(["check", "--json"]).output().unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["mode"], "Check");
    assert_eq!(report["results"][0]["outcome"], "Create");
}

#[test]
fn unknown_remote_is_reported() {
    let upstream = UpstreamRepo::with_files(&[("a.txt", "hello")]);
    let work = WorkTree::new();
    work.write_config(&config_for(&upstream));

    crossref(work.root())
        .args(["clone", "--remote", "nope"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Remote 'nope' not found in configuration"));
}

#[test]
fn clone_then_clean_manages_the_cache() {
    let upstream = UpstreamRepo::with_files(&[("a.txt", "hello")]);
    let work = WorkTree::new();
    work.write_config(&config_for(&upstream));
    let cache = tempfile::tempdir().unwrap();
    let cache_arg = cache.path().to_string_lossy().into_owned();

    crossref(work.root())
        .args(["clone", "--cache-dir", &cache_arg])
        .assert()
        .success();
    assert!(cache.path().join("origin").exists());
    assert!(!work.exists("out/a.txt"));

    crossref(work.root())
        .args(["clean", "--cache-dir", &cache_arg])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 cached clone(s)"));
    assert!(!cache.path().join("origin").exists());
}

#[test]
fn missing_source_fails_the_run() {
    let upstream = UpstreamRepo::with_files(&[("b.txt", "other")]);
    let work = WorkTree::new();
    work.write_config(&config_for(&upstream));

    crossref(work.root())
        .arg("sync")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("source not found"));
    assert!(!work.exists("out/a.txt"));
}
