//! Version pinning, directory entries and multi-remote runs against real
//! git repositories.

use std::sync::Arc;

use crossref_core::{EngineOptions, FailureKind, Outcome, SyncEngine, SyncReport};
use crossref_fs::WorkspaceLayout;
use crossref_git::GitCache;
use crossref_meta::ConfigLoader;
use crossref_test_utils::{UpstreamRepo, WorkTree};
use pretty_assertions::assert_eq;

fn sync(work: &WorkTree, cache: &tempfile::TempDir, jobs: usize) -> SyncReport {
    let layout = WorkspaceLayout::detect(work.root()).unwrap();
    let loaded = ConfigLoader::default().load(&layout.config_path()).unwrap();
    let options = EngineOptions {
        jobs,
        ..EngineOptions::default()
    };
    SyncEngine::new(layout.root, loaded.configuration, Arc::new(GitCache::new(cache.path())))
        .with_document(loaded.document)
        .with_options(options)
        .sync_all(false, None)
        .unwrap()
}

fn pinned(url: &str, version: &str) -> String {
    format!(
        "\
remotes:
  origin:
    url: {url}
    version: '{version}'
files:
  origin:
    - source: a.txt
      destination: a.txt
"
    )
}

#[test]
fn test_tag_pins_content() {
    let upstream = UpstreamRepo::with_files(&[("a.txt", "v1")]);
    upstream.tag("v1.0.0");
    upstream.write("a.txt", "v2");
    upstream.commit("Second");

    let work = WorkTree::new();
    work.write_config(&pinned(&upstream.url(), "v1.0.0"));
    let cache = tempfile::tempdir().unwrap();

    let report = sync(&work, &cache, 1);
    assert!(report.is_success());
    assert_eq!(work.read("a.txt"), "v1");
}

#[test]
fn test_commit_prefix_pins_content() {
    let upstream = UpstreamRepo::with_files(&[("a.txt", "first")]);
    let first = upstream.head();
    upstream.write("a.txt", "second");
    upstream.commit("Second");

    let work = WorkTree::new();
    work.write_config(&pinned(&upstream.url(), &first[..10]));
    let cache = tempfile::tempdir().unwrap();

    sync(&work, &cache, 1);
    assert_eq!(work.read("a.txt"), "first");
}

#[test]
fn test_directory_entry_with_base_path() {
    let upstream = UpstreamRepo::with_files(&[
        ("src/lib/one.rs", "one"),
        ("src/lib/deep/two.rs", "two"),
        ("README.md", "readme"),
    ]);
    let work = WorkTree::new();
    work.write_config(&format!(
        "\
remotes:
  origin:
    url: {}
    base_path: src
files:
  origin:
    - source: lib/
      destination: vendor/lib/
",
        upstream.url()
    ));
    let cache = tempfile::tempdir().unwrap();

    let report = sync(&work, &cache, 1);
    assert_eq!(report.results[0].outcome, Some(Outcome::Create));
    assert_eq!(work.read("vendor/lib/one.rs"), "one");
    assert_eq!(work.read("vendor/lib/deep/two.rs"), "two");
    assert!(!work.exists("vendor/lib/README.md"));

    upstream.write("src/lib/three.rs", "three");
    upstream.commit("Add three");

    let report = sync(&work, &cache, 1);
    assert_eq!(report.results[0].outcome, Some(Outcome::Create));
    let touched: Vec<_> = report.results[0]
        .files
        .iter()
        .filter(|file| file.outcome != Outcome::InSync)
        .map(|file| file.relative.as_str())
        .collect();
    assert_eq!(touched, vec!["three.rs"]);

    let report = sync(&work, &cache, 1);
    assert_eq!(report.results[0].outcome, Some(Outcome::InSync));
}

#[test]
fn test_parallel_remotes_isolate_failures() {
    let first = UpstreamRepo::with_files(&[("a.txt", "a")]);
    let second = UpstreamRepo::with_files(&[("b.txt", "b")]);
    let missing = tempfile::tempdir().unwrap();

    let work = WorkTree::new();
    work.write_config(&format!(
        "\
remotes:
  first:
    url: {}
  second:
    url: {}
  broken:
    url: {}
files:
  first:
    - source: a.txt
      destination: out/a.txt
  second:
    - source: b.txt
      destination: out/b.txt
  broken:
    - source: c.txt
      destination: out/c.txt
",
        first.url(),
        second.url(),
        missing.path().join("nothing-here").display()
    ));
    let cache = tempfile::tempdir().unwrap();

    let report = sync(&work, &cache, 3);
    assert_eq!(work.read("out/a.txt"), "a");
    assert_eq!(work.read("out/b.txt"), "b");
    assert!(!work.exists("out/c.txt"));

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].remote, "broken");
    assert_ne!(report.failures[0].kind, FailureKind::VersionNotFound);

    let remotes: Vec<_> = report.results.iter().map(|r| r.remote.as_str()).collect();
    assert_eq!(remotes, vec!["first", "second"]);
}

#[test]
fn test_unknown_branch_is_version_not_found() {
    let upstream = UpstreamRepo::with_files(&[("a.txt", "a")]);
    let work = WorkTree::new();
    work.write_config(&pinned(&upstream.url(), "no-such-branch"));
    let cache = tempfile::tempdir().unwrap();

    let report = sync(&work, &cache, 1);
    assert_eq!(report.failures[0].kind, FailureKind::VersionNotFound);
    assert!(!work.exists("a.txt"));
}
