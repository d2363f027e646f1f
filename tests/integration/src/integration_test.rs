//! End-to-end integration test for the sync flow
//!
//! Exercises the complete path: configuration loading -> git cache ->
//! planner -> destination writes -> hash write-back, against a real git
//! repository on disk.

use std::sync::Arc;

use crossref_core::{Outcome, SyncEngine};
use crossref_fs::checksum::compute_content_checksum;
use crossref_fs::WorkspaceLayout;
use crossref_git::GitCache;
use crossref_meta::ConfigLoader;
use crossref_test_utils::{UpstreamRepo, WorkTree};
use pretty_assertions::assert_eq;

struct Fixture {
    upstream: UpstreamRepo,
    work: WorkTree,
    cache_dir: tempfile::TempDir,
}

impl Fixture {
    fn new(config: impl Fn(&str) -> String) -> Self {
        let upstream = UpstreamRepo::with_files(&[("a.txt", "hello")]);
        let work = WorkTree::new();
        work.write_config(&config(&upstream.url()));
        Self {
            upstream,
            work,
            cache_dir: tempfile::tempdir().unwrap(),
        }
    }

    /// A fresh engine over the document currently on disk, as each CLI
    /// invocation would build it.
    fn engine(&self) -> SyncEngine {
        let layout = WorkspaceLayout::detect(self.work.root()).unwrap();
        let loaded = ConfigLoader::default().load(&layout.config_path()).unwrap();
        let cache = Arc::new(GitCache::new(self.cache_dir.path()));
        SyncEngine::new(layout.root, loaded.configuration, cache).with_document(loaded.document)
    }
}

fn single_entry(url: &str) -> String {
    format!(
        "\
remotes:
  origin:
    url: {url}
    version: main
files:
  origin:
    - source: a.txt
      destination: out/a.txt
"
    )
}

#[test]
fn test_create_insync_conflict_force() {
    let fixture = Fixture::new(single_entry);
    let work = &fixture.work;

    // First sync creates the destination and records its hash
    let report = fixture.engine().sync_all(false, None).unwrap();
    assert_eq!(report.results[0].outcome, Some(Outcome::Create));
    assert_eq!(work.read("out/a.txt"), "hello");
    assert!(work.read_config().contains(&compute_content_checksum("hello")));

    // Nothing changed
    let report = fixture.engine().sync_all(false, None).unwrap();
    assert_eq!(report.results[0].outcome, Some(Outcome::InSync));

    // Local edit is detected and kept
    work.write("out/a.txt", "hacked");
    let report = fixture.engine().check_all(None).unwrap();
    assert_eq!(report.results[0].outcome, Some(Outcome::Conflict));
    assert!(!report.is_success());
    assert_eq!(work.read("out/a.txt"), "hacked");

    // Force restores the remote content
    let report = fixture.engine().sync_all(true, None).unwrap();
    assert_eq!(report.results[0].outcome, Some(Outcome::Overwrite));
    assert_eq!(work.read("out/a.txt"), "hello");
}

#[test]
fn test_upstream_commit_is_picked_up() {
    let fixture = Fixture::new(single_entry);
    fixture.engine().sync_all(false, None).unwrap();

    fixture.upstream.write("a.txt", "hello v2");
    fixture.upstream.commit("Update a.txt");

    let report = fixture.engine().sync_all(false, None).unwrap();
    assert_eq!(report.results[0].outcome, Some(Outcome::NeedsUpdate));
    assert_eq!(fixture.work.read("out/a.txt"), "hello v2");
    assert_eq!(report.resolved[0].commit, fixture.upstream.head());
}

#[test]
fn test_write_back_keeps_document_shape() {
    let fixture = Fixture::new(|url| {
        format!(
            "\
remotes:
  origin:
    url: {url}
    version: main
files:
  origin:
    - source: a.txt
      destination: out/a.txt
      ignore_changes: false
"
        )
    });
    fixture.engine().sync_all(false, None).unwrap();

    let saved = fixture.work.read_config();
    let remotes = saved.find("remotes:").unwrap();
    let files = saved.find("files:").unwrap();
    let ignore = saved.find("ignore_changes").unwrap();
    let hash = saved.find("hash:").unwrap();
    assert!(remotes < files && files < ignore && ignore < hash, "{saved}");

    let document: serde_yaml::Value = serde_yaml::from_str(&saved).unwrap();
    assert_eq!(document["remotes"]["origin"]["version"].as_str(), Some("main"));
}

#[test]
fn test_check_leaves_everything_untouched() {
    let fixture = Fixture::new(single_entry);
    let before = fixture.work.read_config();

    let report = fixture.engine().check_all(None).unwrap();
    assert_eq!(report.results[0].outcome, Some(Outcome::Create));
    assert!(!fixture.work.exists("out/a.txt"));
    assert_eq!(fixture.work.read_config(), before);
}

#[test]
fn test_cleanup_removes_clones() {
    let fixture = Fixture::new(single_entry);
    let engine = {
        let mut engine = fixture.engine();
        engine.clone_remotes(None).unwrap();
        engine
    };
    assert!(fixture.cache_dir.path().join("origin").exists());

    assert_eq!(engine.cleanup().unwrap(), 1);
    assert!(!fixture.cache_dir.path().join("origin").exists());

    // Slots are rebuilt on demand
    let report = fixture.engine().sync_all(false, None).unwrap();
    assert!(report.is_success());
    assert_eq!(fixture.work.read("out/a.txt"), "hello");
}
