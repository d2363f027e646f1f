//! In-memory remote cache
//!
//! Stands in for [`GitCache`](crate::GitCache) in tests: remotes are keyed
//! by URL and hold snapshots per commit, while slots are keyed by remote
//! name exactly like the on-disk cache.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::provider::{Materialization, RemoteCache, RemoteTarget};
use crate::resolve::looks_like_commit;
use crate::{Error, Result};

type Snapshot = BTreeMap<String, Vec<u8>>;

#[derive(Debug, Clone)]
struct MemoryRemote {
    branches: HashMap<String, String>,
    tags: HashMap<String, String>,
    commits: Vec<String>,
    default_branch: String,
    available: bool,
}

#[derive(Debug, Default)]
struct State {
    remotes: HashMap<String, MemoryRemote>,
    snapshots: HashMap<String, (String, Snapshot)>,
    slots: BTreeSet<String>,
    clones: HashMap<String, usize>,
    fetches: HashMap<String, usize>,
    next_commit: u64,
}

/// Remote cache backed entirely by memory.
#[derive(Debug, Default)]
pub struct MemoryCache {
    state: Mutex<State>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an empty remote at `url` whose default branch is `main`.
    pub fn add_remote(&self, url: &str) {
        self.state().remotes.entry(url.to_string()).or_insert_with(|| MemoryRemote {
            branches: HashMap::new(),
            tags: HashMap::new(),
            commits: Vec::new(),
            default_branch: "main".to_string(),
            available: true,
        });
    }

    /// Commit `files` on top of `branch` and return the new commit id.
    ///
    /// A `None` content deletes the path. The remote and branch are created
    /// when missing.
    pub fn commit(&self, url: &str, branch: &str, files: &[(&str, Option<&str>)]) -> String {
        self.add_remote(url);
        let mut state = self.state();

        state.next_commit += 1;
        let id = crossref_fs::compute_checksum(format!("{url}\0{}", state.next_commit).as_bytes());
        let id = id.trim_start_matches("sha256:")[..40].to_string();

        let parent = state
            .remotes
            .get(url)
            .and_then(|remote| remote.branches.get(branch))
            .cloned();
        let mut snapshot = parent
            .and_then(|parent| state.snapshots.get(&parent))
            .map(|(_, snapshot)| snapshot.clone())
            .unwrap_or_default();
        for (path, content) in files {
            match content {
                Some(content) => snapshot.insert(path.to_string(), content.as_bytes().to_vec()),
                None => snapshot.remove(*path),
            };
        }

        let message = format!("update {branch}");
        state.snapshots.insert(id.clone(), (message, snapshot));
        if let Some(remote) = state.remotes.get_mut(url) {
            remote.branches.insert(branch.to_string(), id.clone());
            remote.commits.push(id.clone());
        }
        id
    }

    /// Shorthand for committing string files on `main`.
    pub fn write(&self, url: &str, files: &[(&str, &str)]) -> String {
        let files: Vec<_> = files.iter().map(|(path, content)| (*path, Some(*content))).collect();
        self.commit(url, "main", &files)
    }

    /// Point tag `name` at `commit`.
    pub fn tag(&self, url: &str, name: &str, commit: &str) {
        if let Some(remote) = self.state().remotes.get_mut(url) {
            remote.tags.insert(name.to_string(), commit.to_string());
        }
    }

    /// Toggle whether `resolve` can reach the remote at `url`.
    pub fn set_available(&self, url: &str, available: bool) {
        if let Some(remote) = self.state().remotes.get_mut(url) {
            remote.available = available;
        }
    }

    /// Number of clones performed for the slot `name`.
    pub fn clone_count(&self, name: &str) -> usize {
        self.state().clones.get(name).copied().unwrap_or(0)
    }

    /// Number of fetches performed for the slot `name`.
    pub fn fetch_count(&self, name: &str) -> usize {
        self.state().fetches.get(name).copied().unwrap_or(0)
    }

    /// Whether a slot currently exists for `name`.
    pub fn has_slot(&self, name: &str) -> bool {
        self.state().slots.contains(name)
    }

    fn snapshot<'s>(state: &'s State, handle: &Materialization) -> Result<&'s Snapshot> {
        state
            .snapshots
            .get(&handle.commit)
            .map(|(_, snapshot)| snapshot)
            .ok_or_else(|| Error::CorruptSlot {
                name: handle.name.clone(),
                message: format!("unknown commit {}", handle.commit),
            })
    }
}

impl MemoryRemote {
    fn resolve(&self, version: Option<&str>) -> Option<String> {
        let Some(version) = version else {
            return self.branches.get(&self.default_branch).cloned();
        };

        let by_commit = looks_like_commit(version)
            .then(|| {
                let version = version.to_ascii_lowercase();
                let mut matches = self.commits.iter().filter(|id| id.starts_with(&version));
                match (matches.next(), matches.next()) {
                    (Some(id), None) => Some(id.clone()),
                    _ => None,
                }
            })
            .flatten();

        by_commit
            .or_else(|| self.tags.get(version).cloned())
            .or_else(|| self.branches.get(version).cloned())
    }
}

impl RemoteCache for MemoryCache {
    fn resolve(&self, target: &RemoteTarget) -> Result<Materialization> {
        crossref_fs::validate_path_identifier(&target.name)?;
        let mut state = self.state();

        let remote = match state.remotes.get(&target.url) {
            Some(remote) if remote.available => remote.clone(),
            _ => {
                return Err(Error::RemoteUnavailable {
                    name: target.name.clone(),
                    url: target.url.clone(),
                    message: "remote is not reachable".to_string(),
                });
            }
        };

        let counter = if state.slots.insert(target.name.clone()) {
            &mut state.clones
        } else {
            &mut state.fetches
        };
        *counter.entry(target.name.clone()).or_default() += 1;

        let commit = remote
            .resolve(target.version.as_deref())
            .ok_or_else(|| Error::VersionNotFound {
                name: target.name.clone(),
                version: target.version_label().to_string(),
            })?;
        let message = state
            .snapshots
            .get(&commit)
            .map(|(message, _)| message.clone())
            .unwrap_or_default();

        Ok(Materialization {
            name: target.name.clone(),
            version: target.version.clone(),
            description: format!("{:.7} {}", commit, message),
            commit,
        })
    }

    fn read_file(&self, handle: &Materialization, path: &str) -> Result<Vec<u8>> {
        let state = self.state();
        Self::snapshot(&state, handle)?
            .get(path.trim_matches('/'))
            .cloned()
            .ok_or_else(|| Error::SourceNotFound {
                name: handle.name.clone(),
                path: path.to_string(),
                version: handle.short_commit().to_string(),
            })
    }

    fn list_tree(&self, handle: &Materialization, path: &str) -> Result<Vec<String>> {
        let state = self.state();
        let dir = path.trim_matches('/');
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{dir}/")
        };

        let files: Vec<String> = Self::snapshot(&state, handle)?
            .keys()
            .filter_map(|key| key.strip_prefix(prefix.as_str()).map(str::to_string))
            .collect();

        if files.is_empty() {
            return Err(Error::SourceNotFound {
                name: handle.name.clone(),
                path: path.to_string(),
                version: handle.short_commit().to_string(),
            });
        }
        Ok(files)
    }

    fn remove(&self, name: &str) -> Result<bool> {
        Ok(self.state().slots.remove(name))
    }

    fn cleanup(&self) -> Result<usize> {
        let mut state = self.state();
        let removed = state.slots.len();
        state.slots.clear();
        Ok(removed)
    }

    fn prune(&self, keep: &[String]) -> Result<Vec<String>> {
        let mut state = self.state();
        let evicted: Vec<String> = state
            .slots
            .iter()
            .filter(|name| !keep.contains(*name))
            .cloned()
            .collect();
        for name in &evicted {
            state.slots.remove(name);
        }
        Ok(evicted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const URL: &str = "https://example/repo.git";

    fn target(version: Option<&str>) -> RemoteTarget {
        RemoteTarget::new("origin", URL, version.map(str::to_string))
    }

    #[test]
    fn first_resolve_clones_then_fetches() {
        let cache = MemoryCache::new();
        cache.write(URL, &[("a.txt", "hello")]);

        cache.resolve(&target(Some("main"))).unwrap();
        cache.resolve(&target(Some("main"))).unwrap();

        assert_eq!(cache.clone_count("origin"), 1);
        assert_eq!(cache.fetch_count("origin"), 1);
    }

    #[test]
    fn commit_prefix_pins_older_content() {
        let cache = MemoryCache::new();
        let first = cache.write(URL, &[("a.txt", "one")]);
        cache.write(URL, &[("a.txt", "two")]);

        let handle = cache.resolve(&target(Some(&first[..8]))).unwrap();
        assert_eq!(cache.read_file(&handle, "a.txt").unwrap(), b"one");

        let handle = cache.resolve(&target(None)).unwrap();
        assert_eq!(cache.read_file(&handle, "a.txt").unwrap(), b"two");
    }

    #[test]
    fn commit_prefix_wins_over_hex_named_branch() {
        let cache = MemoryCache::new();
        let first = cache.write(URL, &[("a.txt", "one")]);
        let prefix = &first[..8];
        cache.commit(URL, prefix, &[("a.txt", Some("branch"))]);

        let handle = cache.resolve(&target(Some(prefix))).unwrap();
        assert_eq!(handle.commit, first);
    }

    #[test]
    fn tag_wins_over_branch_of_the_same_name() {
        let cache = MemoryCache::new();
        let first = cache.write(URL, &[("a.txt", "tagged")]);
        cache.tag(URL, "release", &first);
        cache.commit(URL, "release", &[("a.txt", Some("branch"))]);

        let handle = cache.resolve(&target(Some("release"))).unwrap();
        assert_eq!(handle.commit, first);
        assert_eq!(cache.read_file(&handle, "a.txt").unwrap(), b"tagged");
    }

    #[test]
    fn list_tree_is_relative_to_directory() {
        let cache = MemoryCache::new();
        cache.write(URL, &[("docs/a.md", "a"), ("docs/sub/b.md", "b"), ("top.txt", "t")]);

        let handle = cache.resolve(&target(None)).unwrap();
        assert_eq!(cache.list_tree(&handle, "docs/").unwrap(), vec!["a.md", "sub/b.md"]);
        assert!(matches!(
            cache.list_tree(&handle, "missing"),
            Err(Error::SourceNotFound { .. })
        ));
    }

    #[test]
    fn unavailable_remote_is_reported() {
        let cache = MemoryCache::new();
        cache.write(URL, &[("a.txt", "x")]);
        cache.set_available(URL, false);

        let err = cache.resolve(&target(None)).unwrap_err();
        assert!(err.is_unavailable());
        assert!(!cache.has_slot("origin"));
    }
}
