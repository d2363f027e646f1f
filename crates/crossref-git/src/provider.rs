//! Remote cache trait and the handles it hands out

use crate::Result;

/// What to materialize: a named remote at a version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    /// Remote name, which is also the cache slot key
    pub name: String,

    /// Clone URL (https, ssh, scp-style or a local path)
    pub url: String,

    /// Branch, tag or commit; `None` means the remote's default branch
    pub version: Option<String>,
}

impl RemoteTarget {
    pub fn new(name: impl Into<String>, url: impl Into<String>, version: Option<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            version,
        }
    }

    /// Human-readable version label for diagnostics.
    pub fn version_label(&self) -> &str {
        self.version.as_deref().unwrap_or("HEAD")
    }
}

/// A remote pinned to a resolved commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Materialization {
    /// Remote name
    pub name: String,

    /// The version expression that was resolved
    pub version: Option<String>,

    /// Full id of the resolved commit
    pub commit: String,

    /// Short description of the commit for logs
    pub description: String,
}

impl Materialization {
    /// Abbreviated commit id.
    pub fn short_commit(&self) -> &str {
        &self.commit[..self.commit.len().min(7)]
    }
}

/// Owner of the per-remote cache slots.
///
/// Slots are keyed by remote name, never by version: resolving a remote at
/// a new version updates its existing slot.
pub trait RemoteCache: Send + Sync {
    /// Clone or fetch the slot for `target`, then pin it to `target.version`.
    ///
    /// Resolution order is commit id, then tag, then branch.
    fn resolve(&self, target: &RemoteTarget) -> Result<Materialization>;

    /// Read a file at the resolved commit. `path` is relative to the
    /// repository root.
    fn read_file(&self, handle: &Materialization, path: &str) -> Result<Vec<u8>>;

    /// List every file below the directory `path` (empty for the root),
    /// relative to that directory, in sorted order.
    fn list_tree(&self, handle: &Materialization, path: &str) -> Result<Vec<String>>;

    /// Delete the slot for one remote. Returns whether a slot existed.
    fn remove(&self, name: &str) -> Result<bool>;

    /// Delete every slot. Returns the number removed.
    fn cleanup(&self) -> Result<usize>;

    /// Delete slots whose remote is not in `keep`. Returns the evicted names.
    fn prune(&self, keep: &[String]) -> Result<Vec<String>>;
}
