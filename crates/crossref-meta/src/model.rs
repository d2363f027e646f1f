//! Typed configuration model

use std::collections::BTreeMap;

use crossref_fs::normalize_relative;
use serde::{Deserialize, Serialize};

/// One declared external repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSpec {
    /// Key of this remote in the `remotes` mapping
    #[serde(skip)]
    pub name: String,

    pub url: String,

    /// Subdirectory inside the remote that sources are relative to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,

    /// Branch, tag or commit; the remote's default branch when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl RemoteSpec {
    /// Path of `source` relative to the repository root.
    ///
    /// Joins the base path and normalizes. `None` when the result would
    /// climb above the repository root.
    pub fn source_path(&self, source: &str) -> Option<String> {
        let combined = match self.base_path.as_deref().map(|b| b.trim_matches('/')) {
            Some(base) if !base.is_empty() => format!("{base}/{source}"),
            _ => source.to_string(),
        };
        normalize_relative(&combined)
    }
}

/// Hash recorded after the last successful sync of an entry.
///
/// File entries record one checksum. Directory entries record a checksum
/// per contained file, keyed by its path relative to the directory, so
/// each file keeps its own history when the file set changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordedHash {
    File(String),
    Tree(BTreeMap<String, String>),
}

impl RecordedHash {
    /// Checksum of a file entry.
    pub fn as_file(&self) -> Option<&str> {
        match self {
            Self::File(hash) => Some(hash),
            Self::Tree(_) => None,
        }
    }

    /// Checksum recorded for `relative` inside a directory entry.
    pub fn tree_file(&self, relative: &str) -> Option<&str> {
        match self {
            Self::Tree(files) => files.get(relative).map(String::as_str),
            Self::File(_) => None,
        }
    }
}

impl From<&str> for RecordedHash {
    fn from(hash: &str) -> Self {
        Self::File(hash.to_string())
    }
}

impl std::fmt::Display for RecordedHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(hash) => f.write_str(hash),
            Self::Tree(files) => write!(f, "{} files", files.len()),
        }
    }
}

/// One tracked file or directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub source: String,

    pub destination: String,

    /// Checksum recorded after the last successful sync
    #[serde(rename = "hash", default, skip_serializing_if = "Option::is_none")]
    pub expected_hash: Option<RecordedHash>,

    /// Local edits never block a re-sync when set
    #[serde(default)]
    pub ignore_changes: bool,
}

impl FileEntry {
    /// Whether this entry tracks a whole directory (trailing separator).
    pub fn is_directory(&self) -> bool {
        self.source.ends_with('/') || self.source.ends_with('\\')
    }

    /// Destination normalized for comparison, or `None` if it is absolute
    /// or escapes the working tree.
    pub fn destination_key(&self) -> Option<String> {
        destination_key(&self.destination)
    }
}

/// Normalize a destination string for comparison.
///
/// `out/a.txt`, `./out/a.txt` and `out/a.txt/` compare equal.
pub fn destination_key(destination: &str) -> Option<String> {
    normalize_relative(destination).filter(|key| !key.is_empty())
}

/// A validated configuration.
///
/// Remotes iterate in lexical name order; entries keep document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub remotes: BTreeMap<String, RemoteSpec>,

    #[serde(default)]
    pub files: BTreeMap<String, Vec<FileEntry>>,
}

impl Configuration {
    /// Fill each remote's `name` from its mapping key.
    pub(crate) fn with_names(mut self) -> Self {
        for (name, remote) in &mut self.remotes {
            remote.name = name.clone();
        }
        self
    }

    pub fn remote(&self, name: &str) -> Option<&RemoteSpec> {
        self.remotes.get(name)
    }

    /// Entries owned by `remote`, in document order.
    pub fn entries(&self, remote: &str) -> &[FileEntry] {
        self.files.get(remote).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn remote_names(&self) -> Vec<String> {
        self.remotes.keys().cloned().collect()
    }

    /// Total number of file entries across all remotes.
    pub fn entry_count(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    /// Find the remote and index of the entry whose destination matches.
    pub fn find_destination(&self, destination: &str) -> Option<(&str, usize)> {
        let key = destination_key(destination)?;
        self.files.iter().find_map(|(remote, entries)| {
            entries
                .iter()
                .position(|entry| entry.destination_key().as_deref() == Some(key.as_str()))
                .map(|index| (remote.as_str(), index))
        })
    }
}
