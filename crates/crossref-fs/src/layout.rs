//! Working tree layout detection
//!
//! The working tree root is the nearest ancestor holding a `.git` entry.
//! Destinations, the configuration document and the default cache
//! location are all derived from it.

use std::path::Path;

use crate::{CrossrefPath, Error, NormalizedPath, Result};

/// Resolved locations for one working tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceLayout {
    /// Root of the working tree
    pub root: NormalizedPath,
    /// The `.git` directory when the root has one (not a gitlink file)
    pub git_dir: Option<NormalizedPath>,
}

impl WorkspaceLayout {
    /// Build a layout rooted at `root` without searching.
    pub fn at(root: impl AsRef<Path>) -> Self {
        let root = NormalizedPath::new(root);
        let git = root.join(CrossrefPath::GitDir.as_str());
        let git_dir = git.is_dir().then_some(git);
        Self { root, git_dir }
    }

    /// Walk up from `start` to the nearest directory containing `.git`.
    ///
    /// `.git` may be a directory or a file (worktrees, submodules).
    pub fn detect(start: impl AsRef<Path>) -> Result<Self> {
        let start = NormalizedPath::canonicalize(start)?;
        let mut current = Some(start.clone());

        while let Some(dir) = current {
            if dir.join(CrossrefPath::GitDir.as_str()).exists() {
                tracing::debug!(root = %dir, "Detected working tree root");
                return Ok(Self::at(dir.to_native()));
            }
            current = dir.parent();
        }

        Err(Error::WorkspaceNotFound {
            start: start.to_native(),
        })
    }

    /// Like [`detect`](Self::detect), but fall back to `start` itself when
    /// no enclosing git working tree exists.
    pub fn discover(start: impl AsRef<Path>) -> Result<Self> {
        match Self::detect(start.as_ref()) {
            Err(Error::WorkspaceNotFound { start }) => {
                tracing::debug!(root = %start.display(), "No git root found, using start directory");
                Ok(Self::at(start))
            }
            other => other,
        }
    }

    /// Default location of the configuration document.
    pub fn config_path(&self) -> NormalizedPath {
        self.root.join(CrossrefPath::ConfigFile.as_str())
    }

    /// Location of an on-disk schema document next to the configuration.
    pub fn schema_path(&self) -> NormalizedPath {
        self.root.join(CrossrefPath::SchemaFile.as_str())
    }

    /// Cache directory inside `.git`, when the root has a `.git` directory.
    pub fn default_cache_dir(&self) -> Option<NormalizedPath> {
        self.git_dir
            .as_ref()
            .map(|git| git.join(CrossrefPath::CacheDir.as_str()))
    }

    /// Resolve a configured destination against the root.
    ///
    /// Rejects absolute destinations and ones that climb out of the root.
    pub fn destination(&self, relative: &str) -> Result<NormalizedPath> {
        match crate::normalize_relative(relative) {
            Some(normalized) if !normalized.is_empty() => Ok(self.root.join(&normalized)),
            _ => Err(Error::PathEscapesRoot {
                path: relative.to_string(),
            }),
        }
    }
}
