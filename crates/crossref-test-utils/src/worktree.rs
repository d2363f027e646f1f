//! Working tree fixture.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::git::fake_git_dir;

/// A temporary working tree with a `.git` marker directory.
///
/// # Panics
/// Helpers panic when filesystem operations fail.
pub struct WorkTree {
    dir: TempDir,
}

impl WorkTree {
    pub fn new() -> Self {
        let dir = tempfile::tempdir()
            .unwrap_or_else(|e| panic!("WorkTree: failed to create temp dir: {e}"));
        fake_git_dir(dir.path());
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Path of the `.gitcrossref` document.
    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join(".gitcrossref")
    }

    /// Write the `.gitcrossref` document.
    pub fn write_config(&self, yaml: &str) {
        self.write(".gitcrossref", yaml);
    }

    /// Read the `.gitcrossref` document.
    pub fn read_config(&self) -> String {
        self.read(".gitcrossref")
    }

    pub fn write(&self, relative: &str, content: &str) {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("WorkTree: failed to create {}: {e}", parent.display()));
        }
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("WorkTree: failed to write {}: {e}", path.display()));
    }

    pub fn read(&self, relative: &str) -> String {
        let path = self.dir.path().join(relative);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("WorkTree: failed to read {}: {e}", path.display()))
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.dir.path().join(relative).exists()
    }
}

impl Default for WorkTree {
    fn default() -> Self {
        Self::new()
    }
}
