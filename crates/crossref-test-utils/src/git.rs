//! Upstream repository fixtures.
//!
//! Repositories are created with the `git` CLI so the code under test never
//! builds its own fixtures. Their directory path doubles as a clone URL.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

/// A real git repository with a `main` branch, used as a remote.
///
/// # Panics
/// Every helper panics when the underlying git or filesystem operation fails.
pub struct UpstreamRepo {
    dir: TempDir,
}

impl UpstreamRepo {
    /// Initialise an empty repository whose first commit lands on `main`.
    pub fn new() -> Self {
        let dir = tempfile::tempdir()
            .unwrap_or_else(|e| panic!("UpstreamRepo: failed to create temp dir: {e}"));
        let repo = Self { dir };

        repo.git(&["init", "--quiet"]);
        repo.git(&["symbolic-ref", "HEAD", "refs/heads/main"]);
        repo.git(&["config", "user.email", "test@test.com"]);
        repo.git(&["config", "user.name", "Test User"]);
        repo.git(&["config", "commit.gpgsign", "false"]);
        repo.git(&["config", "tag.gpgsign", "false"]);
        repo
    }

    /// Initialise a repository with the given files committed on `main`.
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let repo = Self::new();
        for (path, content) in files {
            repo.write(path, content);
        }
        repo.commit("Initial commit");
        repo
    }

    /// Filesystem path of the repository.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// The repository path as a clone URL.
    pub fn url(&self) -> String {
        self.dir.path().to_string_lossy().into_owned()
    }

    /// Write a file in the working copy (not yet committed).
    pub fn write(&self, relative: &str, content: &str) {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("UpstreamRepo: failed to create {}: {e}", parent.display()));
        }
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("UpstreamRepo: failed to write {}: {e}", path.display()));
    }

    /// Delete a file from the working copy (not yet committed).
    pub fn remove(&self, relative: &str) {
        let path = self.dir.path().join(relative);
        fs::remove_file(&path)
            .unwrap_or_else(|e| panic!("UpstreamRepo: failed to remove {}: {e}", path.display()));
    }

    /// Stage everything and commit; returns the new commit id.
    pub fn commit(&self, message: &str) -> String {
        self.git(&["add", "--all"]);
        self.git(&["commit", "--quiet", "--allow-empty", "-m", message]);
        self.head()
    }

    /// Full id of the current `HEAD` commit.
    pub fn head(&self) -> String {
        self.git(&["rev-parse", "HEAD"])
    }

    /// Create a lightweight tag at `HEAD`.
    pub fn tag(&self, name: &str) {
        self.git(&["tag", name]);
    }

    /// Create an annotated tag at `HEAD`.
    pub fn annotated_tag(&self, name: &str, message: &str) {
        self.git(&["tag", "-a", name, "-m", message]);
    }

    /// Create `name` from `HEAD` and switch to it.
    pub fn branch(&self, name: &str) {
        self.git(&["checkout", "--quiet", "-b", name]);
    }

    /// Switch to an existing branch.
    pub fn checkout(&self, name: &str) {
        self.git(&["checkout", "--quiet", name]);
    }

    /// Run a git command in the repository and return trimmed stdout.
    pub fn git(&self, args: &[&str]) -> String {
        run_git(self.dir.path(), args)
    }
}

impl Default for UpstreamRepo {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `git` in `cwd`, panicking on failure.
pub fn run_git(cwd: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .output()
        .unwrap_or_else(|e| panic!("run_git: failed to run `git {args:?}`: {e}"));
    if !output.status.success() {
        panic!(
            "run_git: `git {args:?}` failed:\n{}",
            String::from_utf8_lossy(&output.stderr)
        );
    }
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Creates a minimal `.git` directory marker without a real repository.
///
/// Use for tests that only need working tree root detection.
pub fn fake_git_dir(path: &Path) -> PathBuf {
    let git = path.join(".git");
    fs::create_dir_all(git.join("refs/heads"))
        .unwrap_or_else(|e| panic!("fake_git_dir: failed to create .git: {e}"));
    fs::write(git.join("HEAD"), "ref: refs/heads/main\n")
        .unwrap_or_else(|e| panic!("fake_git_dir: failed to write HEAD: {e}"));
    git
}
