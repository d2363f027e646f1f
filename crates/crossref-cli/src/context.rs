//! Working tree context
//!
//! Resolves where the configuration, schema and cache live for the current
//! directory, so commands work from anywhere inside the working tree.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crossref_core::{EngineOptions, SyncEngine};
use crossref_fs::{NormalizedPath, WorkspaceLayout};
use crossref_git::GitCache;
use crossref_meta::{ConfigLoader, Loaded, Schema};

use crate::error::{CliError, Result};

const SCHEMA_ENV: &str = "GITCROSSREF_SCHEMA";
const CACHE_APP_DIR: &str = "git-crossref";

/// Locations resolved for one invocation.
#[derive(Debug, Clone)]
pub struct Context {
    pub layout: WorkspaceLayout,
    pub config_path: NormalizedPath,
    pub cache_dir: PathBuf,
}

impl Context {
    /// Resolve the context for `cwd`, honoring explicit overrides.
    pub fn discover(cwd: &Path, config: Option<&Path>, cache_dir: Option<&Path>) -> Result<Self> {
        let layout = WorkspaceLayout::discover(cwd)?;

        let config_path = match config {
            Some(path) => NormalizedPath::new(cwd.join(path)),
            None => layout.config_path(),
        };

        let cache_dir = match cache_dir {
            Some(dir) => cwd.join(dir),
            None => default_cache_dir(&layout),
        };

        tracing::debug!(
            root = %layout.root,
            config = %config_path,
            cache = %cache_dir.display(),
            "Resolved context"
        );
        Ok(Self {
            layout,
            config_path,
            cache_dir,
        })
    }

    /// Schema used for validation.
    ///
    /// `GITCROSSREF_SCHEMA` wins, then a schema file at the root, then the
    /// embedded copy.
    pub fn schema(&self) -> Schema {
        match std::env::var_os(SCHEMA_ENV) {
            Some(path) => Schema::load(Path::new(&path)),
            None => Schema::load(&self.layout.schema_path().to_native()),
        }
    }

    /// Load and validate the configuration.
    pub fn load(&self) -> Result<Loaded> {
        ConfigLoader::new(self.schema())
            .load(&self.config_path)
            .map_err(|e| match e {
                crossref_meta::Error::ConfigNotFound { path } => CliError::user(format!(
                    "Configuration file not found: {}\nRun 'git-crossref init' to create a configuration file.",
                    path.display()
                )),
                other => other.into(),
            })
    }

    pub fn cache(&self) -> Arc<GitCache> {
        Arc::new(GitCache::new(&self.cache_dir))
    }

    /// Build an engine over `loaded` that persists hashes into its document.
    pub fn engine(&self, loaded: Loaded, jobs: usize, timeout: Option<u64>) -> SyncEngine {
        let options = EngineOptions {
            jobs,
            remote_timeout: timeout.map(Duration::from_secs),
            ..EngineOptions::default()
        };
        SyncEngine::new(self.layout.root.clone(), loaded.configuration, self.cache())
            .with_document(loaded.document)
            .with_options(options)
    }
}

/// `.git/crossref-cache` inside the working tree, or a per-tree directory
/// under the user cache directory when the root has no `.git` directory.
fn default_cache_dir(layout: &WorkspaceLayout) -> PathBuf {
    if let Some(dir) = layout.default_cache_dir() {
        return dir.to_native();
    }
    let tree = layout.root.file_name().unwrap_or("default").to_string();
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(CACHE_APP_DIR)
        .join(tree)
}
