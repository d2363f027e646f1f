//! Error types for crossref-core

use std::path::PathBuf;

/// Result type for crossref-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in crossref-core operations
///
/// Per-remote and per-file problems are recorded in the
/// [`SyncReport`](crate::SyncReport) instead of being returned.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Writing a destination file failed
    #[error("Failed to write {path}: {source}")]
    DestinationWrite {
        path: PathBuf,
        #[source]
        source: crossref_fs::Error,
    },

    /// A remote filter named a remote the configuration does not declare
    #[error("Remote '{name}' not found in configuration")]
    UnknownRemote { name: String },

    /// The worker runtime failed
    #[error("Worker error: {message}")]
    Worker { message: String },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from crossref-fs
    #[error(transparent)]
    Fs(#[from] crossref_fs::Error),

    /// Remote cache error from crossref-git
    #[error(transparent)]
    Git(#[from] crossref_git::Error),

    /// Configuration error from crossref-meta
    #[error(transparent)]
    Meta(#[from] crossref_meta::Error),
}
