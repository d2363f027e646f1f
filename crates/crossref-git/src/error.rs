//! Error types for crossref-git

/// Result type for crossref-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in crossref-git operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Remote '{name}' is unavailable ({url}): {message}")]
    RemoteUnavailable {
        name: String,
        url: String,
        message: String,
    },

    #[error("Version '{version}' not found in remote '{name}'")]
    VersionNotFound { name: String, version: String },

    #[error("Source '{path}' not found in remote '{name}' at {version}")]
    SourceNotFound {
        name: String,
        path: String,
        version: String,
    },

    #[error("Cache slot for '{name}' is corrupt: {message}")]
    CorruptSlot { name: String, message: String },

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Filesystem error: {0}")]
    Fs(#[from] crossref_fs::Error),
}

impl Error {
    /// Whether the error means the remote could not be reached.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::RemoteUnavailable { .. })
    }
}
