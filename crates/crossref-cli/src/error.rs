//! Error types for crossref-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from crossref-core
    #[error(transparent)]
    Core(#[from] crossref_core::Error),

    /// Error from crossref-meta
    #[error(transparent)]
    Meta(#[from] crossref_meta::Error),

    /// Error from crossref-git
    #[error(transparent)]
    Git(#[from] crossref_git::Error),

    /// Error from crossref-fs
    #[error(transparent)]
    Fs(#[from] crossref_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON output error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}
