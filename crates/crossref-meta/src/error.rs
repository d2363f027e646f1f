//! Error types for crossref-meta

use std::path::PathBuf;

use crate::ValidationError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Filesystem error: {0}")]
    Fs(#[from] crossref_fs::Error),

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid configuration at {path}: {message}")]
    InvalidDocument { path: PathBuf, message: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Remote '{name}' not found in configuration")]
    RemoteNotFound { name: String },

    #[error("No file entry {index} under remote '{remote}'")]
    EntryNotFound { remote: String, index: usize },
}
