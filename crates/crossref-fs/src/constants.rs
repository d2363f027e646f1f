//! Well-known file and directory names.

use std::path::Path;

/// Standard git-crossref filesystem markers and paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossrefPath {
    /// The configuration document at the working tree root
    ConfigFile,
    /// The on-disk schema document
    SchemaFile,
    /// The `.git` directory (working tree marker)
    GitDir,
    /// Directory holding one cache slot per remote
    CacheDir,
}

impl CrossrefPath {
    /// Get the string representation of the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigFile => ".gitcrossref",
            Self::SchemaFile => "gitcrossref-schema.json",
            Self::GitDir => ".git",
            Self::CacheDir => "crossref-cache",
        }
    }
}

impl AsRef<Path> for CrossrefPath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for CrossrefPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for CrossrefPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
