//! Format-agnostic document loading and saving

use crate::{Error, NormalizedPath, Result, io};
use serde::{Serialize, de::DeserializeOwned};

/// Serialization format of a document on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
    Toml,
}

impl DocumentFormat {
    /// Detect the format from a path's extension.
    ///
    /// Paths without an extension (such as `.gitcrossref`) are YAML.
    pub fn detect(path: &NormalizedPath) -> Result<Self> {
        match path.extension().map(str::to_lowercase).as_deref() {
            None | Some("yaml") | Some("yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            Some(other) => Err(Error::UnsupportedFormat {
                extension: other.to_string(),
            }),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Yaml => "YAML",
            Self::Json => "JSON",
            Self::Toml => "TOML",
        }
    }
}

/// Format-agnostic document store.
///
/// Detects the format from the file extension and handles
/// serialization/deserialization transparently.
#[derive(Debug, Default)]
pub struct ConfigStore {
    robustness: io::RobustnessConfig,
}

impl ConfigStore {
    /// Create a new ConfigStore with default robustness settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new ConfigStore with custom robustness settings.
    pub fn with_robustness(robustness: io::RobustnessConfig) -> Self {
        Self { robustness }
    }

    /// Load a document from a file.
    pub fn load<T: DeserializeOwned>(&self, path: &NormalizedPath) -> Result<T> {
        let format = DocumentFormat::detect(path)?;
        let content = io::read_text(path)?;
        self.parse(path, format, &content)
    }

    /// Parse document content as if it had been read from `path`.
    pub fn parse<T: DeserializeOwned>(
        &self,
        path: &NormalizedPath,
        format: DocumentFormat,
        content: &str,
    ) -> Result<T> {
        let parsed = match format {
            DocumentFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            DocumentFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            DocumentFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        };

        parsed.map_err(|message| Error::ConfigParse {
            path: path.to_native(),
            format: format.label().into(),
            message,
        })
    }

    /// Save a document to a file.
    ///
    /// Format is determined from the file extension.
    /// Uses atomic write to prevent corruption.
    pub fn save<T: Serialize>(&self, path: &NormalizedPath, value: &T) -> Result<()> {
        let format = DocumentFormat::detect(path)?;

        let content = match format {
            DocumentFormat::Yaml => serde_yaml::to_string(value).map_err(|e| e.to_string()),
            DocumentFormat::Json => serde_json::to_string_pretty(value).map_err(|e| e.to_string()),
            DocumentFormat::Toml => toml::to_string_pretty(value).map_err(|e| e.to_string()),
        }
        .map_err(|message| Error::ConfigSerialize {
            path: path.to_native(),
            format: format.label().into(),
            message,
        })?;

        io::write_atomic(path, content.as_bytes(), self.robustness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensionless_dotfile_is_yaml() {
        let path = NormalizedPath::new("/repo/.gitcrossref");
        assert_eq!(DocumentFormat::detect(&path).unwrap(), DocumentFormat::Yaml);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let path = NormalizedPath::new("/repo/config.ini");
        assert!(matches!(
            DocumentFormat::detect(&path),
            Err(Error::UnsupportedFormat { .. })
        ));
    }
}
