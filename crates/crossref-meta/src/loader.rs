//! Configuration loading

use crossref_fs::{ConfigStore, NormalizedPath};

use crate::{ConfigDocument, Configuration, Error, Result, Schema, validation};

/// A validated configuration together with its editable document.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub configuration: Configuration,
    pub document: ConfigDocument,
}

/// Reads configuration documents and validates them against a schema.
#[derive(Debug)]
pub struct ConfigLoader {
    store: ConfigStore,
    schema: Schema,
}

impl ConfigLoader {
    pub fn new(schema: Schema) -> Self {
        Self {
            store: ConfigStore::new(),
            schema,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Read the raw document without validating it.
    pub fn read(&self, path: &NormalizedPath) -> Result<ConfigDocument> {
        match self.store.load::<serde_yaml::Value>(path) {
            Ok(value) => Ok(ConfigDocument::new(path.clone(), value)),
            Err(e) if e.is_not_found() => Err(Error::ConfigNotFound {
                path: path.to_native(),
            }),
            Err(crossref_fs::Error::ConfigParse { message, .. }) => Err(Error::InvalidDocument {
                path: path.to_native(),
                message,
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Read and validate the document at `path`.
    pub fn load(&self, path: &NormalizedPath) -> Result<Loaded> {
        let document = self.read(path)?;
        let configuration = validation::validate(&document.to_json()?, &self.schema)?;
        tracing::debug!(
            path = %path,
            remotes = configuration.remotes.len(),
            entries = configuration.entry_count(),
            "Loaded configuration"
        );
        Ok(Loaded {
            configuration,
            document,
        })
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(Schema::embedded())
    }
}
