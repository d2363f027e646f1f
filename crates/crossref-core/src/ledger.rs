//! Persistence of recorded hashes
//!
//! The ledger is the set of `hash` fields in the configuration document.
//! Updates are staged in memory and written back in one atomic save.

use crossref_fs::{ConfigStore, RobustnessConfig};
use crossref_meta::{ConfigDocument, RecordedHash};

use crate::Result;

/// Recorded hashes backed by a configuration document.
#[derive(Debug)]
pub struct HashLedger {
    document: ConfigDocument,
    store: ConfigStore,
}

impl HashLedger {
    pub fn new(document: ConfigDocument) -> Self {
        Self {
            document,
            store: ConfigStore::new(),
        }
    }

    /// Use `robustness` for the atomic save.
    pub fn with_robustness(mut self, robustness: RobustnessConfig) -> Self {
        self.store = ConfigStore::with_robustness(robustness);
        self
    }

    pub fn document(&self) -> &ConfigDocument {
        &self.document
    }

    /// Recorded hash of entry `index` under `remote`.
    pub fn recorded(&self, remote: &str, index: usize) -> Option<RecordedHash> {
        self.document.hash(remote, index)
    }

    /// Stage `hash` for entry `index` under `remote`.
    ///
    /// Returns whether the recorded value changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the document has no such entry.
    pub fn record(&mut self, remote: &str, index: usize, hash: &RecordedHash) -> Result<bool> {
        let changed = self.document.set_hash(remote, index, hash)?;
        if changed {
            tracing::debug!(remote, index, hash = %hash, "Recorded hash");
        }
        Ok(changed)
    }

    /// Save staged changes. Does nothing when nothing changed.
    ///
    /// Returns whether the document was written.
    pub fn commit(&mut self) -> Result<bool> {
        if !self.document.is_dirty() {
            return Ok(false);
        }
        self.document.save(&self.store)?;
        Ok(true)
    }

    pub fn into_document(self) -> ConfigDocument {
        self.document
    }
}
