//! The raw configuration document and hash write-back
//!
//! Updated hashes are written into the untyped document rather than
//! re-serializing the typed model, so unrelated fields and key order
//! survive a sync.

use crossref_fs::{ConfigStore, NormalizedPath};
use serde_yaml::{Mapping, Value};

use crate::{Error, RecordedHash, Result};

const HASH_KEY: &str = "hash";

/// A loaded configuration document, editable in place.
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    path: NormalizedPath,
    value: Value,
    dirty: bool,
}

impl ConfigDocument {
    pub fn new(path: NormalizedPath, value: Value) -> Self {
        Self {
            path,
            value,
            dirty: false,
        }
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Whether any hash changed since loading or the last save.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The document as JSON, for schema validation.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        serde_json::to_value(&self.value).map_err(|e| Error::InvalidDocument {
            path: self.path.to_native(),
            message: e.to_string(),
        })
    }

    /// Recorded hash of entry `index` under `remote`.
    pub fn hash(&self, remote: &str, index: usize) -> Option<RecordedHash> {
        let value = self.value.get("files")?.get(remote)?.get(index)?.get(HASH_KEY)?;
        serde_yaml::from_value(value.clone()).ok()
    }

    /// Record `hash` on entry `index` under `remote`.
    ///
    /// Returns whether the stored value changed.
    pub fn set_hash(&mut self, remote: &str, index: usize, hash: &RecordedHash) -> Result<bool> {
        let path = self.path.to_native();
        let value = serde_yaml::to_value(hash).map_err(|e| Error::InvalidDocument {
            path,
            message: e.to_string(),
        })?;
        let entry = self
            .entry_mut(remote, index)
            .ok_or_else(|| Error::EntryNotFound {
                remote: remote.to_string(),
                index,
            })?;

        if entry.get(HASH_KEY) == Some(&value) {
            return Ok(false);
        }
        entry.insert(Value::String(HASH_KEY.to_string()), value);
        self.dirty = true;
        Ok(true)
    }

    fn entry_mut(&mut self, remote: &str, index: usize) -> Option<&mut Mapping> {
        self.value
            .get_mut("files")?
            .get_mut(remote)?
            .get_mut(index)?
            .as_mapping_mut()
    }

    /// Write the document back to its path atomically.
    pub fn save(&mut self, store: &ConfigStore) -> Result<()> {
        store.save(&self.path, &self.value)?;
        self.dirty = false;
        tracing::debug!(path = %self.path, "Saved configuration");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOC: &str = "\
remotes:
  origin:
    url: https://example/repo.git
files:
  origin:
    - source: a.txt
      destination: out/a.txt
      ignore_changes: false
    - source: b.txt
      destination: out/b.txt
      hash: sha256:old
";

    fn document() -> ConfigDocument {
        ConfigDocument::new(NormalizedPath::new("/tmp/.gitcrossref"), serde_yaml::from_str(DOC).unwrap())
    }

    #[test]
    fn set_hash_appends_key_and_keeps_order() {
        let mut doc = document();
        assert!(doc.set_hash("origin", 0, &"sha256:new".into()).unwrap());

        let rendered = serde_yaml::to_string(doc.value()).unwrap();
        let source = rendered.find("source: a.txt").unwrap();
        let ignore = rendered.find("ignore_changes").unwrap();
        let hash = rendered.find("sha256:new").unwrap();
        assert!(source < ignore && ignore < hash, "{rendered}");
        assert!(doc.is_dirty());
    }

    #[test]
    fn set_hash_replaces_existing_value() {
        let mut doc = document();
        assert!(doc.set_hash("origin", 1, &"sha256:new".into()).unwrap());
        assert_eq!(doc.hash("origin", 1), Some(RecordedHash::from("sha256:new")));
        assert!(!doc.set_hash("origin", 1, &"sha256:new".into()).unwrap());
    }

    #[test]
    fn set_hash_writes_directory_mapping() {
        let mut doc = document();
        let tree = RecordedHash::Tree(
            [("one.rs".to_string(), "sha256:01".to_string())]
                .into_iter()
                .collect(),
        );
        assert!(doc.set_hash("origin", 1, &tree).unwrap());
        assert_eq!(doc.value()["files"]["origin"][1]["hash"]["one.rs"].as_str(), Some("sha256:01"));
        assert_eq!(doc.hash("origin", 1), Some(tree.clone()));
        assert!(!doc.set_hash("origin", 1, &tree).unwrap());
    }

    #[test]
    fn set_hash_on_missing_entry_fails() {
        let mut doc = document();
        assert!(matches!(
            doc.set_hash("origin", 7, &"sha256:x".into()),
            Err(Error::EntryNotFound { index: 7, .. })
        ));
        assert!(matches!(
            doc.set_hash("other", 0, &"sha256:x".into()),
            Err(Error::EntryNotFound { .. })
        ));
        assert!(!doc.is_dirty());
    }
}
