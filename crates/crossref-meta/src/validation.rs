//! Configuration validation
//!
//! Runs in three passes: the structural schema check, then path,
//! referential and uniqueness checks over the typed model. No two entries
//! may share a destination or nest one inside the other. Each pass
//! collects every problem it finds. A document that fails the structural
//! pass is not inspected further.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use crate::{Configuration, Schema};

/// One validation problem, located by a dotted field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Offending field, e.g. `files.origin[0].destination`
    pub path: String,
    pub expected: String,
    pub actual: String,
    pub message: String,
}

impl Violation {
    pub fn new(
        path: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            expected: expected.into(),
            actual: actual.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "<document>" } else { &self.path };
        write!(
            f,
            "{}: {} (expected {}, got {})",
            path, self.message, self.expected, self.actual
        )
    }
}

/// A document that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration validation failed")?;
        for violation in &self.violations {
            write!(f, "\n  - {violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Validate a raw document and build the typed configuration.
pub fn validate(document: &Value, schema: &Schema) -> Result<Configuration, ValidationError> {
    let violations = schema.validate(document);
    if !violations.is_empty() {
        return Err(ValidationError { violations });
    }

    let configuration: Configuration = serde_json::from_value(document.clone())
        .map_err(|e| ValidationError {
            violations: vec![Violation::new("", "a configuration document", "an incompatible structure", e.to_string())],
        })?;
    let configuration = configuration.with_names();

    let mut violations = Vec::new();
    check_paths(&configuration, &mut violations);
    check_references(&configuration, &mut violations);
    check_unique_destinations(&configuration, &mut violations);

    if violations.is_empty() {
        Ok(configuration)
    } else {
        Err(ValidationError { violations })
    }
}

fn check_paths(configuration: &Configuration, out: &mut Vec<Violation>) {
    for (name, remote) in &configuration.remotes {
        if let Some(base) = &remote.base_path
            && is_absolute(base)
        {
            out.push(Violation::new(
                format!("remotes.{name}.base_path"),
                "a relative path",
                format!("'{base}'"),
                "base path must be relative to the repository root",
            ));
        }
    }

    for (remote, entries) in &configuration.files {
        for (index, entry) in entries.iter().enumerate() {
            if entry.destination_key().is_none() {
                out.push(Violation::new(
                    format!("files.{remote}[{index}].destination"),
                    "a relative path inside the working tree",
                    format!("'{}'", entry.destination),
                    "destination must stay inside the working tree",
                ));
            }
        }
    }
}

fn check_references(configuration: &Configuration, out: &mut Vec<Violation>) {
    for remote in configuration.files.keys() {
        if !configuration.remotes.contains_key(remote) {
            out.push(Violation::new(
                format!("files.{remote}"),
                "a remote declared under remotes",
                format!("'{remote}'"),
                "files reference an undeclared remote",
            ));
        }
    }
}

fn check_unique_destinations(configuration: &Configuration, out: &mut Vec<Violation>) {
    let mut seen: HashMap<String, String> = HashMap::new();
    let mut claimed: Vec<(String, String)> = Vec::new();
    for (remote, entries) in &configuration.files {
        for (index, entry) in entries.iter().enumerate() {
            let Some(key) = entry.destination_key() else {
                continue;
            };
            let here = format!("files.{remote}[{index}].destination");
            if let Some(first) = seen.get(&key) {
                out.push(Violation::new(
                    here,
                    "a destination used by no other entry",
                    format!("'{}' (also used by {first})", entry.destination),
                    "duplicate destination",
                ));
                continue;
            }
            seen.insert(key.clone(), here.clone());
            claimed.push((key, here));
        }
    }

    // A destination inside another one would have two entries writing the same files
    for (key, here) in &claimed {
        for (outer, owner) in &claimed {
            if is_nested(key, outer) {
                out.push(Violation::new(
                    here.clone(),
                    "a destination outside every other entry's destination",
                    format!("'{key}' (inside '{outer}' of {owner})"),
                    "overlapping destination",
                ));
            }
        }
    }
}

/// Whether `inner` lies strictly below `outer`. Both are normalized keys.
fn is_nested(inner: &str, outer: &str) -> bool {
    inner
        .strip_prefix(outer)
        .is_some_and(|rest| rest.starts_with('/'))
}

fn is_absolute(path: &str) -> bool {
    let bytes = path.as_bytes();
    path.starts_with('/')
        || path.starts_with('\\')
        || (bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':')
}
