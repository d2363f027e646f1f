//! Structural schema for configuration documents
//!
//! The schema is a JSON Schema document. Only the keywords the
//! configuration format needs are interpreted: `type`, `required`,
//! `properties`, `additionalProperties`, `propertyNames`, `items`,
//! `minLength` and `pattern`. Unknown keywords are ignored.

use std::path::{Path, PathBuf};

use regex::Regex;
use serde_json::{Map, Value};

use crate::Violation;

/// Schema compiled into the binary, used when no schema file is available.
pub const EMBEDDED_SCHEMA: &str = include_str!("../schema/gitcrossref-schema.json");

/// Where a schema was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    Embedded,
    File(PathBuf),
}

impl std::fmt::Display for SchemaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Embedded => write!(f, "embedded schema"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Schema {
    root: Value,
    source: SchemaSource,
}

impl Schema {
    pub fn embedded() -> Self {
        let root = serde_json::from_str(EMBEDDED_SCHEMA).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Embedded schema is not valid JSON");
            Value::Object(Map::new())
        });
        Self {
            root,
            source: SchemaSource::Embedded,
        }
    }

    pub fn from_value(root: Value, source: SchemaSource) -> Self {
        Self { root, source }
    }

    /// Load the schema at `path`, falling back to the embedded schema when
    /// the file is missing or is not valid JSON.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Schema file unavailable, using embedded schema");
                return Self::embedded();
            }
        };

        match serde_json::from_str(&content) {
            Ok(root) => Self::from_value(root, SchemaSource::File(path.to_path_buf())),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Invalid schema file, using embedded schema");
                Self::embedded()
            }
        }
    }

    pub fn source(&self) -> &SchemaSource {
        &self.source
    }

    pub fn as_value(&self) -> &Value {
        &self.root
    }

    /// Check `instance` against the schema and collect every violation.
    pub fn validate(&self, instance: &Value) -> Vec<Violation> {
        let mut violations = Vec::new();
        check(&self.root, instance, "", &mut violations);
        violations
    }
}

fn check(schema: &Value, instance: &Value, path: &str, out: &mut Vec<Violation>) {
    let schema = match schema {
        Value::Object(schema) => schema,
        Value::Bool(false) => {
            out.push(Violation::new(path, "nothing", type_name(instance), "value is not allowed here"));
            return;
        }
        _ => return,
    };

    if let Some(expected) = schema.get("type")
        && !type_matches(expected, instance)
    {
        out.push(Violation::new(
            path,
            describe_type(expected),
            type_name(instance),
            "wrong type",
        ));
        return;
    }

    if let Some(text) = instance.as_str() {
        check_string(schema, text, path, out);
    }

    if let Some(object) = instance.as_object() {
        check_object(schema, object, path, out);
    }

    if let (Some(items), Some(array)) = (schema.get("items"), instance.as_array()) {
        for (index, item) in array.iter().enumerate() {
            check(items, item, &format!("{path}[{index}]"), out);
        }
    }
}

fn check_string(schema: &Map<String, Value>, text: &str, path: &str, out: &mut Vec<Violation>) {
    if let Some(min) = schema.get("minLength").and_then(Value::as_u64)
        && (text.chars().count() as u64) < min
    {
        out.push(Violation::new(
            path,
            format!("at least {min} characters"),
            format!("{} characters", text.chars().count()),
            "value is too short",
        ));
    }

    if let Some(pattern) = schema.get("pattern").and_then(Value::as_str) {
        match Regex::new(pattern) {
            Ok(re) if !re.is_match(text) => out.push(Violation::new(
                path,
                format!("match for {pattern}"),
                format!("'{text}'"),
                "value does not match the required pattern",
            )),
            Ok(_) => {}
            Err(e) => tracing::warn!(pattern, error = %e, "Ignoring invalid schema pattern"),
        }
    }
}

fn check_object(schema: &Map<String, Value>, object: &Map<String, Value>, path: &str, out: &mut Vec<Violation>) {
    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for name in required.iter().filter_map(Value::as_str) {
            if !object.contains_key(name) {
                out.push(Violation::new(
                    join(path, name),
                    "present",
                    "missing",
                    "required field is missing",
                ));
            }
        }
    }

    let properties = schema.get("properties").and_then(Value::as_object);
    for (key, value) in object {
        let child = join(path, key);

        if let Some(names) = schema.get("propertyNames") {
            check(names, &Value::String(key.clone()), &child, out);
        }

        match properties.and_then(|p| p.get(key)) {
            Some(sub) => check(sub, value, &child, out),
            None => match schema.get("additionalProperties") {
                Some(Value::Bool(false)) => out.push(Violation::new(
                    child,
                    "no such field",
                    format!("'{key}'"),
                    "unknown field",
                )),
                Some(sub @ Value::Object(_)) => check(sub, value, &child, out),
                _ => {}
            },
        }
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn type_matches(expected: &Value, instance: &Value) -> bool {
    match expected {
        Value::String(name) => is_type(name, instance),
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .any(|name| is_type(name, instance)),
        _ => true,
    }
}

fn is_type(name: &str, instance: &Value) -> bool {
    match name {
        "object" => instance.is_object(),
        "array" => instance.is_array(),
        "string" => instance.is_string(),
        "boolean" => instance.is_boolean(),
        "null" => instance.is_null(),
        "number" => instance.is_number(),
        "integer" => instance.is_i64() || instance.is_u64(),
        _ => true,
    }
}

fn describe_type(expected: &Value) -> String {
    match expected {
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" or "),
        Value::String(name) => name.clone(),
        other => other.to_string(),
    }
}

fn type_name(instance: &Value) -> &'static str {
    match instance {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn embedded_schema_parses() {
        let schema = Schema::embedded();
        assert_eq!(schema.as_value()["type"], "object");
        assert_eq!(schema.source(), &SchemaSource::Embedded);
    }

    #[test]
    fn nested_paths_name_the_offending_field() {
        let schema = Schema::embedded();
        let violations = schema.validate(&json!({
            "remotes": { "origin": { "version": "main" } },
            "files": { "origin": [ { "source": "a", "destination": 5 } ] }
        }));

        let paths: Vec<_> = violations.iter().map(|v| v.path.as_str()).collect();
        assert!(paths.contains(&"remotes.origin.url"), "{paths:?}");
        assert!(paths.contains(&"files.origin[0].destination"), "{paths:?}");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let schema = Schema::embedded();
        let violations = schema.validate(&json!({
            "remotes": { "origin": { "url": "u", "branch": "main" } },
            "files": {}
        }));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "remotes.origin.branch");
    }
}
