//! Configuration model and validation for git-crossref
//!
//! Turns a `.gitcrossref` document into a validated [`Configuration`] or
//! fails with diagnostics, and writes updated hashes back into the
//! document.

pub mod document;
pub mod error;
pub mod loader;
pub mod model;
pub mod schema;
pub mod template;
pub mod validation;

pub use document::ConfigDocument;
pub use error::{Error, Result};
pub use loader::{ConfigLoader, Loaded};
pub use model::{Configuration, FileEntry, RecordedHash, RemoteSpec};
pub use schema::{Schema, SchemaSource};
pub use validation::{ValidationError, Violation, validate};
