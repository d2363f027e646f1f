//! Filesystem primitives for git-crossref
//!
//! Provides normalized path handling, atomic writes, advisory locks,
//! content checksums and format-agnostic document loading.

pub mod checksum;
pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod layout;
pub mod lock;
pub mod path;

pub use checksum::compute_checksum;
pub use config::ConfigStore;
pub use constants::CrossrefPath;
pub use error::{Error, Result};
pub use io::RobustnessConfig;
pub use layout::WorkspaceLayout;
pub use lock::FileLock;
pub use path::{NormalizedPath, normalize_relative, validate_path_identifier};
