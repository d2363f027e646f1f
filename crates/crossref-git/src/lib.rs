//! Remote repository cache for git-crossref
//!
//! Materializes one local view per configured remote, resolves version
//! references and exposes byte-level reads at the resolved commit.

pub mod cache;
pub mod commits;
pub mod error;
pub mod memory;
pub mod provider;
pub mod resolve;
pub mod tree;

pub use cache::GitCache;
pub use commits::CommitInfo;
pub use error::{Error, Result};
pub use memory::MemoryCache;
pub use provider::{Materialization, RemoteCache, RemoteTarget};
