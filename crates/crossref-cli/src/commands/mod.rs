//! Command implementations for crossref-cli
//!
//! Each command returns whether it succeeded; the binary turns `false`
//! into exit code 1.

pub mod config;
pub mod remote;
pub mod sync;

pub use config::{run_init, run_validate};
pub use remote::{run_clean, run_clone};
pub use sync::{SyncArgs, run_check, run_sync};
