//! Sync planner and orchestrator for git-crossref
//!
//! The [`planner`] decides per file what a sync must do; the
//! [`SyncEngine`] drives it across every remote and records the new
//! hashes.

pub mod engine;
pub mod error;
pub mod fanout;
pub mod ledger;
pub mod planner;
pub mod report;

pub use engine::{EngineOptions, SyncEngine};
pub use error::{Error, Result};
pub use ledger::HashLedger;
pub use planner::{Outcome, PlanInput, decide};
pub use report::{FailureKind, FileResult, RemoteFailure, ResolvedRemote, RunMode, SyncReport, SyncResult};
