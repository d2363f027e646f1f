//! Shared test utilities for the git-crossref workspace.
//!
//! This crate provides standardised test fixtures to eliminate duplication
//! across crate test suites. It is a dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`git`]: upstream repositories built with the `git` CLI
//! - [`worktree`]: [`WorkTree`] builder for a working tree with a `.gitcrossref`

pub mod git;
pub mod worktree;

pub use git::UpstreamRepo;
pub use worktree::WorkTree;
