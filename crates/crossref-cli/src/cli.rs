//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// git-crossref - Sync files from external git repositories
///
/// Tracked files are declared in a .gitcrossref file at the root of the
/// working tree. Each sync records a hash per file so local edits are
/// detected instead of silently overwritten.
#[derive(Parser, Debug)]
#[command(name = "git-crossref")]
#[command(author, version, about)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to .gitcrossref at the working tree root)
    #[arg(long, global = true, env = "GITCROSSREF_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding cached clones of the remotes
    #[arg(long, global = true, env = "GITCROSSREF_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Sync tracked files from their remotes
    ///
    /// Examples:
    ///   git-crossref sync                      # Sync everything
    ///   git-crossref sync third_party/LICENSE  # Sync one destination
    ///   git-crossref sync --remote upstream    # Sync one remote
    ///   git-crossref sync --force              # Overwrite local changes
    Sync {
        /// Destinations to sync (all when omitted)
        files: Vec<String>,

        /// Overwrite destinations that changed locally
        #[arg(short, long)]
        force: bool,

        /// Only sync entries of this remote
        #[arg(short, long, conflicts_with = "files")]
        remote: Option<String>,

        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,

        /// Number of remotes processed in parallel
        #[arg(short, long, default_value_t = 1)]
        jobs: usize,

        /// Give up on a remote after this many seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Report drift and pending updates without writing
    Check {
        /// Only check entries of this remote
        #[arg(short, long)]
        remote: Option<String>,

        /// Number of remotes processed in parallel
        #[arg(short, long, default_value_t = 1)]
        jobs: usize,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Clone or update cached remotes without syncing files
    Clone {
        /// Only clone this remote
        #[arg(short, long)]
        remote: Option<String>,
    },

    /// Remove cached remote clones
    Clean {
        /// Only remove clones of remotes no longer in the configuration
        #[arg(long)]
        stale: bool,
    },

    /// Validate the configuration file
    Validate,

    /// Create a starter configuration file
    Init {
        /// Clone the configured remotes afterwards
        #[arg(long)]
        clone: bool,
    },
}
