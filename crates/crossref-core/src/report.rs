//! Results of a sync, check or clone run

use crossref_meta::RecordedHash;
use serde::{Deserialize, Serialize};

use crate::planner::Outcome;

/// What kind of run produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunMode {
    /// Planned writes were carried out
    Sync,
    /// Planned writes were only reported
    Check,
    /// Remotes were resolved, no entries processed
    Clone,
}

/// Outcome for one file inside a directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileResult {
    /// Path relative to the directory
    pub relative: String,
    pub outcome: Outcome,
    pub source_hash: String,
    pub destination_hash: Option<String>,
    pub error: Option<String>,
}

/// Outcome for one file entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub remote: String,
    /// Position of the entry under its remote
    pub index: usize,
    pub source: String,
    pub destination: String,
    /// `None` when the entry failed before a decision could be made
    pub outcome: Option<Outcome>,
    /// Hash recorded before this run
    pub previous_hash: Option<RecordedHash>,
    /// Hash recorded (or, in check mode, that would be recorded)
    pub new_hash: Option<RecordedHash>,
    /// Whether the destination was written in this run
    pub written: bool,
    /// Human-readable action summary
    pub summary: String,
    pub error: Option<String>,
    /// Per-file detail for directory entries
    pub files: Vec<FileResult>,
}

impl SyncResult {
    /// Whether this entry makes the run unsuccessful.
    pub fn is_failure(&self) -> bool {
        self.error.is_some() || self.outcome.is_none_or(Outcome::is_failure)
    }

    /// Hash to persist, if this entry may update the ledger.
    ///
    /// A directory record already leaves out files that conflicted or
    /// failed, so it is persisted whenever the source was found.
    pub fn ledger_hash(&self) -> Option<&RecordedHash> {
        let outcome = self.outcome?;
        let hash = self.new_hash.as_ref()?;
        let eligible = match hash {
            RecordedHash::Tree(_) => outcome != Outcome::SourceMissing,
            RecordedHash::File(_) => outcome.records_hash() && self.error.is_none(),
        };
        eligible.then_some(hash)
    }
}

/// Why a remote could not be processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// The configured version did not resolve
    VersionNotFound,
    /// The remote could not be reached or timed out
    Unavailable,
    /// Anything else, such as an unusable cache slot
    Other,
}

/// A remote whose entries were not processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFailure {
    pub remote: String,
    pub kind: FailureKind,
    pub message: String,
    /// Number of entries left unprocessed
    pub skipped: usize,
}

impl RemoteFailure {
    pub fn from_error(remote: &str, error: &crossref_git::Error, skipped: usize) -> Self {
        let kind = match error {
            crossref_git::Error::VersionNotFound { .. } => FailureKind::VersionNotFound,
            crossref_git::Error::RemoteUnavailable { .. } => FailureKind::Unavailable,
            _ => FailureKind::Other,
        };
        Self {
            remote: remote.to_string(),
            kind,
            message: error.to_string(),
            skipped,
        }
    }
}

/// A remote that resolved successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRemote {
    pub remote: String,
    pub commit: String,
    pub description: String,
}

/// Aggregated report of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub mode: RunMode,
    /// One result per processed entry, by remote name then entry order
    pub results: Vec<SyncResult>,
    pub failures: Vec<RemoteFailure>,
    pub resolved: Vec<ResolvedRemote>,
    /// Requested destinations that matched no entry
    pub unmatched: Vec<String>,
}

impl SyncReport {
    pub fn new(mode: RunMode) -> Self {
        Self {
            mode,
            results: Vec::new(),
            failures: Vec::new(),
            resolved: Vec::new(),
            unmatched: Vec::new(),
        }
    }

    /// True when nothing conflicted, went missing or failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
            && self.unmatched.is_empty()
            && self.results.iter().all(|result| !result.is_failure())
    }

    /// Number of entries that ended in `outcome`.
    pub fn count(&self, outcome: Outcome) -> usize {
        self.results
            .iter()
            .filter(|result| result.outcome == Some(outcome))
            .count()
    }

    /// Number of entries that hit an error.
    pub fn error_count(&self) -> usize {
        self.results.iter().filter(|result| result.error.is_some()).count()
    }

    /// The result for `destination`, if it was processed.
    pub fn result_for(&self, destination: &str) -> Option<&SyncResult> {
        self.results.iter().find(|result| result.destination == destination)
    }
}
