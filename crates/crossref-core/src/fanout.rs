//! Directory entries fan out into one planner decision per contained file.
//!
//! The ledger records a checksum per contained file, so each file is
//! planned against its own history. A file with no record yet (added
//! upstream, or a record written before the directory was tracked) is
//! treated as recorded when its destination already equals the source.

use std::collections::BTreeMap;

use crossref_meta::RecordedHash;

use crate::planner::{Outcome, PlanInput, decide};

/// One file inside a directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanoutFile {
    /// Path relative to the directory
    pub relative: String,
    /// Hash of the source file
    pub source: String,
    /// Hash of the destination file, `None` if missing
    pub destination: Option<String>,
}

/// Recorded hash to use for each file, in input order.
pub fn expected_hashes(recorded: Option<&RecordedHash>, files: &[FanoutFile]) -> Vec<Option<String>> {
    files
        .iter()
        .map(|file| {
            match recorded.and_then(|recorded| recorded.tree_file(&file.relative)) {
                Some(hash) => Some(hash.to_string()),
                None if file.destination.as_deref() == Some(file.source.as_str()) => file.destination.clone(),
                None => None,
            }
        })
        .collect()
}

/// Plan every file of a directory entry.
pub fn plan(recorded: Option<&RecordedHash>, files: &[FanoutFile], ignore_changes: bool, force: bool) -> Vec<Outcome> {
    let expected = expected_hashes(recorded, files);
    files
        .iter()
        .zip(&expected)
        .map(|(file, expected)| {
            decide(PlanInput {
                source: Some(&file.source),
                destination: file.destination.as_deref(),
                expected: expected.as_deref(),
                ignore_changes,
                force,
            })
        })
        .collect()
}

/// Most severe outcome among `outcomes`; `InSync` when empty.
pub fn aggregate(outcomes: impl IntoIterator<Item = Outcome>) -> Outcome {
    outcomes
        .into_iter()
        .max_by_key(|outcome| outcome.severity())
        .unwrap_or(Outcome::InSync)
}

/// Record to keep for a directory after planning `files` with `outcomes`.
///
/// Files whose outcome records a hash and that were not marked `failed`
/// take their source hash; the others keep their previous record. Files
/// no longer listed at the source are dropped.
pub fn next_record(
    recorded: Option<&RecordedHash>,
    files: &[FanoutFile],
    outcomes: &[Outcome],
    failed: &[bool],
) -> RecordedHash {
    let mut next = BTreeMap::new();
    for ((file, outcome), failed) in files.iter().zip(outcomes).zip(failed) {
        let hash = if outcome.records_hash() && !failed {
            Some(file.source.as_str())
        } else {
            recorded.and_then(|recorded| recorded.tree_file(&file.relative))
        };
        if let Some(hash) = hash {
            next.insert(file.relative.clone(), hash.to_string());
        }
    }
    RecordedHash::Tree(next)
}

/// Record of a directory whose files all match their sources.
pub fn source_record(files: &[FanoutFile]) -> RecordedHash {
    RecordedHash::Tree(
        files
            .iter()
            .map(|file| (file.relative.clone(), file.source.clone()))
            .collect(),
    )
}
