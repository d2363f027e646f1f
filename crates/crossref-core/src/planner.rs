//! Per-file sync decisions
//!
//! [`decide`] is the single decision table shared by sync and check; the
//! two differ only in whether the write is carried out.

use serde::{Deserialize, Serialize};

/// What a sync does (or would do) to one destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// The source does not exist at the resolved version
    SourceMissing,
    /// The destination does not exist yet
    Create,
    /// Destination, recorded hash and source all agree
    InSync,
    /// Destination is unmodified but the source moved on
    NeedsUpdate,
    /// Destination drifted and is replaced anyway
    Overwrite,
    /// Destination drifted and may not be replaced
    Conflict,
}

impl Outcome {
    /// Whether the source content is written to the destination.
    pub fn writes(self) -> bool {
        matches!(self, Self::Create | Self::NeedsUpdate | Self::Overwrite)
    }

    /// Whether the source hash is recorded in the ledger afterwards.
    pub fn records_hash(self) -> bool {
        !matches!(self, Self::SourceMissing | Self::Conflict)
    }

    /// Whether this outcome makes a run unsuccessful.
    pub fn is_failure(self) -> bool {
        matches!(self, Self::SourceMissing | Self::Conflict)
    }

    /// Rank used to summarize a directory: the highest-ranked file wins.
    pub fn severity(self) -> u8 {
        match self {
            Self::InSync => 0,
            Self::Create => 1,
            Self::NeedsUpdate => 2,
            Self::Overwrite => 3,
            Self::SourceMissing => 4,
            Self::Conflict => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::SourceMissing => "source missing",
            Self::Create => "create",
            Self::InSync => "in sync",
            Self::NeedsUpdate => "update",
            Self::Overwrite => "overwrite",
            Self::Conflict => "conflict",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Hashes and flags for one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanInput<'a> {
    /// Hash of the source at the resolved version, `None` if missing
    pub source: Option<&'a str>,
    /// Hash of the current destination, `None` if missing
    pub destination: Option<&'a str>,
    /// Hash recorded after the last sync
    pub expected: Option<&'a str>,
    pub ignore_changes: bool,
    pub force: bool,
}

/// Decide the outcome for one file. First matching rule wins.
///
/// An absent recorded hash never matches, so an existing destination
/// without a record is treated as drifted.
pub fn decide(input: PlanInput<'_>) -> Outcome {
    let Some(source) = input.source else {
        return Outcome::SourceMissing;
    };
    let Some(destination) = input.destination else {
        return Outcome::Create;
    };

    let unchanged = input.expected == Some(destination);
    if unchanged {
        if destination == source {
            Outcome::InSync
        } else {
            Outcome::NeedsUpdate
        }
    } else if input.ignore_changes || input.force {
        Outcome::Overwrite
    } else {
        Outcome::Conflict
    }
}
