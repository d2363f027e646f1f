//! Version reference resolution
//!
//! A version expression is tried as a commit id first, then as a tag, then
//! as a branch. The first match wins.

use git2::{Commit, Oid, Repository};

/// Reference holding the remote's default branch.
pub const ORIGIN_HEAD: &str = "refs/remotes/origin/HEAD";

/// Whether `version` could name a commit (a hex id of at least 4 chars).
pub fn looks_like_commit(version: &str) -> bool {
    (4..=40).contains(&version.len()) && version.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Resolve `version` to a commit, or `None` when nothing matches.
///
/// `None` for `version` selects the remote's default branch, falling back
/// to the slot's own `HEAD`.
pub fn resolve_version<'r>(repo: &'r Repository, version: Option<&str>) -> Option<Commit<'r>> {
    let Some(version) = version else {
        return peel_reference(repo, ORIGIN_HEAD)
            .or_else(|| repo.head().ok().and_then(|head| head.peel_to_commit().ok()));
    };

    by_commit(repo, version)
        .or_else(|| peel_reference(repo, &format!("refs/tags/{version}")))
        .or_else(|| peel_reference(repo, &format!("refs/remotes/origin/{version}")))
        .or_else(|| peel_reference(repo, &format!("refs/heads/{version}")))
}

fn by_commit<'r>(repo: &'r Repository, version: &str) -> Option<Commit<'r>> {
    if !looks_like_commit(version) {
        return None;
    }
    if version.len() == 40 {
        let oid = Oid::from_str(version).ok()?;
        repo.find_commit(oid).ok()
    } else {
        // Ambiguous prefixes fall through to tag and branch lookup
        repo.find_commit_by_prefix(version).ok()
    }
}

fn peel_reference<'r>(repo: &'r Repository, name: &str) -> Option<Commit<'r>> {
    repo.find_reference(name).ok()?.peel_to_commit().ok()
}
