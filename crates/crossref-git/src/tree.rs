//! Reads from a commit's tree without a working-directory checkout.

use std::collections::VecDeque;
use std::path::Path;

use git2::{ErrorCode, ObjectType, Repository, Tree};

/// Read the blob at `path`, or `None` when no file exists there.
///
/// A directory at `path` counts as no file.
pub fn read_blob(repo: &Repository, tree: &Tree<'_>, path: &str) -> Result<Option<Vec<u8>>, git2::Error> {
    let path = path.trim_matches('/');
    if path.is_empty() {
        return Ok(None);
    }

    let entry = match tree.get_path(Path::new(path)) {
        Ok(entry) => entry,
        Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    if entry.kind() != Some(ObjectType::Blob) {
        return Ok(None);
    }

    let blob = repo.find_blob(entry.id())?;
    Ok(Some(blob.content().to_vec()))
}

/// List every file under the directory `dir`, relative to it and sorted.
///
/// Returns `None` when `dir` is not a directory in the tree.
pub fn list_files(repo: &Repository, tree: &Tree<'_>, dir: &str) -> Result<Option<Vec<String>>, git2::Error> {
    let dir = dir.trim_matches('/');
    let start = if dir.is_empty() {
        repo.find_tree(tree.id())?
    } else {
        match tree.get_path(Path::new(dir)) {
            Ok(entry) if entry.kind() == Some(ObjectType::Tree) => repo.find_tree(entry.id())?,
            Ok(_) => return Ok(None),
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e),
        }
    };

    let mut files = Vec::new();
    let mut pending = VecDeque::new();
    pending.push_back((start, String::new()));

    while let Some((tree, prefix)) = pending.pop_front() {
        for entry in &tree {
            let name = String::from_utf8_lossy(entry.name_bytes());
            let path = if prefix.is_empty() {
                name.into_owned()
            } else {
                format!("{prefix}/{name}")
            };
            match entry.kind() {
                Some(ObjectType::Tree) => pending.push_back((repo.find_tree(entry.id())?, path)),
                Some(ObjectType::Blob) => files.push(path),
                // Submodule commits have no content to copy
                _ => continue,
            }
        }
    }

    files.sort();
    Ok(Some(files))
}
