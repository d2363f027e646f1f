//! git2-backed remote cache
//!
//! Each remote gets one bare repository under the cache root, named after
//! the remote. Resolving a remote clones its slot on first use and fetches
//! into it afterwards; reads go straight to the object database.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use git2::build::RepoBuilder;
use git2::{AutotagOption, Direction, ErrorClass, FetchOptions, FetchPrune, Oid, Repository, Tree};

use crossref_fs::{FileLock, validate_path_identifier};

use crate::provider::{Materialization, RemoteCache, RemoteTarget};
use crate::{CommitInfo, Error, Result, resolve, tree};

const ORIGIN: &str = "origin";
const HEADS_REFSPEC: &str = "+refs/heads/*:refs/remotes/origin/*";
const TAGS_REFSPEC: &str = "+refs/tags/*:refs/tags/*";
const LOCK_SUFFIX: &str = ".lock";

/// Remote cache storing one bare clone per remote name.
#[derive(Debug)]
pub struct GitCache {
    root: PathBuf,
    slots: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl GitCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Directory holding every slot.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of the slot for `name`.
    pub fn slot_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn lock_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}{LOCK_SUFFIX}"))
    }

    /// In-process mutex for one slot. The advisory lock file guards
    /// against other processes.
    fn slot_mutex(&self, name: &str) -> Arc<Mutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(name.to_string()).or_default())
    }

    fn resolve_locked(&self, target: &RemoteTarget) -> Result<Materialization> {
        let slot = self.slot_path(&target.name);
        let repo = if slot.exists() {
            let repo = Repository::open_bare(&slot).map_err(|e| corrupt(&target.name, e))?;
            self.fetch(&repo, target)?;
            repo
        } else {
            self.clone_slot(target)?
        };

        let commit = resolve::resolve_version(&repo, target.version.as_deref()).ok_or_else(|| {
            Error::VersionNotFound {
                name: target.name.clone(),
                version: target.version_label().to_string(),
            }
        })?;
        // An unreadable tree means missing objects
        commit.tree().map_err(|e| corrupt(&target.name, e))?;

        let info = CommitInfo::from_commit(&commit);
        let materialization = Materialization {
            name: target.name.clone(),
            version: target.version.clone(),
            commit: commit.id().to_string(),
            description: info.to_string(),
        };
        tracing::debug!(
            remote = %target.name,
            version = %target.version_label(),
            commit = %materialization.short_commit(),
            "Resolved version"
        );
        Ok(materialization)
    }

    fn clone_slot(&self, target: &RemoteTarget) -> Result<Repository> {
        let slot = self.slot_path(&target.name);
        tracing::info!(remote = %target.name, url = %target.url, "Cloning remote repository");

        let mut builder = RepoBuilder::new();
        builder
            .bare(true)
            .fetch_options(fetch_options())
            .remote_create(|repo, name, url| repo.remote_with_fetch(name, url, HEADS_REFSPEC));

        let repo = match builder.clone(&target.url, &slot) {
            Ok(repo) => repo,
            Err(e) => {
                if slot.exists() {
                    let _ = fs::remove_dir_all(&slot);
                }
                return Err(unavailable(target, &e));
            }
        };

        let head = repo
            .find_reference("HEAD")
            .ok()
            .and_then(|head| head.symbolic_target().map(str::to_string));
        if let Some(head) = head {
            update_origin_head(&repo, &head)?;
        }
        Ok(repo)
    }

    fn fetch(&self, repo: &Repository, target: &RemoteTarget) -> Result<()> {
        let mut remote = repo.find_remote(ORIGIN).map_err(|e| corrupt(&target.name, e))?;
        if remote.url() != Some(target.url.as_str()) {
            tracing::info!(remote = %target.name, url = %target.url, "Remote URL changed, updating slot");
            repo.remote_set_url(ORIGIN, &target.url)?;
            remote = repo.find_remote(ORIGIN)?;
        }

        tracing::debug!(remote = %target.name, "Fetching");
        let default_branch = {
            let connection = remote
                .connect_auth(Direction::Fetch, None, None)
                .map_err(|e| unavailable(target, &e))?;
            connection
                .default_branch()
                .ok()
                .and_then(|branch| branch.as_str().map(str::to_string))
        };

        let mut options = fetch_options();
        remote
            .fetch(&[HEADS_REFSPEC, TAGS_REFSPEC], Some(&mut options), None)
            .map_err(|e| {
                if is_network(&e) {
                    unavailable(target, &e)
                } else {
                    corrupt(&target.name, e)
                }
            })?;

        if let Some(branch) = default_branch {
            update_origin_head(repo, &branch)?;
        }
        Ok(())
    }

    fn open(&self, handle: &Materialization) -> Result<Repository> {
        Repository::open_bare(self.slot_path(&handle.name)).map_err(|e| corrupt(&handle.name, e))
    }

    fn remove_slot(&self, name: &str) -> Result<bool> {
        let slot = self.slot_path(name);
        let existed = {
            let mutex = self.slot_mutex(name);
            let _guard = mutex.lock().unwrap_or_else(PoisonError::into_inner);
            let _lock = FileLock::exclusive(self.lock_path(name))?;
            let existed = slot.exists();
            if existed {
                fs::remove_dir_all(&slot).map_err(|e| crossref_fs::Error::io(&slot, e))?;
            }
            existed
        };
        let _ = fs::remove_file(self.lock_path(name));
        if existed {
            tracing::info!(remote = %name, "Removed cache slot");
        }
        Ok(existed)
    }

    fn slot_names(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(crossref_fs::Error::io(&self.root, e).into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| crossref_fs::Error::io(&self.root, e))?;
            if !entry.path().is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

impl RemoteCache for GitCache {
    fn resolve(&self, target: &RemoteTarget) -> Result<Materialization> {
        validate_path_identifier(&target.name)?;
        let mutex = self.slot_mutex(&target.name);
        let _guard = mutex.lock().unwrap_or_else(PoisonError::into_inner);
        let _lock = FileLock::exclusive(self.lock_path(&target.name))?;

        match self.resolve_locked(target) {
            Err(Error::CorruptSlot { message, .. }) => {
                tracing::warn!(remote = %target.name, reason = %message, "Cache slot is corrupt, re-cloning");
                let slot = self.slot_path(&target.name);
                fs::remove_dir_all(&slot).map_err(|e| crossref_fs::Error::io(&slot, e))?;
                self.resolve_locked(target)
            }
            other => other,
        }
    }

    fn read_file(&self, handle: &Materialization, path: &str) -> Result<Vec<u8>> {
        let repo = self.open(handle)?;
        let tree = commit_tree(&repo, handle)?;
        tree::read_blob(&repo, &tree, path)?.ok_or_else(|| source_not_found(handle, path))
    }

    fn list_tree(&self, handle: &Materialization, path: &str) -> Result<Vec<String>> {
        let repo = self.open(handle)?;
        let tree = commit_tree(&repo, handle)?;
        tree::list_files(&repo, &tree, path)?.ok_or_else(|| source_not_found(handle, path))
    }

    fn remove(&self, name: &str) -> Result<bool> {
        validate_path_identifier(name)?;
        self.remove_slot(name)
    }

    fn cleanup(&self) -> Result<usize> {
        let mut removed = 0;
        for name in self.slot_names()? {
            if self.remove_slot(&name)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn prune(&self, keep: &[String]) -> Result<Vec<String>> {
        let mut evicted = Vec::new();
        for name in self.slot_names()? {
            if !keep.contains(&name) && self.remove_slot(&name)? {
                evicted.push(name);
            }
        }
        Ok(evicted)
    }
}

fn fetch_options<'cb>() -> FetchOptions<'cb> {
    let mut options = FetchOptions::new();
    options.download_tags(AutotagOption::All);
    options.prune(FetchPrune::On);
    options
}

fn commit_tree<'r>(repo: &'r Repository, handle: &Materialization) -> Result<Tree<'r>> {
    let oid = Oid::from_str(&handle.commit)?;
    let commit = repo.find_commit(oid).map_err(|e| corrupt(&handle.name, e))?;
    commit.tree().map_err(|e| corrupt(&handle.name, e))
}

/// Point `refs/remotes/origin/HEAD` at the remote-tracking copy of
/// `branch` (a `refs/heads/...` name).
fn update_origin_head(repo: &Repository, branch: &str) -> Result<()> {
    let Some(short) = branch.strip_prefix("refs/heads/") else {
        return Ok(());
    };
    let tracking = format!("refs/remotes/{ORIGIN}/{short}");
    if repo.find_reference(&tracking).is_ok() {
        repo.reference_symbolic(resolve::ORIGIN_HEAD, &tracking, true, "git-crossref: default branch")?;
    }
    Ok(())
}

fn is_network(err: &git2::Error) -> bool {
    matches!(
        err.class(),
        ErrorClass::Net | ErrorClass::Http | ErrorClass::Ssh | ErrorClass::Ssl
    )
}

fn unavailable(target: &RemoteTarget, err: &git2::Error) -> Error {
    Error::RemoteUnavailable {
        name: target.name.clone(),
        url: target.url.clone(),
        message: err.message().to_string(),
    }
}

fn corrupt(name: &str, err: git2::Error) -> Error {
    Error::CorruptSlot {
        name: name.to_string(),
        message: err.message().to_string(),
    }
}

fn source_not_found(handle: &Materialization, path: &str) -> Error {
    Error::SourceNotFound {
        name: handle.name.clone(),
        path: path.to_string(),
        version: handle.short_commit().to_string(),
    }
}
