//! SyncEngine implementation
//!
//! The engine resolves each selected remote once, runs the planner over the
//! entries that remote owns and, in sync mode, records the new hashes.
//! Remotes are independent jobs on a small tokio runtime: each runs on the
//! blocking pool, gated by a semaphore, optionally under a timeout. Results
//! come back to the calling thread, which owns the ledger.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossref_fs::{NormalizedPath, RobustnessConfig, WorkspaceLayout, compute_checksum, io};
use crossref_git::{Materialization, RemoteCache, RemoteTarget};
use crossref_meta::{ConfigDocument, Configuration, FileEntry, RecordedHash, RemoteSpec};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::fanout::{self, FanoutFile};
use crate::planner::{Outcome, PlanInput, decide};
use crate::report::{FailureKind, FileResult, RemoteFailure, ResolvedRemote, RunMode, SyncReport, SyncResult};
use crate::{Error, HashLedger, Result};

/// Tuning for a [`SyncEngine`].
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    /// Number of remotes processed at the same time
    pub jobs: usize,
    /// Limit on resolving and processing a single remote
    pub remote_timeout: Option<Duration>,
    /// Retry settings for destination and configuration writes
    pub robustness: RobustnessConfig,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            jobs: 1,
            remote_timeout: None,
            robustness: RobustnessConfig::default(),
        }
    }
}

/// Engine for synchronizing tracked files
///
/// The SyncEngine provides the run operations:
/// - **sync**: write every planned change and record the new hashes
/// - **check**: plan the same changes without touching anything
/// - **clone**: resolve remotes only, warming the cache
pub struct SyncEngine {
    root: NormalizedPath,
    configuration: Configuration,
    cache: Arc<dyn RemoteCache>,
    ledger: Option<HashLedger>,
    options: EngineOptions,
}

#[derive(Debug, Clone, Copy)]
struct Run {
    mode: RunMode,
    force: bool,
}

struct PlannedEntry {
    index: usize,
    entry: FileEntry,
    recorded: Option<RecordedHash>,
}

struct RemoteJob {
    remote: RemoteSpec,
    entries: Vec<PlannedEntry>,
}

struct RemoteRun {
    resolved: ResolvedRemote,
    results: Vec<SyncResult>,
}

type RemoteDone = std::result::Result<RemoteRun, RemoteFailure>;

/// State shared by every job of one run.
struct Shared {
    layout: WorkspaceLayout,
    cache: Arc<dyn RemoteCache>,
    robustness: RobustnessConfig,
}

impl SyncEngine {
    /// Create a new SyncEngine
    ///
    /// # Arguments
    ///
    /// * `root` - Working tree root that destinations are relative to
    /// * `configuration` - A validated configuration
    /// * `cache` - Where remotes are materialized
    ///
    /// Without [`with_document`](Self::with_document) recorded hashes are
    /// only kept in memory.
    pub fn new(root: NormalizedPath, configuration: Configuration, cache: Arc<dyn RemoteCache>) -> Self {
        Self {
            root,
            configuration,
            cache,
            ledger: None,
            options: EngineOptions::default(),
        }
    }

    /// Persist recorded hashes into `document` after each remote.
    pub fn with_document(mut self, document: ConfigDocument) -> Self {
        self.ledger = Some(HashLedger::new(document).with_robustness(self.options.robustness));
        self
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self.ledger = self.ledger.map(|ledger| ledger.with_robustness(options.robustness));
        self
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    /// The configuration, including hashes recorded by earlier runs.
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn ledger(&self) -> Option<&HashLedger> {
        self.ledger.as_ref()
    }

    /// Sync every entry, optionally only those of one remote.
    ///
    /// # Errors
    ///
    /// Returns an error if `remote_filter` names an undeclared remote, or
    /// if recorded hashes cannot be saved. Remote and entry failures are
    /// part of the report.
    pub fn sync_all(&mut self, force: bool, remote_filter: Option<&str>) -> Result<SyncReport> {
        let jobs = self.entry_jobs(remote_filter)?;
        self.run(Run { mode: RunMode::Sync, force }, jobs, SyncReport::new(RunMode::Sync))
    }

    /// Plan every entry without writing anything.
    ///
    /// # Errors
    ///
    /// Returns an error if `remote_filter` names an undeclared remote.
    pub fn check_all(&mut self, remote_filter: Option<&str>) -> Result<SyncReport> {
        let jobs = self.entry_jobs(remote_filter)?;
        self.run(
            Run {
                mode: RunMode::Check,
                force: false,
            },
            jobs,
            SyncReport::new(RunMode::Check),
        )
    }

    /// Sync only the entries whose destination is in `destinations`.
    ///
    /// Only remotes owning a requested entry are resolved. Requests that
    /// match no entry are listed in [`SyncReport::unmatched`].
    pub fn sync_files(&mut self, destinations: &[String], force: bool) -> Result<SyncReport> {
        let mut report = SyncReport::new(RunMode::Sync);
        let mut wanted: BTreeMap<String, BTreeSet<usize>> = BTreeMap::new();

        for destination in destinations {
            match self.configuration.find_destination(destination) {
                Some((remote, index)) => {
                    wanted.entry(remote.to_string()).or_default().insert(index);
                }
                None => {
                    tracing::warn!(destination = %destination, "No entry tracks this destination");
                    report.unmatched.push(destination.clone());
                }
            }
        }

        let jobs = wanted
            .iter()
            .filter_map(|(name, indices)| self.job(name, Some(indices)))
            .collect();
        self.run(Run { mode: RunMode::Sync, force }, jobs, report)
    }

    /// Resolve remotes without processing entries.
    pub fn clone_remotes(&mut self, remote_filter: Option<&str>) -> Result<SyncReport> {
        let jobs = self
            .selected(remote_filter)?
            .iter()
            .filter_map(|name| self.job(name, Some(&BTreeSet::new())))
            .collect();
        self.run(
            Run {
                mode: RunMode::Clone,
                force: false,
            },
            jobs,
            SyncReport::new(RunMode::Clone),
        )
    }

    /// Delete every cache slot. Returns the number removed.
    pub fn cleanup(&self) -> Result<usize> {
        let removed = self.cache.cleanup()?;
        tracing::info!(removed, "Removed cache slots");
        Ok(removed)
    }

    /// Delete cache slots of remotes no longer in the configuration.
    pub fn prune_cache(&self) -> Result<Vec<String>> {
        let evicted = self.cache.prune(&self.configuration.remote_names())?;
        for name in &evicted {
            tracing::info!(remote = %name, "Removed stale cache slot");
        }
        Ok(evicted)
    }

    fn selected(&self, filter: Option<&str>) -> Result<Vec<String>> {
        match filter {
            Some(name) if self.configuration.remote(name).is_none() => Err(Error::UnknownRemote {
                name: name.to_string(),
            }),
            Some(name) => Ok(vec![name.to_string()]),
            None => Ok(self.configuration.remote_names()),
        }
    }

    fn entry_jobs(&self, filter: Option<&str>) -> Result<Vec<RemoteJob>> {
        Ok(self
            .selected(filter)?
            .iter()
            .filter_map(|name| self.job(name, None))
            .filter(|job| !job.entries.is_empty())
            .collect())
    }

    /// Job for remote `name`, restricted to `indices` when given.
    fn job(&self, name: &str, indices: Option<&BTreeSet<usize>>) -> Option<RemoteJob> {
        let remote = self.configuration.remote(name)?.clone();
        let entries = self
            .configuration
            .entries(name)
            .iter()
            .enumerate()
            .filter(|(index, _)| indices.is_none_or(|wanted| wanted.contains(index)))
            .map(|(index, entry)| PlannedEntry {
                index,
                entry: entry.clone(),
                recorded: entry.expected_hash.clone(),
            })
            .collect();
        Some(RemoteJob { remote, entries })
    }

    fn run(&mut self, run: Run, jobs: Vec<RemoteJob>, mut report: SyncReport) -> Result<SyncReport> {
        if !jobs.is_empty() {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .map_err(|e| Error::Worker {
                    message: e.to_string(),
                })?;

            let shared = Arc::new(Shared {
                layout: WorkspaceLayout::at(&self.root),
                cache: Arc::clone(&self.cache),
                robustness: self.options.robustness,
            });
            let semaphore = Arc::new(Semaphore::new(self.options.jobs.max(1)));

            let mut tasks = JoinSet::new();
            for job in jobs {
                tasks.spawn_on(
                    run_remote(
                        Arc::clone(&shared),
                        Arc::clone(&semaphore),
                        job,
                        run,
                        self.options.remote_timeout,
                    ),
                    runtime.handle(),
                );
            }

            let completed = runtime.block_on(async {
                while let Some(joined) = tasks.join_next().await {
                    let done = joined.map_err(|e| Error::Worker {
                        message: e.to_string(),
                    })?;
                    self.apply(done, run.mode, &mut report)?;
                }
                Ok::<(), Error>(())
            });

            // Jobs abandoned after a timeout stop at their next cancellation check
            runtime.shutdown_background();
            completed?;
        }

        report
            .results
            .sort_by(|a, b| (a.remote.as_str(), a.index).cmp(&(b.remote.as_str(), b.index)));
        report.failures.sort_by(|a, b| a.remote.cmp(&b.remote));
        report.resolved.sort_by(|a, b| a.remote.cmp(&b.remote));
        Ok(report)
    }

    /// Fold one finished remote into the report and the ledger.
    fn apply(&mut self, done: RemoteDone, mode: RunMode, report: &mut SyncReport) -> Result<()> {
        let finished = match done {
            Ok(finished) => finished,
            Err(failure) => {
                report.failures.push(failure);
                return Ok(());
            }
        };

        if mode == RunMode::Sync {
            for result in &finished.results {
                if let Some(hash) = result.ledger_hash() {
                    self.record(&result.remote, result.index, hash)?;
                }
            }
            if let Some(ledger) = &mut self.ledger
                && ledger.commit()?
            {
                tracing::debug!(remote = %finished.resolved.remote, "Saved recorded hashes");
            }
        }

        report.resolved.push(finished.resolved);
        report.results.extend(finished.results);
        Ok(())
    }

    fn record(&mut self, remote: &str, index: usize, hash: &RecordedHash) -> Result<()> {
        if let Some(entry) = self
            .configuration
            .files
            .get_mut(remote)
            .and_then(|entries| entries.get_mut(index))
        {
            entry.expected_hash = Some(hash.clone());
        }
        if let Some(ledger) = &mut self.ledger {
            ledger.record(remote, index, hash)?;
        }
        Ok(())
    }
}

async fn run_remote(
    shared: Arc<Shared>,
    semaphore: Arc<Semaphore>,
    job: RemoteJob,
    run: Run,
    limit: Option<Duration>,
) -> RemoteDone {
    let name = job.remote.name.clone();
    let url = job.remote.url.clone();
    let skipped = job.entries.len();

    let permit = semaphore.acquire_owned().await.map_err(|e| RemoteFailure {
        remote: name.clone(),
        kind: FailureKind::Other,
        message: e.to_string(),
        skipped,
    })?;

    let cancel = Arc::new(AtomicBool::new(false));
    let worker = {
        let cancel = Arc::clone(&cancel);
        // The permit lives as long as the blocking work, even past a timeout
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            process_remote(&shared, &job, run, &cancel)
        })
    };

    let joined = match limit {
        Some(limit) => match tokio::time::timeout(limit, worker).await {
            Ok(joined) => joined,
            Err(_) => {
                cancel.store(true, Ordering::SeqCst);
                tracing::error!(remote = %name, timeout = ?limit, "Remote timed out");
                let error = crossref_git::Error::RemoteUnavailable {
                    name: name.clone(),
                    url,
                    message: format!("timed out after {limit:?}"),
                };
                return Err(RemoteFailure::from_error(&name, &error, skipped));
            }
        },
        None => worker.await,
    };

    joined.unwrap_or_else(|e| {
        Err(RemoteFailure {
            remote: name,
            kind: FailureKind::Other,
            message: format!("worker failed: {e}"),
            skipped,
        })
    })
}

fn process_remote(shared: &Shared, job: &RemoteJob, run: Run, cancel: &AtomicBool) -> RemoteDone {
    let remote = &job.remote;
    let target = RemoteTarget::new(&remote.name, &remote.url, remote.version.clone());

    let handle = shared.cache.resolve(&target).map_err(|e| {
        tracing::error!(remote = %remote.name, error = %e, "Failed to resolve remote");
        RemoteFailure::from_error(&remote.name, &e, job.entries.len())
    })?;
    tracing::info!(
        remote = %remote.name,
        version = target.version_label(),
        commit = handle.short_commit(),
        "Resolved remote"
    );

    let resolved = ResolvedRemote {
        remote: remote.name.clone(),
        commit: handle.commit.clone(),
        description: handle.description.clone(),
    };

    let mut results = Vec::with_capacity(job.entries.len());
    for planned in &job.entries {
        if cancel.load(Ordering::SeqCst) {
            break;
        }
        let result = if planned.entry.is_directory() {
            shared.sync_directory(&handle, remote, planned, run, cancel)
        } else {
            shared.sync_file(&handle, remote, planned, run, cancel)
        };
        log_result(&result);
        results.push(result);
    }

    Ok(RemoteRun { resolved, results })
}

impl Shared {
    fn sync_file(
        &self,
        handle: &Materialization,
        remote: &RemoteSpec,
        planned: &PlannedEntry,
        run: Run,
        cancel: &AtomicBool,
    ) -> SyncResult {
        let mut result = pending(&remote.name, planned);
        let entry = &planned.entry;

        let source = match remote.source_path(&entry.source) {
            Some(path) => match self.read_source(handle, &path) {
                Ok(source) => source,
                Err(e) => return failed(result, e.to_string()),
            },
            None => None,
        };

        let destination = match self.layout.destination(&entry.destination) {
            Ok(destination) => destination,
            Err(e) => return failed(result, e.to_string()),
        };
        let current = match io::read_bytes_if_exists(&destination) {
            Ok(current) => current,
            Err(e) => return failed(result, e.to_string()),
        };

        let source_hash = source.as_deref().map(compute_checksum);
        let destination_hash = current.as_deref().map(compute_checksum);
        let outcome = decide(PlanInput {
            source: source_hash.as_deref(),
            destination: destination_hash.as_deref(),
            expected: planned.recorded.as_ref().and_then(RecordedHash::as_file),
            ignore_changes: entry.ignore_changes,
            force: run.force,
        });

        result.outcome = Some(outcome);
        result.summary = summarize(outcome, run.mode, handle);
        if outcome.records_hash() {
            result.new_hash = source_hash.map(RecordedHash::File);
        }

        if run.mode == RunMode::Sync
            && outcome.writes()
            && let Some(content) = source.as_deref()
        {
            match self.write(&destination, content, cancel) {
                Ok(()) => result.written = true,
                Err(e) => result.error = Some(e.to_string()),
            }
        }
        result
    }

    fn sync_directory(
        &self,
        handle: &Materialization,
        remote: &RemoteSpec,
        planned: &PlannedEntry,
        run: Run,
        cancel: &AtomicBool,
    ) -> SyncResult {
        let mut result = pending(&remote.name, planned);
        let entry = &planned.entry;

        let Some(dir) = remote.source_path(&entry.source) else {
            return missing(result, handle);
        };
        let listing = match self.cache.list_tree(handle, &dir) {
            Ok(listing) => listing,
            Err(crossref_git::Error::SourceNotFound { .. }) => return missing(result, handle),
            Err(e) => return failed(result, e.to_string()),
        };
        let Some(base) = entry.destination_key() else {
            return failed(result, format!("invalid destination '{}'", entry.destination));
        };

        let mut files = Vec::with_capacity(listing.len());
        let mut contents = Vec::with_capacity(listing.len());
        for relative in listing {
            let source_path = if dir.is_empty() {
                relative.clone()
            } else {
                format!("{dir}/{relative}")
            };
            let loaded = self.load_pair(handle, &source_path, &format!("{base}/{relative}"));
            let (content, destination, current) = match loaded {
                Ok(loaded) => loaded,
                Err(message) => return failed(result, message),
            };
            files.push(FanoutFile {
                relative,
                source: compute_checksum(&content),
                destination: current.as_deref().map(compute_checksum),
            });
            contents.push((destination, content));
        }

        let outcomes = fanout::plan(planned.recorded.as_ref(), &files, entry.ignore_changes, run.force);
        let mut failed_files = Vec::with_capacity(files.len());
        for ((file, outcome), (destination, content)) in files.iter().zip(&outcomes).zip(&contents) {
            let mut error = None;
            if run.mode == RunMode::Sync && outcome.writes() {
                match self.write(destination, content, cancel) {
                    Ok(()) => result.written = true,
                    Err(e) => error = Some(e.to_string()),
                }
            }
            failed_files.push(error.is_some());
            result.files.push(FileResult {
                relative: file.relative.clone(),
                outcome: *outcome,
                source_hash: file.source.clone(),
                destination_hash: file.destination.clone(),
                error,
            });
        }

        let outcome = fanout::aggregate(outcomes.iter().copied());
        result.outcome = Some(outcome);
        result.summary = format!("{} ({} files)", summarize(outcome, run.mode, handle), files.len());
        let write_failures = failed_files.iter().filter(|failed| **failed).count();
        if write_failures > 0 {
            result.error = Some(format!("{write_failures} of {} files could not be written", files.len()));
        }
        result.new_hash = Some(fanout::next_record(
            planned.recorded.as_ref(),
            &files,
            &outcomes,
            &failed_files,
        ));
        result
    }

    /// Read a source file and the destination it maps to.
    fn load_pair(
        &self,
        handle: &Materialization,
        source: &str,
        destination: &str,
    ) -> std::result::Result<(Vec<u8>, NormalizedPath, Option<Vec<u8>>), String> {
        let content = self.cache.read_file(handle, source).map_err(|e| e.to_string())?;
        let destination = self.layout.destination(destination).map_err(|e| e.to_string())?;
        let current = io::read_bytes_if_exists(&destination).map_err(|e| e.to_string())?;
        Ok((content, destination, current))
    }

    fn read_source(&self, handle: &Materialization, path: &str) -> Result<Option<Vec<u8>>> {
        match self.cache.read_file(handle, path) {
            Ok(content) => Ok(Some(content)),
            Err(crossref_git::Error::SourceNotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, destination: &NormalizedPath, content: &[u8], cancel: &AtomicBool) -> Result<()> {
        if cancel.load(Ordering::SeqCst) {
            return Err(Error::Worker {
                message: "run cancelled".to_string(),
            });
        }
        io::write_atomic(destination, content, self.robustness).map_err(|source| Error::DestinationWrite {
            path: destination.to_native(),
            source,
        })
    }
}

fn pending(remote: &str, planned: &PlannedEntry) -> SyncResult {
    SyncResult {
        remote: remote.to_string(),
        index: planned.index,
        source: planned.entry.source.clone(),
        destination: planned.entry.destination.clone(),
        outcome: None,
        previous_hash: planned.recorded.clone(),
        new_hash: None,
        written: false,
        summary: String::new(),
        error: None,
        files: Vec::new(),
    }
}

fn failed(mut result: SyncResult, message: String) -> SyncResult {
    result.summary = "failed".to_string();
    result.error = Some(message);
    result
}

fn missing(mut result: SyncResult, handle: &Materialization) -> SyncResult {
    result.outcome = Some(Outcome::SourceMissing);
    result.summary = summarize(Outcome::SourceMissing, RunMode::Check, handle);
    result
}

fn summarize(outcome: Outcome, mode: RunMode, handle: &Materialization) -> String {
    let applied = mode == RunMode::Sync;
    match outcome {
        Outcome::SourceMissing => format!("source not found at {}", handle.short_commit()),
        Outcome::Create if applied => "created".to_string(),
        Outcome::Create => "would create".to_string(),
        Outcome::InSync => "up to date".to_string(),
        Outcome::NeedsUpdate if applied => format!("updated to {}", handle.short_commit()),
        Outcome::NeedsUpdate => format!("would update to {}", handle.short_commit()),
        Outcome::Overwrite if applied => "overwrote local changes".to_string(),
        Outcome::Overwrite => "would overwrite local changes".to_string(),
        Outcome::Conflict => "local changes block the update".to_string(),
    }
}

fn log_result(result: &SyncResult) {
    match (result.outcome, &result.error) {
        (_, Some(error)) => {
            tracing::error!(remote = %result.remote, destination = %result.destination, error = %error, "Entry failed");
        }
        (Some(Outcome::Conflict), None) => {
            tracing::warn!(remote = %result.remote, destination = %result.destination, "Local changes block the update");
        }
        (Some(Outcome::SourceMissing), None) => {
            tracing::warn!(remote = %result.remote, source = %result.source, "Source not found");
        }
        (Some(outcome), None) => {
            tracing::debug!(remote = %result.remote, destination = %result.destination, outcome = %outcome, "Processed entry");
        }
        (None, None) => {}
    }
}
