//! Atomic I/O operations with file locking

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::time::Duration;

use backoff::ExponentialBackoff;
use fs2::FileExt;

use crate::{Error, NormalizedPath, Result};

/// Retry settings for the rename step of an atomic write.
///
/// Renames can fail transiently when another process (an editor, a virus
/// scanner) briefly holds the destination open.
#[derive(Debug, Clone, Copy)]
pub struct RobustnessConfig {
    /// Upper bound on the total time spent retrying
    pub max_elapsed: Duration,
    /// Delay before the first retry
    pub initial_interval: Duration,
}

impl Default for RobustnessConfig {
    fn default() -> Self {
        Self {
            max_elapsed: Duration::from_secs(2),
            initial_interval: Duration::from_millis(20),
        }
    }
}

impl RobustnessConfig {
    /// Never retry.
    pub fn no_retry() -> Self {
        Self {
            max_elapsed: Duration::ZERO,
            initial_interval: Duration::from_millis(1),
        }
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.initial_interval,
            max_elapsed_time: Some(self.max_elapsed),
            ..ExponentialBackoff::default()
        }
    }
}

fn is_transient(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::PermissionDenied | ErrorKind::Interrupted | ErrorKind::WouldBlock
    )
}

/// Write content atomically to a file with locking.
///
/// Uses write-to-temp-then-rename so readers observe either the old or the
/// new content, never a partial write. Parent directories are created.
pub fn write_atomic(path: &NormalizedPath, content: &[u8], robustness: RobustnessConfig) -> Result<()> {
    let native_path = path.to_native();

    if let Some(parent) = native_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    // Same directory as the target so the rename stays on one filesystem
    let temp_name = format!(
        ".{}.{}.tmp",
        native_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = native_path.with_file_name(&temp_name);

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    FileExt::lock_exclusive(&temp_file).map_err(|_| Error::LockFailed {
        path: native_path.clone(),
    })?;

    let written = temp_file
        .write_all(content)
        .and_then(|()| temp_file.sync_all());
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::io(&temp_path, e));
    }

    FileExt::unlock(&temp_file).map_err(|_| Error::LockFailed {
        path: native_path.clone(),
    })?;
    drop(temp_file);

    let renamed = backoff::retry(robustness.backoff(), || {
        fs::rename(&temp_path, &native_path).map_err(|e| {
            if is_transient(&e) {
                tracing::debug!(path = %native_path.display(), error = %e, "Retrying rename");
                backoff::Error::transient(e)
            } else {
                backoff::Error::permanent(e)
            }
        })
    });

    if let Err(e) = renamed {
        let _ = fs::remove_file(&temp_path);
        let source = match e {
            backoff::Error::Permanent(e) => e,
            backoff::Error::Transient { err, .. } => err,
        };
        return Err(Error::io(&native_path, source));
    }

    Ok(())
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Read a file's bytes, returning `None` when nothing exists at `path`.
///
/// A directory at `path` is an error, not an absence.
pub fn read_bytes_if_exists(path: &NormalizedPath) -> Result<Option<Vec<u8>>> {
    let native_path = path.to_native();
    match fs::read(&native_path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(&native_path, e)),
    }
}

/// Write text content to a file atomically.
pub fn write_text(path: &NormalizedPath, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes(), RobustnessConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_atomic_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = NormalizedPath::new(dir.path().join("out.txt"));

        write_atomic(&path, b"data", RobustnessConfig::no_retry()).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["out.txt".to_string()]);
    }

    #[test]
    fn read_bytes_if_exists_distinguishes_absence() {
        let dir = tempfile::tempdir().unwrap();
        let missing = NormalizedPath::new(dir.path().join("missing"));
        assert!(read_bytes_if_exists(&missing).unwrap().is_none());

        let present = NormalizedPath::new(dir.path().join("present"));
        fs::write(present.to_native(), b"x").unwrap();
        assert_eq!(read_bytes_if_exists(&present).unwrap(), Some(b"x".to_vec()));
    }

    #[test]
    fn read_bytes_if_exists_rejects_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = NormalizedPath::new(dir.path());
        assert!(read_bytes_if_exists(&path).is_err());
    }
}
