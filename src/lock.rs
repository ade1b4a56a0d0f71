//! File-based locking to serialize hosts file edits across processes.
//!
//! Uses flock-style advisory locking so a scheduled revert in one process
//! never interleaves with a manual `stop` from another.

use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{GuardError, Result};

/// Default lock file location for the command-line front end.
#[cfg(unix)]
pub const DEFAULT_LOCK_FILE: &str = "/var/run/restraint.lock";
#[cfg(not(unix))]
pub const DEFAULT_LOCK_FILE: &str = "C:\\ProgramData\\restraint\\restraint.lock";

/// A guard that holds a lock on a lock file.
/// The lock is released when the guard is dropped.
pub struct LockGuard {
    _file: File,
}

impl LockGuard {
    /// Acquire an exclusive lock, waiting for any other holder to finish.
    ///
    /// Opens with create+read+write and no truncation to avoid a race
    /// between creating the file and locking it.
    pub fn acquire(lock_path: &Path) -> Result<Self> {
        let lock_err = |source| GuardError::Lock {
            path: PathBuf::from(lock_path),
            source,
        };

        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).map_err(lock_err)?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(lock_path)
            .map_err(lock_err)?;

        file.lock_exclusive().map_err(lock_err)?;

        Ok(Self { _file: file })
    }

    /// Acquire a shared lock for a read-only caller.
    ///
    /// Never creates the lock file. Returns `None` when it cannot be opened
    /// (missing, or not readable by this user) and the caller reads unlocked.
    pub fn acquire_shared(lock_path: &Path) -> Result<Option<Self>> {
        let file = match OpenOptions::new().read(true).open(lock_path) {
            Ok(file) => file,
            Err(e) => {
                debug!("Reading without lock {:?}: {}", lock_path, e);
                return Ok(None);
            }
        };

        file.lock_shared().map_err(|source| GuardError::Lock {
            path: PathBuf::from(lock_path),
            source,
        })?;

        Ok(Some(Self { _file: file }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_acquire_release() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("restraint.lock");

        let guard = LockGuard::acquire(&path).unwrap();
        assert!(path.exists());
        drop(guard);

        // Re-acquirable once released
        let _again = LockGuard::acquire(&path).unwrap();
    }

    #[test]
    fn test_acquire_waits_for_holder() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;
        use std::time::Duration;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("restraint.lock");
        let held = LockGuard::acquire(&path).unwrap();

        let acquired = Arc::new(AtomicBool::new(false));
        let waiter = {
            let acquired = Arc::clone(&acquired);
            let path = path.clone();
            std::thread::spawn(move || {
                // flock locks are per open file description, so this contends
                let _lock = LockGuard::acquire(&path).unwrap();
                acquired.store(true, Ordering::SeqCst);
            })
        };

        std::thread::sleep(Duration::from_millis(100));
        assert!(!acquired.load(Ordering::SeqCst));

        drop(held);
        waiter.join().unwrap();
        assert!(acquired.load(Ordering::SeqCst));
    }

    #[test]
    fn test_shared_lock_does_not_create_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("restraint.lock");

        assert!(LockGuard::acquire_shared(&path).unwrap().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_shared_lock_on_unopenable_path() {
        let temp_dir = TempDir::new().unwrap();
        let not_a_dir = temp_dir.path().join("file");
        std::fs::write(&not_a_dir, "").unwrap();

        let path = not_a_dir.join("restraint.lock");
        assert!(LockGuard::acquire(&path).is_err());
        assert!(LockGuard::acquire_shared(&path).unwrap().is_none());
    }

    #[test]
    fn test_shared_locks_coexist() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("restraint.lock");
        drop(LockGuard::acquire(&path).unwrap());

        let first = LockGuard::acquire_shared(&path).unwrap();
        let second = LockGuard::acquire_shared(&path).unwrap();
        assert!(first.is_some());
        assert!(second.is_some());
    }

    #[test]
    fn test_acquire_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("run/nested/restraint.lock");
        let _guard = LockGuard::acquire(&path).unwrap();
        assert!(path.exists());
    }
}
