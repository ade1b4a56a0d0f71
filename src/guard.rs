//! The hosts file guard: applies a managed region, removes it, and schedules
//! its removal.
//!
//! The region on disk is the only record of whether a block is active. All
//! mutating operations go through one critical section per guard (an
//! in-process mutex, plus an exclusive advisory file lock when a lock path is
//! set), so a scheduled revert never interleaves with a manual one. `inspect`
//! only takes a shared lock, and reads unlocked when the lock file cannot be
//! opened.
//!
//! The hosts file is handled as bytes; only the managed region is required to
//! be UTF-8.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info, warn};

use crate::compiler::BlockSet;
use crate::config::Config;
use crate::error::{GuardError, Result};
use crate::fs_abstraction::{FileSystem, RealFileSystem};
use crate::lock::LockGuard;
use crate::region;
use crate::session::{self, RevertOutcome, SessionHandle};

/// Default interval between remaining-time notifications.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Platform location of the hosts file.
#[cfg(windows)]
pub const DEFAULT_HOSTS_FILE: &str = "C:\\Windows\\System32\\drivers\\etc\\hosts";
#[cfg(not(windows))]
pub const DEFAULT_HOSTS_FILE: &str = "/etc/hosts";

/// What the hosts file currently says about blocking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockStatus {
    Idle,
    Active {
        hosts: Vec<String>,
        expires_at: Option<DateTime<Utc>>,
        /// The region has no end marker.
        truncated: bool,
    },
}

impl BlockStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, BlockStatus::Active { .. })
    }
}

struct Inner {
    hosts_path: PathBuf,
    backup_path: Option<PathBuf>,
    lock_path: Option<PathBuf>,
    tick_interval: Duration,
    fs: Arc<dyn FileSystem>,
    /// Critical section; holds the id of the session whose region is on disk.
    current: Mutex<Option<u64>>,
    next_session: AtomicU64,
}

/// Builder for [`HostsFileGuard`].
pub struct GuardBuilder {
    hosts_path: PathBuf,
    backup_path: Option<PathBuf>,
    lock_path: Option<PathBuf>,
    tick_interval: Duration,
    fs: Arc<dyn FileSystem>,
}

impl GuardBuilder {
    /// Copy the hosts file here before every apply; removed after a clean revert.
    pub fn backup_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.backup_path = Some(path.into());
        self
    }

    /// Serialize edits with other processes through this lock file.
    pub fn lock_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.lock_path = Some(path.into());
        self
    }

    /// Interval between tick events. Zero keeps the default.
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        if !interval.is_zero() {
            self.tick_interval = interval;
        }
        self
    }

    pub fn filesystem(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn build(self) -> HostsFileGuard {
        HostsFileGuard {
            inner: Arc::new(Inner {
                hosts_path: self.hosts_path,
                backup_path: self.backup_path,
                lock_path: self.lock_path,
                tick_interval: self.tick_interval,
                fs: self.fs,
                current: Mutex::new(None),
                next_session: AtomicU64::new(1),
            }),
        }
    }
}

/// Owner of the managed region in one hosts file.
///
/// Cheap to clone; clones share the same critical section.
#[derive(Clone)]
pub struct HostsFileGuard {
    inner: Arc<Inner>,
}

impl HostsFileGuard {
    /// Guard for `hosts_path` with no backup, no cross-process lock and a
    /// one-second tick.
    pub fn new(hosts_path: impl Into<PathBuf>) -> Self {
        Self::builder(hosts_path).build()
    }

    pub fn builder(hosts_path: impl Into<PathBuf>) -> GuardBuilder {
        GuardBuilder {
            hosts_path: hosts_path.into(),
            backup_path: None,
            lock_path: None,
            tick_interval: DEFAULT_TICK_INTERVAL,
            fs: Arc::new(RealFileSystem),
        }
    }

    /// Guard configured from a loaded [`Config`].
    pub fn from_config(config: &Config) -> Self {
        let mut builder = Self::builder(&config.hosts_file)
            .tick_interval(Duration::from_secs(config.tick_interval_secs));
        if config.backup {
            builder = builder.backup_file(config.backup_path());
        }
        if let Some(ref lock) = config.lock_file {
            builder = builder.lock_file(lock);
        }
        builder.build()
    }

    pub fn hosts_path(&self) -> &Path {
        &self.inner.hosts_path
    }

    /// Append a managed region for `entries` and schedule its removal after
    /// `duration`.
    ///
    /// Fails with [`GuardError::AlreadyActive`] if the file already holds a
    /// region. Must be called from within a tokio runtime.
    pub fn apply(&self, entries: &BlockSet, duration: Duration) -> Result<SessionHandle> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(GuardError::Session(
                "apply must be called from within a tokio runtime".to_string(),
            ));
        }

        let inner = &self.inner;
        let (mut current, _lock) = inner.enter()?;

        let content = inner.read()?;
        if region::contains_region(&content) {
            return Err(GuardError::AlreadyActive {
                path: inner.hosts_path.clone(),
            });
        }

        if let Some(ref backup) = inner.backup_path {
            inner
                .fs
                .copy(&inner.hosts_path, backup)
                .map_err(|e| GuardError::from_io(backup, e))?;
            debug!("Backed up {:?} to {:?}", inner.hosts_path, backup);
        }

        let expires_at = expiry_after(duration);
        let text = region::render(entries, expires_at, region::detect_newline(&content));
        if let Err(e) = inner.fs.append(&inner.hosts_path, text.as_bytes()) {
            // A backup of a block that never happened must not be restorable
            inner.remove_backup();
            return Err(GuardError::from_io(&inner.hosts_path, e));
        }

        let id = inner.next_session.fetch_add(1, Ordering::Relaxed);
        *current = Some(id);
        info!(
            "Blocked {} hosts in {:?} until {}",
            entries.len(),
            inner.hosts_path,
            expires_at.to_rfc3339()
        );

        Ok(self.schedule(id, expires_at, duration, entries.len()))
    }

    /// Remove the managed region, keeping every other line as it was.
    ///
    /// Succeeds with [`RevertOutcome::NotActive`] when there is nothing to
    /// remove, so it is safe to call unconditionally at startup.
    pub fn revert(&self) -> Result<RevertOutcome> {
        let (mut current, _lock) = self.inner.enter()?;
        let outcome = self.inner.revert_locked()?;
        *current = None;
        Ok(outcome)
    }

    /// Report whether a block is active, from the file itself.
    pub fn inspect(&self) -> Result<BlockStatus> {
        let (_current, _lock) = self.inner.enter_shared()?;
        let content = self.inner.read()?;
        Ok(match region::parse(&content) {
            None => BlockStatus::Idle,
            Some(info) => BlockStatus::Active {
                hosts: info.hosts,
                expires_at: info.expires_at,
                truncated: info.truncated,
            },
        })
    }

    /// Pick up a block left by an earlier process.
    ///
    /// A region that has not expired gets a new session for its remaining
    /// time. An expired region, or one whose expiry cannot be read, is
    /// removed now.
    pub fn resume(&self) -> Result<Option<SessionHandle>> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(GuardError::Session(
                "resume must be called from within a tokio runtime".to_string(),
            ));
        }

        let inner = &self.inner;
        let (mut current, _lock) = inner.enter()?;
        let content = inner.read()?;

        let Some(info) = region::parse(&content) else {
            debug!("No block to resume in {:?}", inner.hosts_path);
            return Ok(None);
        };

        let remaining = info
            .expires_at
            .and_then(|at| (at - Utc::now()).to_std().ok())
            .filter(|d| !d.is_zero());

        match (info.expires_at, remaining) {
            (Some(expires_at), Some(remaining)) if !info.truncated => {
                let id = inner.next_session.fetch_add(1, Ordering::Relaxed);
                *current = Some(id);
                info!(
                    "Resuming block of {} hosts, {}s remaining",
                    info.hosts.len(),
                    remaining.as_secs()
                );
                Ok(Some(self.schedule(id, expires_at, remaining, info.hosts.len())))
            }
            _ => {
                info!("Block in {:?} has expired, removing it", inner.hosts_path);
                inner.revert_locked()?;
                *current = None;
                Ok(None)
            }
        }
    }

    /// Replace the hosts file with the backup taken at apply time.
    ///
    /// Returns `false` when backups are disabled or no backup exists.
    pub fn restore_backup(&self) -> Result<bool> {
        let inner = &self.inner;
        let Some(ref backup) = inner.backup_path else {
            return Ok(false);
        };

        let (mut current, _lock) = inner.enter()?;
        if !inner.fs.exists(backup) {
            return Ok(false);
        }

        let saved = inner
            .fs
            .read(backup)
            .map_err(|e| GuardError::from_io(backup, e))?;
        inner
            .fs
            .replace(&inner.hosts_path, &saved)
            .map_err(|e| GuardError::from_io(&inner.hosts_path, e))?;
        inner.remove_backup();
        *current = None;

        warn!("Restored {:?} from backup {:?}", inner.hosts_path, backup);
        Ok(true)
    }

    fn schedule(
        &self,
        id: u64,
        expires_at: DateTime<Utc>,
        duration: Duration,
        hosts: usize,
    ) -> SessionHandle {
        let inner = Arc::clone(&self.inner);
        session::spawn(
            expires_at,
            duration,
            hosts,
            self.inner.tick_interval,
            move || inner.revert_session(id),
        )
    }
}

impl Inner {
    fn current(&self) -> MutexGuard<'_, Option<u64>> {
        // A panic mid-edit leaves no in-memory state worth protecting
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Enter the critical section for this hosts file.
    fn enter(&self) -> Result<(MutexGuard<'_, Option<u64>>, Option<LockGuard>)> {
        let current = self.current();
        let lock = match self.lock_path {
            Some(ref path) => Some(LockGuard::acquire(path)?),
            None => None,
        };
        Ok((current, lock))
    }

    /// Enter for reading only; the file lock is shared and optional.
    fn enter_shared(&self) -> Result<(MutexGuard<'_, Option<u64>>, Option<LockGuard>)> {
        let current = self.current();
        let lock = match self.lock_path {
            Some(ref path) => LockGuard::acquire_shared(path)?,
            None => None,
        };
        Ok((current, lock))
    }

    fn read(&self) -> Result<Vec<u8>> {
        self.fs
            .read(&self.hosts_path)
            .map_err(|e| GuardError::from_io(&self.hosts_path, e))
    }

    /// Revert on behalf of a scheduled session.
    ///
    /// A session whose region was already removed and replaced by a newer
    /// apply leaves the newer region alone.
    fn revert_session(&self, id: u64) -> Result<RevertOutcome> {
        let (mut current, _lock) = self.enter()?;
        match *current {
            Some(active) if active != id => {
                debug!("Session {} superseded by {}", id, active);
                Ok(RevertOutcome::Superseded)
            }
            _ => {
                let outcome = self.revert_locked()?;
                *current = None;
                Ok(outcome)
            }
        }
    }

    fn revert_locked(&self) -> Result<RevertOutcome> {
        let content = self.read()?;
        let stripped = region::strip(&content);
        if !stripped.found {
            debug!("No managed region in {:?}", self.hosts_path);
            return Ok(RevertOutcome::NotActive);
        }

        if stripped.truncated {
            warn!(
                "Managed region in {:?} has no end marker, removing through end of file",
                self.hosts_path
            );
        }

        self.fs
            .replace(&self.hosts_path, &stripped.content)
            .map_err(|e| GuardError::from_io(&self.hosts_path, e))?;
        self.remove_backup();

        info!("Removed block from {:?}", self.hosts_path);
        Ok(RevertOutcome::Removed {
            truncated: stripped.truncated,
        })
    }

    fn remove_backup(&self) {
        if let Some(ref backup) = self.backup_path {
            if self.fs.exists(backup) {
                if let Err(e) = self.fs.remove_file(backup) {
                    warn!("Failed to remove backup {:?}: {}", backup, e);
                }
            }
        }
    }
}

fn expiry_after(duration: Duration) -> DateTime<Utc> {
    let now = Utc::now();
    TimeDelta::from_std(duration)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
