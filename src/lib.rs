//! # restraint - Time-boxed website blocking
//!
//! Blocks a user-chosen list of websites for a fixed duration by adding
//! null-address entries to the system hosts file, then removes exactly those
//! entries when the timer ends, is cancelled, or the process is interrupted.
//!
//! ## Features
//!
//! - **Scoped Edits** - Only lines between our own markers are ever touched
//! - **Byte-exact Revert** - Content outside the managed region survives unchanged
//! - **Fail-open** - A damaged region is removed through end of file rather than left behind
//! - **Restart Recovery** - The expiry is written into the region so a new process can resume
//! - **Atomic Writes** - Reverts replace the hosts file via temp file + rename
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        restraint                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CLI (clap)                                                 │
//! │    └── Commands: start, stop, status, resume, list...       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Config (serde_yaml) + Blocklist file                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Compiler                                                   │
//! │    └── Raw text -> ordered, deduplicated host entries       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  HostsFileGuard                                             │
//! │    ├── region: marker rendering, parsing, stripping         │
//! │    ├── lock: in-process mutex + fs2 file lock               │
//! │    └── FileSystem trait (append, atomic replace)            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Session (tokio)                                            │
//! │    └── Expiry timer, cancel, countdown ticks                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use restraint::{compile, HostsFileGuard};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let entries = compile("example.com\nfoo.com\n");
//!
//!     let guard = HostsFileGuard::new("/etc/hosts");
//!     let session = guard.apply(&entries, Duration::from_secs(45 * 60))?;
//!
//!     // Lifted automatically at expiry, or now:
//!     session.cancel().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`blocklist`] - The user's blocklist file
//! - [`cli`] - Command-line interface definitions
//! - [`commands`] - CLI command implementations
//! - [`compiler`] - Blocklist text to host entries
//! - [`config`] - Configuration parsing and validation
//! - [`error`] - Guard error types
//! - [`fs_abstraction`] - Filesystem trait for testability
//! - [`guard`] - Hosts file ownership: apply, revert, inspect, resume
//! - [`lock`] - Cross-process file locking
//! - [`region`] - Managed region format
//! - [`session`] - Timed block sessions
//! - [`signal`] - Interrupt handling
//! - [`utils`] - Duration parsing and formatting

pub mod blocklist;
pub mod cli;
pub mod commands;
pub mod compiler;
pub mod config;
pub mod error;
pub mod fs_abstraction;
pub mod guard;
pub mod lock;
pub mod region;
pub mod session;
pub mod signal;
pub mod utils;

pub use compiler::{compile, BlockSet, HostEntry};
pub use config::Config;
pub use error::GuardError;
pub use guard::{BlockStatus, HostsFileGuard};
pub use session::{EndReason, GuardEvent, RevertOutcome, SessionEnd, SessionHandle};
