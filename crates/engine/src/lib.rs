//! Backup engine abstraction and the restic implementation
//!
//! This crate provides:
//! - `Snapshot`: one stored snapshot as the backup tool reports it
//! - `Engine`: the operations the orchestration layer programs against
//! - `ResticEngine`: subprocess wrapper around the restic binary
//! - Platform helpers for mount points and unmounting

pub mod platform;
pub mod restic;
pub mod snapshot;

// Re-exports
pub use restic::{RepoSecret, ResticEngine};
pub use snapshot::Snapshot;

use std::path::{Path, PathBuf};
use std::process::Child;
use thiserror::Error;

/// Errors from backup engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    /// The external binary could not be started or its output read.
    #[error("failed to run {command}: {source}")]
    Io {
        command: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The command ran and exited unsuccessfully (-1 means killed by signal).
    #[error("restic {command} exited with code {code}: {stderr}")]
    CommandFailed {
        command: &'static str,
        code: i32,
        stderr: String,
    },

    /// Output that should have been machine-readable was not.
    #[error("unreadable {command} output: {source}")]
    InvalidOutput {
        command: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Operations every backup engine exposes.
///
/// Implementations wrap an external tool; all calls block until the tool
/// finishes (except `mount`, which hands back the running process).
pub trait Engine {
    /// Create a new repository.
    fn init(&self) -> Result<(), EngineError>;

    /// Snapshot `paths`, returning the new snapshot id when the engine
    /// reports one. Verbose runs stream progress to the terminal instead
    /// and return `None`.
    fn backup(
        &self,
        paths: &[PathBuf],
        exclude_patterns: &[String],
        tags: &[String],
        verbose: bool,
    ) -> Result<Option<String>, EngineError>;

    /// List every snapshot in the repository.
    fn snapshots(&self) -> Result<Vec<Snapshot>, EngineError>;

    /// Drop snapshots from the repository index.
    fn forget(&self, snapshot_ids: &[String]) -> Result<(), EngineError>;

    /// Delete data no snapshot references anymore.
    fn prune(&self) -> Result<(), EngineError>;

    /// Verify repository integrity.
    fn check(&self) -> Result<(), EngineError>;

    /// Restore `paths` from a snapshot into `target`.
    fn restore(&self, snapshot_id: &str, paths: &[String], target: &Path) -> Result<(), EngineError>;

    /// Mount the repository at `target`; returns the mount process.
    fn mount(&self, target: &Path) -> Result<Child, EngineError>;

    /// Unmount a previously mounted repository.
    fn unmount(&self, target: &Path) -> Result<(), EngineError>;
}
