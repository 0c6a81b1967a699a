//! Structured error types for usym
//!
//! Using thiserror for automatic Display implementation and error chaining.
//! These errors never reach a resolver caller; they are logged and turned into
//! a degraded [`Resolution`](super::Resolution).

use super::types::Pid;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SymbolizeError {
    #[error("Process {pid} has no readable executable: {source}")]
    ExecutableUnavailable {
        pid: Pid,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse ELF image {}: {source}", .path.display())]
    ElfParse {
        path: PathBuf,
        #[source]
        source: object::Error,
    },

    #[error("No perf map file found for process {0}")]
    PerfMapNotFound(Pid),

    #[error("{what} did not finish within {after:?}")]
    Timeout { what: String, after: Duration },

    #[error("{0} is still running from an earlier call")]
    StillRunning(String),

    #[error("{0} worker exited without a result")]
    WorkerLost(String),

    #[error("Failed to spawn filesystem worker: {0}")]
    Spawn(#[source] io::Error),
}

impl SymbolizeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SymbolizeError::Io { path: path.into(), source }
    }

    /// True when the error is a missed deadline
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, SymbolizeError::Timeout { .. })
    }
}
