//! Resolver configuration

use crate::symbolization::root_view::PROC_ROOT;
use std::path::PathBuf;
use std::time::Duration;

/// Default deadline for one cache build
pub const DEFAULT_FS_TIMEOUT: Duration = Duration::from_secs(5);

/// Default wait before looking for a JIT map again after finding none: look on
/// every call, so a map created after the first sampled frame is picked up
pub const DEFAULT_JIT_RETRY_INTERVAL: Duration = Duration::ZERO;

/// Where the resolver looks for process information and how long it waits
#[derive(Debug, Clone)]
pub struct UsymConfig {
    /// procfs mount point
    pub proc_root: PathBuf,
    /// Observer's own `/tmp`, last fallback for JIT maps
    pub host_tmp: PathBuf,
    /// Deadline for each cache build; `None` disables the helper thread
    pub fs_timeout: Option<Duration>,
    /// Minimum gap between JIT map discoveries for a process that had none;
    /// zero looks on every call
    pub jit_retry_interval: Duration,
}

impl Default for UsymConfig {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from(PROC_ROOT),
            host_tmp: PathBuf::from("/tmp"),
            fs_timeout: Some(DEFAULT_FS_TIMEOUT),
            jit_retry_interval: DEFAULT_JIT_RETRY_INTERVAL,
        }
    }
}

impl UsymConfig {
    #[must_use]
    pub fn with_proc_root(mut self, proc_root: impl Into<PathBuf>) -> Self {
        self.proc_root = proc_root.into();
        self
    }

    #[must_use]
    pub fn with_host_tmp(mut self, host_tmp: impl Into<PathBuf>) -> Self {
        self.host_tmp = host_tmp.into();
        self
    }

    /// A zero duration disables the deadline
    #[must_use]
    pub fn with_fs_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fs_timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    #[must_use]
    pub fn with_jit_retry_interval(mut self, interval: Duration) -> Self {
        self.jit_retry_interval = interval;
        self
    }
}
