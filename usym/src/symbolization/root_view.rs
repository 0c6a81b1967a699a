//! Filesystem view of a traced process
//!
//! A containerized process sees its own mount namespace: `/usr/lib/libc.so.6`
//! inside the container is a different file from the observer's. The kernel
//! exposes the process's root as `/proc/<pid>/root`, so every path the process
//! reports (exe link target, maps entries, `/tmp`) is re-rooted there.

use crate::domain::Pid;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Default mount point of procfs
pub const PROC_ROOT: &str = "/proc";

/// Path translation for one process
#[derive(Debug, Clone)]
pub struct RootView {
    proc_root: PathBuf,
    pid: Pid,
}

impl RootView {
    pub fn new(proc_root: impl Into<PathBuf>, pid: Pid) -> Self {
        Self { proc_root: proc_root.into(), pid }
    }

    #[must_use]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// `<proc>/<pid>`
    #[must_use]
    pub fn proc_dir(&self) -> PathBuf {
        self.proc_root.join(self.pid.0.to_string())
    }

    /// `<proc>/<pid>/root`
    #[must_use]
    pub fn root_dir(&self) -> PathBuf {
        self.proc_dir().join("root")
    }

    #[must_use]
    pub fn maps_path(&self) -> PathBuf {
        self.proc_dir().join("maps")
    }

    #[must_use]
    pub fn exe_link(&self) -> PathBuf {
        self.proc_dir().join("exe")
    }

    /// The process's `/tmp`, seen from the observer
    #[must_use]
    pub fn tmp_dir(&self) -> PathBuf {
        self.resolve("/tmp")
    }

    /// Re-root a path as seen by the process.
    ///
    /// Absolute and relative inputs are both taken relative to the process
    /// root; `..` components are kept as-is and left to the kernel.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let mut rooted = self.root_dir();
        for component in path.as_ref().components() {
            match component {
                Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
                other => rooted.push(other.as_os_str()),
            }
        }
        rooted
    }

    /// Read the `exe` link and re-root its target
    ///
    /// # Errors
    /// Returns an error if the link cannot be read (process gone, permission denied)
    pub fn exe_path(&self) -> io::Result<PathBuf> {
        let target = fs::read_link(self.exe_link())?;
        Ok(self.resolve(target))
    }
}
