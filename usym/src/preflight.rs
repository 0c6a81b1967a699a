//! Pre-flight checks for usym
//!
//! Reading another process's executable through `/proc/<pid>/root` and its
//! memory map needs ptrace-level access. These checks turn the resulting
//! silent "??" output into clear, actionable messages up front.

#![allow(unsafe_code)] // geteuid() requires unsafe

use anyhow::{bail, Context, Result};
use object::{Object, ObjectSection};
use std::fs;

use crate::domain::Pid;
use crate::symbolization::RootView;

/// Run all checks for the target process
///
/// # Errors
/// Returns an error if the process does not exist or its maps are unreadable
pub fn run_preflight_checks(view: &RootView, quiet: bool) -> Result<()> {
    check_process_exists(view)?;
    check_proc_access(view)?;
    if !quiet {
        warn_if_unprivileged();
        warn_if_stripped(view);
    }
    Ok(())
}

fn warn_if_unprivileged() {
    if unsafe { libc::geteuid() } != 0 {
        eprintln!(
            "warning: not running as root; processes of other users and containers \
             will resolve to ??"
        );
    }
}

/// Warn when the executable carries no `.symtab`, only exported functions
fn warn_if_stripped(view: &RootView) {
    let Ok(exe_path) = view.exe_path() else {
        return;
    };
    let Ok(data) = fs::read(&exe_path) else {
        // The resolver has its own fallbacks; let it report
        return;
    };
    let Ok(obj) = object::File::parse(&*data) else {
        return;
    };

    let has_symtab = obj.section_by_name(".symtab").is_some_and(|s| s.size() > 0);
    if !has_symtab {
        eprintln!(
            "warning: {} is stripped, only exported functions will resolve",
            exe_path.display()
        );
    }
}

/// Check if the target process exists
///
/// # Errors
/// Returns an error if `<proc>/<pid>` does not exist
pub fn check_process_exists(view: &RootView) -> Result<()> {
    let Pid(pid) = view.pid();
    if !view.proc_dir().exists() {
        bail!(
            "Process {pid} not found.\n\n\
             Is the process still running? Check with: ps -p {pid}"
        );
    }
    Ok(())
}

/// Check if we can read the process's memory maps
///
/// # Errors
/// Returns an error if `<proc>/<pid>/maps` cannot be read
pub fn check_proc_access(view: &RootView) -> Result<()> {
    let Pid(pid) = view.pid();
    let maps_path = view.maps_path();
    fs::read(&maps_path).with_context(|| {
        format!(
            "Cannot read {}\n\n\
             This usually means:\n\
             - The process exited (check: ps -p {pid})\n\
             - usym lacks privileges for this process (run with sudo)\n\
             - /proc is not mounted",
            maps_path.display()
        )
    })?;
    Ok(())
}
