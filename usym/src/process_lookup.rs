//! Find the pid of a process by name.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::Pid;
use crate::symbolization::RootView;

/// Result of process lookup.
#[derive(Debug)]
pub struct ProcessInfo {
    pub pid: Pid,
    /// Executable as seen through the process's root
    pub exe_path: PathBuf,
    pub command: String,
}

/// Find the single process called `name` under `proc_root`.
///
/// A process matches when its `comm` (from `<proc>/<pid>/stat`) or the
/// basename of its executable equals the basename of `name`. Processes whose
/// `exe` link is unreadable (kernel threads, other users without privileges)
/// and the calling process itself are ignored.
///
/// # Errors
/// - `proc_root` cannot be listed
/// - No process matches
/// - Several processes match (ambiguous)
pub fn find_process_by_name(proc_root: &Path, name: &str) -> Result<ProcessInfo> {
    let wanted = Path::new(name).file_name().and_then(|n| n.to_str()).unwrap_or(name);
    let own_pid = std::process::id();
    let mut matches: Vec<ProcessInfo> = Vec::new();

    let entries = fs::read_dir(proc_root)
        .with_context(|| format!("Failed to read {}", proc_root.display()))?;

    for entry in entries.flatten() {
        let Some(pid) = entry.file_name().to_str().and_then(|s| s.parse::<u32>().ok()) else {
            continue;
        };
        if pid == own_pid {
            continue;
        }

        let view = RootView::new(proc_root, Pid(pid));
        let Ok(exe_path) = view.exe_path() else {
            continue;
        };
        let Ok(stat) = fs::read_to_string(view.proc_dir().join("stat")) else {
            continue;
        };
        let Ok(command) = extract_comm(&stat) else {
            continue;
        };

        if is_match(&command, &exe_path, wanted) {
            matches.push(ProcessInfo { pid: Pid(pid), exe_path, command });
        }
    }

    match matches.len() {
        0 => bail!(
            "No process named '{name}' found.\n\
             Check running processes with: ps -C {wanted}"
        ),
        1 => Ok(matches.remove(0)),
        _ => {
            let list: Vec<String> =
                matches.iter().map(|m| format!("  {} ({})", m.pid.0, m.command)).collect();
            bail!(
                "Multiple processes named '{name}':\n{}\n\n\
                 Specify the PID explicitly: usym --pid <PID> ...",
                list.join("\n")
            )
        }
    }
}

/// Extract command name from `/proc/<pid>/stat`.
/// Format: "pid (comm) state ..."
fn extract_comm(stat_line: &str) -> Result<String> {
    let open = stat_line.find('(').context("Invalid stat format")?;
    let close = stat_line.rfind(')').context("Invalid stat format")?;
    if open >= close {
        bail!("Invalid stat format");
    }
    Ok(stat_line[open + 1..close].to_string())
}

/// `comm` is truncated to 15 bytes by the kernel, so a long name also matches
/// on its prefix.
fn is_match(command: &str, exe_path: &Path, wanted: &str) -> bool {
    let exe_basename = exe_path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let truncated = wanted.get(..15).unwrap_or(wanted);

    command == wanted || exe_basename == wanted || (wanted.len() > 15 && command == truncated)
}
