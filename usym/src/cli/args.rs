//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::symbolization::UsymConfig;

#[derive(Parser, Debug)]
#[command(
    name = "usym",
    about = "Resolve user-space stack addresses of a running process to symbol names",
    after_help = "\
EXAMPLES:
    sudo usym --pid 1234 0x7f1c2b41a3c0 55d0c0a01a20    Resolve two addresses
    sudo usym --name node < frames.txt                  Addresses from stdin, one per line
    sudo usym --pid 1234 --json --demangle 0x401136     JSON lines, demangled names"
)]
pub struct Args {
    /// Process ID whose addresses are resolved
    #[arg(short, long, conflicts_with = "name")]
    pub pid: Option<u32>,

    /// Process name to resolve against (must match exactly one process)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Hex addresses, with or without 0x (read from stdin when omitted)
    #[arg(value_name = "ADDRESS")]
    pub addresses: Vec<String>,

    /// procfs mount point
    #[arg(long, value_name = "DIR", default_value = "/proc")]
    pub proc_root: PathBuf,

    /// Host temp directory searched last for perf-<pid>.map
    #[arg(long, value_name = "DIR", default_value = "/tmp")]
    pub host_tmp: PathBuf,

    /// Deadline for each cache build in milliseconds (0 = unbounded)
    #[arg(long, value_name = "MS", default_value = "5000")]
    pub timeout_ms: u64,

    /// Demangle Rust symbol names
    #[arg(long)]
    pub demangle: bool,

    /// Print one JSON object per address
    #[arg(long)]
    pub json: bool,

    /// Print resolver statistics to stderr on exit
    #[arg(long)]
    pub stats: bool,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}

/// Neither `--pid` nor `--name` was given
#[derive(Debug, thiserror::Error)]
#[error(
    "Missing required argument: --pid or --name\n\n\
     Usage:\n  \
     usym --pid 1234 0x7f1c2b41a3c0\n  \
     usym --name node < frames.txt\n\n\
     Run 'usym --help' for more options"
)]
pub struct MissingTarget;

impl Args {
    /// Resolver configuration described by these arguments
    #[must_use]
    pub fn config(&self) -> UsymConfig {
        UsymConfig::default()
            .with_proc_root(&self.proc_root)
            .with_host_tmp(&self.host_tmp)
            .with_fs_timeout(Some(Duration::from_millis(self.timeout_ms)))
    }
}

/// Parse a hex address; a `0x`/`0X` prefix is optional
#[must_use]
pub fn parse_address(text: &str) -> Option<u64> {
    let text = text.trim();
    let digits =
        text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")).unwrap_or(text);
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}
