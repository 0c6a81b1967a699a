//! JIT symbol maps (`/tmp/perf-<pid>.map`)
//!
//! Managed runtimes (V8 with `--perf-basic-prof`, the JVM with perf-map-agent,
//! .NET with `DOTNET_PerfMapEnabled`) publish the code they compile at runtime
//! as a text file, one line per code range:
//!
//! ```text
//! 3f2c8b83140 3a LazyCompile:~processTicksAndRejections node:internal/process/task_queues:65
//! ```
//!
//! The file only grows while the process runs, so a full reparse whenever its
//! modification time moves is always correct.
//!
//! Inside a container the pid in the file name is the container-namespace pid,
//! which the observer does not know. Discovery therefore scans the process's
//! own `/tmp` first and only then guesses names from the observer's pid.

use crate::domain::{Symbol, SymbolizeError};
use crate::symbolization::RootView;
use log::debug;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const PERF_MAP_PREFIX: &str = "perf-";
const PERF_MAP_SUFFIX: &str = ".map";

/// Last successfully parsed JIT map of a process
#[derive(Debug, Clone)]
pub struct PerfMapInfo {
    /// Sorted by start
    pub symbols: Vec<Symbol>,
    pub mod_time: SystemTime,
    pub file_path: PathBuf,
}

/// `perf-<digits>.map`
#[must_use]
pub fn is_perf_map_name(name: &str) -> bool {
    name.strip_prefix(PERF_MAP_PREFIX)
        .and_then(|rest| rest.strip_suffix(PERF_MAP_SUFFIX))
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

fn perf_map_name(pid: u32) -> String {
    format!("{PERF_MAP_PREFIX}{pid}{PERF_MAP_SUFFIX}")
}

fn parse_hex(field: &str) -> Option<u64> {
    let digits = field.strip_prefix("0x").unwrap_or(field);
    u64::from_str_radix(digits, 16).ok()
}

/// Parse one `<hex start> <hex size> <name...>` line
///
/// Only the first two spaces split; the name keeps any further spaces.
#[must_use]
pub fn parse_line(line: &str) -> Option<Symbol> {
    let mut parts = line.splitn(3, ' ');
    let start = parse_hex(parts.next()?)?;
    let size = parse_hex(parts.next()?)?;
    let name = parts.next()?;
    Some(Symbol::new(name, start, size))
}

/// Parse a whole map, skipping malformed lines, and sort the result
///
/// # Errors
/// Returns an error only if reading from `reader` fails
pub fn parse_perf_map<R: BufRead>(reader: R) -> std::io::Result<Vec<Symbol>> {
    let mut symbols = Vec::new();
    for line in reader.split(b'\n') {
        let line = line?;
        let line = String::from_utf8_lossy(&line);
        if let Some(sym) = parse_line(line.trim_end_matches('\r')) {
            symbols.push(sym);
        }
    }
    symbols.sort_by_key(|sym| sym.start);
    Ok(symbols)
}

/// Modification time of a map file
///
/// # Errors
/// Returns an error if the file cannot be stat'ed
pub fn modified(path: &Path) -> std::io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}

/// Stat and parse one map file
///
/// The modification time is taken before reading, so an append racing with
/// the read is picked up by the next staleness check.
///
/// # Errors
/// Returns an error if the file cannot be stat'ed, opened or read
pub fn load(path: &Path) -> Result<PerfMapInfo, SymbolizeError> {
    let mod_time = modified(path).map_err(|e| SymbolizeError::io(path, e))?;
    let file = File::open(path).map_err(|e| SymbolizeError::io(path, e))?;
    let symbols = parse_perf_map(BufReader::new(file)).map_err(|e| SymbolizeError::io(path, e))?;
    Ok(PerfMapInfo { symbols, mod_time, file_path: path.to_path_buf() })
}

/// Map files in the process's `/tmp`, the one named after `pid` first
fn scan_candidates(view: &RootView) -> Vec<PathBuf> {
    let tmp = view.tmp_dir();
    let Ok(entries) = fs::read_dir(&tmp) else {
        return Vec::new();
    };

    let own_name = perf_map_name(view.pid().0);
    let mut names: Vec<String> = entries
        .flatten()
        .filter(|entry| entry.file_type().is_ok_and(|kind| !kind.is_dir()))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| is_perf_map_name(name))
        .collect();
    names.sort_by(|a, b| (*a != own_name).cmp(&(*b != own_name)).then_with(|| a.cmp(b)));

    names.into_iter().map(|name| tmp.join(name)).collect()
}

/// Find and load the JIT map of a process
///
/// Order: every `perf-<digits>.map` in the process's own `/tmp`, then
/// `<root>/tmp/perf-<pid>.map`, then `<host_tmp>/perf-<pid>.map`.
///
/// # Errors
/// Returns [`SymbolizeError::PerfMapNotFound`] if no candidate can be loaded
pub fn discover(view: &RootView, host_tmp: &Path) -> Result<PerfMapInfo, SymbolizeError> {
    let name = perf_map_name(view.pid().0);
    let guesses = [view.tmp_dir().join(&name), host_tmp.join(&name)];

    for path in scan_candidates(view).into_iter().chain(guesses) {
        match load(&path) {
            Ok(info) => {
                debug!(
                    "{}: loaded {} JIT symbols from {}",
                    view.pid(),
                    info.symbols.len(),
                    path.display()
                );
                return Ok(info);
            }
            Err(e) => debug!("{}: skipping perf map candidate: {e}", view.pid()),
        }
    }

    Err(SymbolizeError::PerfMapNotFound(view.pid()))
}
