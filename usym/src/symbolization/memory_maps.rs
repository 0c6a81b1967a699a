//! Memory mapping utilities for process address space analysis
//!
//! This module parses `/proc/<pid>/maps` into [`Section`]s for every mapping
//! backed by a real file. Shared libraries show up here with the address they
//! were loaded at, which is what lets a raw instruction pointer be attributed
//! to a library at all.
//!
//! Line format: `start-end perms offset dev inode [pathname]`

use crate::domain::{Section, SymbolizeError};
use crate::symbolization::RootView;
use log::debug;
use std::fs;

/// Pathnames that never refer to a file we could read symbols from
const EXCLUDED_PATHS: [&str; 10] = [
    "anon_inode:[perf_event]",
    "[stack]",
    "[vvar]",
    "[vdso]",
    "[vsyscall]",
    "[heap]",
    "//anon",
    "/dev/zero",
    "/anon_hugepage",
    "/SYSV",
];

/// Pathname prefixes with the same meaning, for entries that carry a suffix
/// such as a key or thread id (`/SYSV00000000`, `[stack:1234]`, `anon_inode:...`)
const EXCLUDED_PREFIXES: [&str; 5] = ["/SYSV", "[stack:", "[anon:", "anon_inode:", "/memfd:"];

const DELETED_SUFFIX: &str = " (deleted)";

/// Check whether a maps pathname should be left out of the address index
#[must_use]
pub fn is_excluded(path: &str) -> bool {
    EXCLUDED_PATHS.contains(&path)
        || EXCLUDED_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
        || path.ends_with(DELETED_SUFFIX)
}

/// Parse one maps line into a mapped section
///
/// Returns `None` for lines with fewer than six fields, an unparsable range,
/// or an excluded pathname.
#[must_use]
pub fn parse_maps_line(line: &str) -> Option<Section> {
    // Parse the line: "start-end perms offset dev inode pathname"
    let mut rest = line.trim_start();
    let mut fields = Vec::with_capacity(5);
    for _ in 0..5 {
        let end = rest.find(char::is_whitespace)?;
        fields.push(&rest[..end]);
        rest = rest[end..].trim_start();
    }
    // Pathnames may contain spaces; keep everything after the inode
    let path = rest.trim_end();
    if path.is_empty() || is_excluded(path) {
        return None;
    }

    let (start, end) = fields[0].split_once('-')?;
    let start = u64::from_str_radix(start, 16).ok()?;
    let end = u64::from_str_radix(end, 16).ok()?;
    if end < start {
        return None;
    }

    Some(Section::mapped(path, start, end))
}

/// Parse the full contents of a maps file, skipping unusable lines
#[must_use]
pub fn parse_mapped_sections(maps: &str) -> Vec<Section> {
    maps.lines().filter_map(parse_maps_line).collect()
}

/// Read and parse `/proc/<pid>/maps` for the given process
///
/// # Errors
/// Returns an error if the maps file cannot be read
pub fn read_mapped_sections(view: &RootView) -> Result<Vec<Section>, SymbolizeError> {
    let maps_path = view.maps_path();
    let raw = fs::read(&maps_path).map_err(|e| SymbolizeError::io(&maps_path, e))?;
    let sections = parse_mapped_sections(&String::from_utf8_lossy(&raw));
    debug!("{} file-backed mappings in {}", sections.len(), maps_path.display());
    Ok(sections)
}
