//! Formatting of resolved frames

use rustc_demangle::demangle;
use serde::Serialize;

use crate::domain::{Pid, Resolution};

/// Shown for addresses nothing is known about
pub const UNRESOLVED_MARKER: &str = "??";

/// One resolved address, as printed with `--json`
#[derive(Debug, Serialize)]
pub struct FrameReport {
    pub pid: u32,
    pub address: String,
    pub status: &'static str,
    pub name: Option<String>,
}

impl FrameReport {
    #[must_use]
    pub fn new(pid: Pid, addr: u64, resolution: &Resolution, demangled: bool) -> Self {
        let name = match resolution {
            Resolution::Unresolved => None,
            other => Some(display_name(other, demangled)),
        };
        Self { pid: pid.0, address: format!("0x{addr:x}"), status: resolution.status(), name }
    }
}

/// Demangle a symbol name if it is a Rust mangled name; other names pass through
#[must_use]
pub fn demangle_symbol(symbol: &str) -> String {
    format!("{:#}", demangle(symbol))
}

/// Human-readable name for a resolution
#[must_use]
pub fn display_name(resolution: &Resolution, demangled: bool) -> String {
    match resolution {
        Resolution::Symbol(name) if demangled => demangle_symbol(name),
        Resolution::Unresolved => UNRESOLVED_MARKER.to_string(),
        other => other.name().to_string(),
    }
}

/// `0x<addr> <name>` line for plain output
#[must_use]
pub fn format_line(addr: u64, resolution: &Resolution, demangled: bool) -> String {
    format!("0x{addr:016x} {}", display_name(resolution, demangled))
}
