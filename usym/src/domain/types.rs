//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers and records keep process ids, address ranges and
//! resolution outcomes distinct in function signatures.

use serde::Serialize;
use std::fmt;

/// Placeholder name for an address inside a known module that matches no symbol
pub const UNKNOWN_SYMBOL: &str = "<unknown>";

/// Process ID
///
/// The pid as seen by the observer (host pid namespace).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Pid(pub u32);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PID:{}", self.0)
    }
}

impl From<u32> for Pid {
    fn from(pid: u32) -> Self {
        Pid(pid)
    }
}

impl From<i32> for Pid {
    #[allow(clippy::cast_sign_loss)]
    fn from(pid: i32) -> Self {
        Pid(pid as u32)
    }
}

/// A named function range `[start, start + size)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub start: u64,
    pub size: u64,
}

impl Symbol {
    pub fn new(name: impl Into<String>, start: u64, size: u64) -> Self {
        Self { name: name.into(), start, size }
    }

    /// Exclusive upper bound
    #[must_use]
    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.size)
    }
}

/// Where a [`Section`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    /// A section header of the traced process's own executable
    Native,
    /// A file-backed entry of the process's memory map
    Mapped,
}

/// A contiguous region `[start, end)` of a process's address space
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// ELF section name for native sections, backing path for mapped ones
    pub name: String,
    pub start: u64,
    pub end: u64,
    pub kind: SectionKind,
}

impl Section {
    pub fn native(name: impl Into<String>, start: u64, size: u64) -> Self {
        Self {
            name: name.into(),
            start,
            end: start.saturating_add(size),
            kind: SectionKind::Native,
        }
    }

    pub fn mapped(path: impl Into<String>, start: u64, end: u64) -> Self {
        Self { name: path.into(), start, end, kind: SectionKind::Mapped }
    }

    #[must_use]
    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.start && addr < self.end
    }
}

/// Outcome of resolving one address
///
/// Keeps "we know the module but not the symbol" apart from "we know nothing
/// about this address".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A concrete symbol name
    Symbol(String),
    /// Inside a known module, no covering symbol
    Unknown,
    /// No data for this address at all
    Unresolved,
}

impl Resolution {
    /// String form used by callers that expect sentinel names:
    /// the name, [`UNKNOWN_SYMBOL`], or an empty string.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Resolution::Symbol(name) => name,
            Resolution::Unknown => UNKNOWN_SYMBOL,
            Resolution::Unresolved => "",
        }
    }

    #[must_use]
    pub fn into_name(self) -> String {
        match self {
            Resolution::Symbol(name) => name,
            other => other.name().to_string(),
        }
    }

    #[must_use]
    pub fn is_symbol(&self) -> bool {
        matches!(self, Resolution::Symbol(_))
    }

    /// Short status tag for reports
    #[must_use]
    pub fn status(&self) -> &'static str {
        match self {
            Resolution::Symbol(_) => "symbol",
            Resolution::Unknown => "unknown",
            Resolution::Unresolved => "unresolved",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
