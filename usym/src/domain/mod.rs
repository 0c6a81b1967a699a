//! Domain model for usym
//!
//! This module contains core domain types and errors that provide:
//! - Compile-time safety via newtype pattern
//! - An explicit three-valued resolution result
//! - Structured error handling

pub mod errors;
pub mod types;

pub use types::{Pid, Resolution, Section, SectionKind, Symbol, UNKNOWN_SYMBOL};

pub use errors::SymbolizeError;
