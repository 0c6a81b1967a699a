//! Per-process address-range index
//!
//! Merges the executable's own section headers with the file-backed entries of
//! its memory map into one start-sorted list, and keeps the executable's
//! function symbols next to it.

use crate::domain::{Section, Symbol, SymbolizeError};
use crate::symbolization::elf_symbols::{function_symbols, native_sections};
use crate::symbolization::memory_maps::read_mapped_sections;
use crate::symbolization::RootView;
use log::{debug, info, warn};
use std::fs;
use std::io;
use std::path::PathBuf;

/// Address index and native symbols of one process
#[derive(Debug, Clone, Default)]
pub struct ElfCache {
    /// Native and mapped sections, sorted by start
    pub sections: Vec<Section>,
    /// Function symbols of the executable itself, sorted by start
    pub symbols: Vec<Symbol>,
}

/// Read the executable image through the process's root view.
///
/// Falls back to the kernel's `exe` link when the re-rooted path is not
/// readable, e.g. after the binary was replaced on disk.
fn read_executable(view: &RootView) -> Result<(PathBuf, Vec<u8>), SymbolizeError> {
    let exe_path = view
        .exe_path()
        .map_err(|source| SymbolizeError::ExecutableUnavailable { pid: view.pid(), source })?;
    debug!("{} executable: {}", view.pid(), exe_path.display());

    match fs::read(&exe_path) {
        Ok(data) => Ok((exe_path, data)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let link = view.exe_link();
            debug!("{} not readable ({e}), trying {}", exe_path.display(), link.display());
            let data = fs::read(&link).map_err(|source| {
                SymbolizeError::ExecutableUnavailable { pid: view.pid(), source }
            })?;
            Ok((link, data))
        }
        Err(source) => Err(SymbolizeError::ExecutableUnavailable { pid: view.pid(), source }),
    }
}

/// Build the address index for a process
///
/// # Errors
/// Returns an error if the executable or the maps file cannot be read. A
/// readable but unparsable executable only loses its native sections and symbols.
pub fn build(view: &RootView) -> Result<ElfCache, SymbolizeError> {
    let (exe_path, data) = read_executable(view)?;

    let (mut sections, symbols) = match object::File::parse(&*data) {
        Ok(obj) => (native_sections(&obj), function_symbols(&obj)),
        Err(e) => {
            warn!(
                "{}: {} is not a usable ELF image ({e}), indexing mappings only",
                view.pid(),
                exe_path.display()
            );
            (Vec::new(), Vec::new())
        }
    };
    let native_count = sections.len();

    sections.extend(read_mapped_sections(view)?);
    sections.sort_by_key(|section| section.start);

    info!(
        "{}: indexed {} native + {} mapped sections, {} symbols",
        view.pid(),
        native_count,
        sections.len() - native_count,
        symbols.len()
    );

    Ok(ElfCache { sections, symbols })
}
