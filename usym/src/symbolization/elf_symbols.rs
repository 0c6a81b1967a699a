//! Function symbols and section headers from ELF images

use crate::domain::{Section, Symbol, SymbolizeError};
use log::debug;
use object::{Object, ObjectSection, ObjectSymbol, SymbolKind};
use std::fs;
use std::path::Path;

/// Symbol table of one shared library
#[derive(Debug, Clone, Default)]
pub struct LibCache {
    pub symbols: Vec<Symbol>,
}

/// Collect function symbols from `.dynsym` and `.symtab`, sorted by start.
///
/// Either table may be missing (stripped binaries keep only `.dynsym`). A
/// function present in both tables appears twice.
pub fn function_symbols(obj: &object::File<'_>) -> Vec<Symbol> {
    let dynamic = obj.dynamic_symbols().filter(|sym| sym.kind() == SymbolKind::Text);
    let regular = obj.symbols().filter(|sym| sym.kind() == SymbolKind::Text);

    let mut symbols: Vec<Symbol> = dynamic
        .chain(regular)
        .map(|sym| Symbol::new(sym.name().unwrap_or_default(), sym.address(), sym.size()))
        .collect();

    // Stable sort keeps dynsym entries ahead of symtab copies at the same start
    symbols.sort_by_key(|sym| sym.start);
    symbols
}

/// One native section per ELF section header
pub fn native_sections(obj: &object::File<'_>) -> Vec<Section> {
    obj.sections()
        .map(|section| {
            Section::native(section.name().unwrap_or_default(), section.address(), section.size())
        })
        .collect()
}

/// Read a shared library from disk and extract its function symbols
///
/// # Errors
/// Returns an error if the file cannot be read or is not a parsable ELF image
pub fn load_library(path: &Path) -> Result<LibCache, SymbolizeError> {
    let data = fs::read(path).map_err(|e| SymbolizeError::io(path, e))?;
    let obj = object::File::parse(&*data)
        .map_err(|source| SymbolizeError::ElfParse { path: path.to_path_buf(), source })?;

    let symbols = function_symbols(&obj);
    debug!("{} function symbols in {}", symbols.len(), path.display());
    Ok(LibCache { symbols })
}
