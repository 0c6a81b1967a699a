//! Point-in-interval lookup over start-sorted ranges

use crate::domain::{Resolution, Section, Symbol};

/// A half-open address range `[start, end)`
pub trait AddressRange {
    fn start(&self) -> u64;
    fn end(&self) -> u64;
}

impl AddressRange for Symbol {
    fn start(&self) -> u64 {
        self.start
    }

    fn end(&self) -> u64 {
        Symbol::end(self)
    }
}

impl AddressRange for Section {
    fn start(&self) -> u64 {
        self.start
    }

    fn end(&self) -> u64 {
        self.end
    }
}

/// Find the rightmost entry starting at or below `addr` and check that it
/// actually covers `addr`.
///
/// `items` must be sorted ascending by start. Overlapping entries are not
/// searched beyond the rightmost candidate.
pub fn find_containing<T: AddressRange>(items: &[T], addr: u64) -> Option<&T> {
    let index = items.partition_point(|item| item.start() <= addr);
    let candidate = items.get(index.checked_sub(1)?)?;
    (addr < candidate.end()).then_some(candidate)
}

/// Look up `addr` in a symbol table.
///
/// Never returns [`Resolution::Unresolved`]: the caller already knows which
/// module the table belongs to, so a miss is [`Resolution::Unknown`].
pub fn search_symbol(symbols: &[Symbol], addr: u64) -> Resolution {
    match find_containing(symbols, addr) {
        Some(sym) if !sym.name.is_empty() => Resolution::Symbol(sym.name.clone()),
        _ => Resolution::Unknown,
    }
}
