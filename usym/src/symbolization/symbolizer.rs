//! The user-space stack resolver
//!
//! [`Usym`] turns a `(pid, address)` pair into a symbol name. Lookup order:
//!
//! 1. the process's JIT map, if it publishes one and the address hits a named
//!    range there;
//! 2. the process's address index: a native section resolves against the
//!    executable's own symbols, a mapped file resolves against that file's
//!    symbols at `address - mapping start`.
//!
//! Every cache build is deadline-bounded and every failure degrades the
//! result instead of propagating.

use crate::domain::{Pid, Resolution, SectionKind, SymbolizeError};
use crate::symbolization::address_index::{self, ElfCache};
use crate::symbolization::bounded::BoundedRunner;
use crate::symbolization::cache::{lock, OnceMap};
use crate::symbolization::elf_symbols::{self, LibCache};
use crate::symbolization::lookup::{find_containing, search_symbol};
use crate::symbolization::perf_map::{self, PerfMapInfo};
use crate::symbolization::{RootView, UsymConfig};
use log::{debug, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

#[derive(Debug, Default)]
struct Counters {
    elf_builds: AtomicU64,
    elf_failures: AtomicU64,
    lib_loads: AtomicU64,
    lib_failures: AtomicU64,
    jit_loads: AtomicU64,
    jit_reuses: AtomicU64,
    jit_misses: AtomicU64,
    timeouts: AtomicU64,
    skipped: AtomicU64,
}

/// Snapshot of resolver activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UsymStats {
    /// Address indexes built
    pub elf_builds: u64,
    pub elf_failures: u64,
    /// Library symbol tables loaded
    pub lib_loads: u64,
    pub lib_failures: u64,
    /// JIT maps (re)read from disk
    pub jit_loads: u64,
    /// JIT lookups served from an unchanged map
    pub jit_reuses: u64,
    /// JIT discoveries that found nothing
    pub jit_misses: u64,
    /// Cache builds abandoned at the deadline
    pub timeouts: u64,
    /// Builds not started because an abandoned one for the same key is still running
    pub skipped: u64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

/// User-space symbol resolver with per-process and per-library caches
///
/// Cheap to share: wrap in an [`Arc`] and call from any number of threads.
#[derive(Debug, Default)]
pub struct Usym {
    config: UsymConfig,
    elf_caches: OnceMap<Pid, ElfCache>,
    lib_caches: OnceMap<PathBuf, LibCache>,
    perf_maps: OnceMap<Pid, PerfMapInfo>,
    /// Last failed JIT discovery per process
    jit_misses: Mutex<HashMap<Pid, Instant>>,
    runner: BoundedRunner,
    counters: Counters,
}

impl Usym {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: UsymConfig) -> Self {
        Self { config, ..Self::default() }
    }

    #[must_use]
    pub fn config(&self) -> &UsymConfig {
        &self.config
    }

    fn view(&self, pid: Pid) -> RootView {
        RootView::new(&self.config.proc_root, pid)
    }

    /// Resolve to a plain name: the symbol, `"<unknown>"` inside a known
    /// module, or `""` when nothing is known about the address.
    pub fn resolve_ustack(&self, addr: u64, pid: u32) -> String {
        self.resolve(addr, Pid(pid)).into_name()
    }

    /// Resolve one stack frame address of `pid`
    pub fn resolve(&self, addr: u64, pid: Pid) -> Resolution {
        debug!("resolve 0x{addr:x} {pid}");
        let view = self.view(pid);

        if let Some(name) = self.resolve_jit(addr, &view) {
            return Resolution::Symbol(name);
        }
        self.resolve_static(addr, &view)
    }

    fn resolve_jit(&self, addr: u64, view: &RootView) -> Option<String> {
        let info = self.perf_map(view)?;
        match search_symbol(&info.symbols, addr) {
            Resolution::Symbol(name) => {
                debug!("0x{addr:x} resolved from {}", info.file_path.display());
                Some(name)
            }
            // Native runtime frames (libc, the engine itself) live outside the JIT map
            _ => None,
        }
    }

    fn resolve_static(&self, addr: u64, view: &RootView) -> Resolution {
        let elf = match self.elf_cache(view) {
            Ok(elf) => elf,
            Err(e) => {
                debug!("{}: no address index: {e}", view.pid());
                return Resolution::Unresolved;
            }
        };

        let Some(section) = find_containing(&elf.sections, addr) else {
            debug!("0x{addr:x} is outside every known section of {}", view.pid());
            return Resolution::Unresolved;
        };

        match section.kind {
            SectionKind::Native => search_symbol(&elf.symbols, addr),
            SectionKind::Mapped => {
                let lib_path = view.resolve(&section.name);
                let relative = addr - section.start;
                match self.lib_cache(&lib_path) {
                    Ok(lib) => search_symbol(&lib.symbols, relative),
                    Err(e) => {
                        debug!("{}: {e}", view.pid());
                        Resolution::Unresolved
                    }
                }
            }
        }
    }

    fn record<T>(&self, result: &Result<T, SymbolizeError>, ok: &AtomicU64, failed: &AtomicU64) {
        match result {
            Ok(_) => bump(ok),
            Err(SymbolizeError::StillRunning(what)) => {
                bump(failed);
                bump(&self.counters.skipped);
                debug!("{what} is still blocked, not retrying yet");
            }
            Err(e) => {
                bump(failed);
                if e.is_timeout() {
                    bump(&self.counters.timeouts);
                    warn!("{e}");
                }
            }
        }
    }

    fn elf_cache(&self, view: &RootView) -> Result<Arc<ElfCache>, SymbolizeError> {
        self.elf_caches.get_or_try_insert_with(&view.pid(), || {
            let owned = view.clone();
            let what = format!("address index for {}", view.pid());
            let result = self
                .runner
                .run(self.config.fs_timeout, &what, move || address_index::build(&owned));
            self.record(&result, &self.counters.elf_builds, &self.counters.elf_failures);
            result
        })
    }

    fn lib_cache(&self, lib_path: &Path) -> Result<Arc<LibCache>, SymbolizeError> {
        self.lib_caches.get_or_try_insert_with(&lib_path.to_path_buf(), || {
            let owned = lib_path.to_path_buf();
            let what = format!("symbols of {}", lib_path.display());
            let result = self
                .runner
                .run(self.config.fs_timeout, &what, move || elf_symbols::load_library(&owned));
            self.record(&result, &self.counters.lib_loads, &self.counters.lib_failures);
            result
        })
    }

    /// Current JIT map of a process, reloaded when its file changed
    fn perf_map(&self, view: &RootView) -> Option<Arc<PerfMapInfo>> {
        let pid = view.pid();
        let slot = self.perf_maps.slot(&pid);
        let mut entry = lock(&slot);

        if let Some(info) = entry.clone() {
            let path = info.file_path.display();
            match perf_map::modified(&info.file_path) {
                Ok(mod_time) if mod_time == info.mod_time => {
                    bump(&self.counters.jit_reuses);
                    return Some(info);
                }
                Ok(_) => debug!("{pid}: {path} changed, reloading"),
                Err(e) => debug!("{pid}: {path} is gone ({e}), rediscovering"),
            }
        } else if self.recently_missed(pid) {
            drop(entry);
            self.perf_maps.discard_if_empty(&pid, &slot);
            return None;
        }

        let owned = view.clone();
        let host_tmp = self.config.host_tmp.clone();
        let what = format!("perf map for {pid}");
        let result = self
            .runner
            .run(self.config.fs_timeout, &what, move || perf_map::discover(&owned, &host_tmp));
        self.record(&result, &self.counters.jit_loads, &self.counters.jit_misses);

        match result {
            Ok(info) => {
                lock(&self.jit_misses).remove(&pid);
                let info = Arc::new(info);
                *entry = Some(Arc::clone(&info));
                Some(info)
            }
            Err(e) => {
                debug!("{pid}: no JIT table: {e}");
                self.note_miss(pid);
                *entry = None;
                drop(entry);
                self.perf_maps.discard_if_empty(&pid, &slot);
                None
            }
        }
    }

    /// True while a failed discovery for `pid` is younger than the retry interval
    fn recently_missed(&self, pid: Pid) -> bool {
        let interval = self.config.jit_retry_interval;
        if interval.is_zero() {
            return false;
        }
        lock(&self.jit_misses).get(&pid).is_some_and(|missed| missed.elapsed() < interval)
    }

    /// Remember a failed discovery; a no-op unless a retry interval is set
    fn note_miss(&self, pid: Pid) {
        let interval = self.config.jit_retry_interval;
        if interval.is_zero() {
            return;
        }
        let mut misses = lock(&self.jit_misses);
        misses.retain(|_, missed| missed.elapsed() < interval);
        misses.insert(pid, Instant::now());
    }

    /// Drop everything cached for a process, e.g. when it exited.
    ///
    /// Library tables are shared between processes and stay cached.
    pub fn forget_process(&self, pid: Pid) {
        let had_index = self.elf_caches.remove(&pid);
        let had_jit = self.perf_maps.remove(&pid);
        lock(&self.jit_misses).remove(&pid);
        debug!("{pid}: forgotten (index: {had_index}, jit: {had_jit})");
    }

    /// Drop a cached library table; returns whether one was cached
    pub fn forget_library(&self, lib_path: &Path) -> bool {
        self.lib_caches.remove(&lib_path.to_path_buf())
    }

    /// Drop all caches
    pub fn clear(&self) {
        self.elf_caches.clear();
        self.lib_caches.clear();
        self.perf_maps.clear();
        lock(&self.jit_misses).clear();
    }

    /// Number of processes with a built address index
    #[must_use]
    pub fn cached_processes(&self) -> usize {
        self.elf_caches.len()
    }

    /// Number of libraries with a loaded symbol table
    #[must_use]
    pub fn cached_libraries(&self) -> usize {
        self.lib_caches.len()
    }

    #[must_use]
    pub fn stats(&self) -> UsymStats {
        let c = &self.counters;
        UsymStats {
            elf_builds: c.elf_builds.load(Ordering::Relaxed),
            elf_failures: c.elf_failures.load(Ordering::Relaxed),
            lib_loads: c.lib_loads.load(Ordering::Relaxed),
            lib_failures: c.lib_failures.load(Ordering::Relaxed),
            jit_loads: c.jit_loads.load(Ordering::Relaxed),
            jit_reuses: c.jit_reuses.load(Ordering::Relaxed),
            jit_misses: c.jit_misses.load(Ordering::Relaxed),
            timeouts: c.timeouts.load(Ordering::Relaxed),
            skipped: c.skipped.load(Ordering::Relaxed),
        }
    }
}
