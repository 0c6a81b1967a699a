//! # Symbol Resolution for User-Space Stacks
//!
//! This module converts raw instruction pointers captured from a process's
//! stack (by an eBPF program, a sampler, a crash handler) into function names.
//!
//! ## The Symbolization Problem
//!
//! A captured frame is just `(pid, 0x7f1c2b41a3c0)`. The address can belong to
//! three very different kinds of code:
//!
//! - the process's **own executable**, described by its ELF section headers and
//!   `.symtab`/`.dynsym`;
//! - a **shared library** mapped somewhere in the address space, visible only
//!   through `/proc/<pid>/maps`;
//! - **JIT-compiled code** from a managed runtime (V8, JVM, .NET), which has no
//!   ELF image at all and is only described by the runtime's
//!   `/tmp/perf-<pid>.map`.
//!
//! ## Containers
//!
//! The traced process may live in its own mount and pid namespace. Its
//! executable and libraries are read through `/proc/<pid>/root`, and its JIT map
//! is named after a pid the observer never sees. [`RootView`] is the one place
//! where that translation happens.
//!
//! ## Resolution Flow
//!
//! ```text
//! (pid, addr)
//!     │
//!     ├─▶ JIT map of pid (reloaded when its mtime moves)
//!     │      hit with a name ──────────────────────────────▶ Symbol(name)
//!     │
//!     └─▶ address index of pid (exe sections + file-backed mappings)
//!            no section ───────────────────────────────────▶ Unresolved
//!            native section ─▶ exe symbols[addr] ─────────▶ Symbol / Unknown
//!            mapped section ─▶ lib symbols[addr - start] ─▶ Symbol / Unknown
//! ```
//!
//! ## Caching
//!
//! | Cache         | Key            | Lifetime                                 |
//! |---------------|----------------|------------------------------------------|
//! | address index | pid            | built once, dropped by `forget_process`  |
//! | library table | re-rooted path | built once, shared by every process      |
//! | JIT map       | pid            | replaced whenever the file changes       |
//!
//! Each cache has its own lock and each key its own build slot, so unrelated
//! processes resolve in parallel and a new process is indexed exactly once.
//!
//! ## Limitations
//!
//! - **No DWARF**: names only, no file/line or inlined frames
//! - **Library offsets**: the address inside a library is taken relative to the
//!   start of the containing mapping, not adjusted by its file offset
//! - **Overlaps**: only the rightmost range starting at or below an address is
//!   considered

pub mod address_index;
pub mod bounded;
pub mod cache;
pub mod config;
pub mod elf_symbols;
pub mod lookup;
pub mod memory_maps;
pub mod perf_map;
pub mod root_view;
pub mod symbolizer;

pub use config::UsymConfig;
pub use root_view::RootView;
pub use symbolizer::{Usym, UsymStats};
