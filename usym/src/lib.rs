//! # usym - User-Space Stack Symbolizer
//!
//! usym resolves raw user-space instruction addresses, as captured in stack
//! traces by an observability agent, to function names. It is built to run on
//! a host and symbolize processes in containers, and to be called once per
//! captured frame.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │        Tracing pipeline (eBPF stacks, samplers, events)      │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │ (pid, addr) per frame
//!                                ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Usym resolver                         │
//! │                                                              │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐      │
//! │  │   JIT maps   │   │ Address index│   │ Library      │      │
//! │  │ perf-N.map   │   │ exe + maps   │   │ symbol tables│      │
//! │  │  (per pid)   │   │  (per pid)   │   │  (per path)  │      │
//! │  └──────────────┘   └──────────────┘   └──────────────┘      │
//! │          │                  │                  │             │
//! │          └───────── RootView: /proc/<pid>/root ┘             │
//! └──────────────────────────────────────────────────────────────┘
//!                                │ Symbol(name) | Unknown | Unresolved
//!                                ▼
//!                       "name" | "<unknown>" | ""
//! ```
//!
//! ## Module Structure
//!
//! - [`symbolization`]: the resolver, its caches and data sources
//!   - `symbolizer`: [`Usym`](symbolization::Usym), lookup order and caches
//!   - `address_index`: executable sections + file-backed mappings per process
//!   - `elf_symbols`: function symbols from `.dynsym` and `.symtab`
//!   - `perf_map`: JIT map discovery, parsing and staleness
//!   - `memory_maps`: `/proc/<pid>/maps` parsing and exclusions
//!   - `root_view`: container-aware path translation
//!   - `lookup`: binary search over start-sorted ranges
//!   - `cache`, `bounded`: build-once caches and deadline-bounded builds
//!
//! - [`domain`]: core types (`Pid`, `Symbol`, `Section`, `Resolution`) and errors
//!
//! - [`cli`], [`process_lookup`], [`preflight`]: the `usym` command-line tool
//!
//! ## Typical Usage
//!
//! ```rust,no_run
//! use usym::domain::Pid;
//! use usym::symbolization::Usym;
//!
//! let usym = Usym::new();
//! let name = usym.resolve_ustack(0x7f1c_2b41_a3c0, 1234);
//! let detailed = usym.resolve(0x7f1c_2b41_a3c0, Pid(1234));
//! println!("{name} / {detailed:?}");
//! ```
//!
//! ```bash
//! sudo usym --pid 1234 0x7f1c2b41a3c0
//! ```

pub mod cli;
pub mod domain;
pub mod preflight;
pub mod process_lookup;
pub mod symbolization;

pub use domain::{Pid, Resolution};
pub use symbolization::{Usym, UsymConfig};
