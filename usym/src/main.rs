//! # usym - Main Entry Point
//!
//! Resolves addresses of one running process:
//! - **Arguments** (`usym --pid 1234 0x7f..`): resolve the given addresses
//! - **Stdin** (`usym --name node < frames.txt`): resolve one address per line
//!
//! Logging is controlled with `RUST_LOG` (e.g. `RUST_LOG=usym=debug`).

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::io::{self, BufRead, BufWriter, Write};

use usym::cli::{format_line, parse_address, Args, FrameReport, MissingTarget};
use usym::domain::Pid;
use usym::preflight::run_preflight_checks;
use usym::process_lookup::find_process_by_name;
use usym::symbolization::{RootView, Usym};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;
const EXIT_NOPERM: i32 = 77;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

/// Exit code from the error's causes, never from its message text
fn exit_code_for(err: &anyhow::Error) -> i32 {
    let denied = err
        .chain()
        .filter_map(|cause| cause.downcast_ref::<io::Error>())
        .any(|e| e.kind() == io::ErrorKind::PermissionDenied);

    if denied {
        EXIT_NOPERM
    } else if err.is::<MissingTarget>() {
        EXIT_USAGE
    } else {
        EXIT_ERROR
    }
}

/// Pick the target pid from `--pid` or `--name`
fn resolve_pid(args: &Args) -> Result<Pid> {
    if let Some(pid) = args.pid {
        return Ok(Pid(pid));
    }
    if let Some(ref name) = args.name {
        let info = find_process_by_name(&args.proc_root, name)?;
        info!("{name} is {} ({})", info.pid, info.exe_path.display());
        return Ok(info.pid);
    }

    Err(MissingTarget.into())
}

/// Addresses from the command line, or from stdin when none were given
fn collect_addresses(args: &Args) -> Result<Vec<u64>> {
    let mut addresses = Vec::new();
    let mut push = |text: &str| {
        if text.trim().is_empty() {
            return;
        }
        match parse_address(text) {
            Some(addr) => addresses.push(addr),
            None if !args.quiet => {
                eprintln!("warning: skipping unparsable address: {}", text.trim());
            }
            None => {}
        }
    };

    if args.addresses.is_empty() {
        for line in io::stdin().lock().lines() {
            let line = line.context("Failed to read addresses from stdin")?;
            push(line.as_str());
        }
    } else {
        args.addresses.iter().for_each(|text| push(text.as_str()));
    }
    Ok(addresses)
}

fn run() -> Result<()> {
    let args = Args::parse();

    let pid = resolve_pid(&args)?;
    let config = args.config();
    run_preflight_checks(&RootView::new(&config.proc_root, pid), args.quiet)?;

    let addresses = collect_addresses(&args)?;
    let resolver = Usym::with_config(config);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for addr in addresses {
        let resolution = resolver.resolve(addr, pid);
        if args.json {
            let report = FrameReport::new(pid, addr, &resolution, args.demangle);
            serde_json::to_writer(&mut out, &report).context("Failed to encode report")?;
            writeln!(out)?;
        } else {
            writeln!(out, "{}", format_line(addr, &resolution, args.demangle))?;
        }
    }
    out.flush()?;

    if args.stats {
        let stats = resolver.stats();
        if args.json {
            eprintln!("{}", serde_json::to_string(&stats)?);
        } else {
            eprintln!("{stats:?}");
        }
    }

    Ok(())
}
