//! Entry point for the secload inspector.
//!
//! This file handles high-level application flow:
//! 1. Parse command-line arguments using `clap`.
//! 2. Install the `tracing` subscriber.
//! 3. Scan the dump directory and build the address space.
//! 4. Answer `--find`/`--read` queries, or print a summary.
//!
//! Error handling is done via `anyhow`.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use secload::config::Config;
use secload::dump_dir::DumpDir;
use secload::{AddressSpace, Section};

fn main() -> Result<()> {
    let config = Config::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut dump = DumpDir::scan(&config.dump_dir)
        .with_context(|| format!("failed to scan {}", config.dump_dir.display()))?;
    if let Some(path) = &config.metadata {
        dump = dump.with_metadata(path);
    }
    if dump.section_files().is_empty() {
        anyhow::bail!("no section dumps in {}", dump.root().display());
    }

    let space = dump
        .load()
        .with_context(|| format!("failed to load {}", config.dump_dir.display()))?;

    if config.find.is_empty() && config.read.is_empty() {
        print_summary(&space);
        return Ok(());
    }

    for &address in &config.find {
        match space.find_section(address) {
            Ok(section) => println!("{:#x}: {}", address, describe(section)),
            Err(err) => println!("{:#x}: {}", address, err),
        }
    }

    for request in &config.read {
        match space.read(request.address, request.size) {
            Ok(bytes) => hex_dump(request.address, bytes),
            Err(err) => println!("{:#x}: {}", request.address, err),
        }
    }

    Ok(())
}

fn describe(section: &Section) -> String {
    format!(
        "{} [{:#x}, {:#x}] size {} offset {} flags {}",
        section.name(),
        section.start_address(),
        section.end_address(),
        section.size(),
        section.offset(),
        section.flags()
    )
}

fn print_summary(space: &AddressSpace) {
    match space.arch() {
        Some(arch) => println!("arch: {} ({:?})", arch.name(), arch.architecture()),
        None => println!("arch: unknown"),
    }
    println!("sections:");
    for section in space.sections() {
        println!("  {}", describe(section));
    }
    println!("entry points: {}", space.entry_points().len());
    println!("exit points: {}", space.exit_points().len());
    println!("relocations: {}", space.relocations().len());
    println!("function hints: {}", space.functions().len());
    for (address, labels) in space.label_collisions() {
        let names: Vec<&str> = labels.iter().map(|label| label.name.as_str()).collect();
        println!("label collision at {:#x}: {}", address, names.join(", "));
    }
}

fn hex_dump(address: u64, bytes: &[u8]) {
    for (row, chunk) in bytes.chunks(16).enumerate() {
        let hex: Vec<String> = chunk.iter().map(|byte| format!("{byte:02x}")).collect();
        println!("{:#010x}: {}", address + row as u64 * 16, hex.join(" "));
    }
}
