//! Configuration module.
//!
//! This module defines the command-line interface (CLI) using `clap`.
//! It handles the dump directory, optional metadata override and the queries to run.

use clap::Parser;
use std::path::PathBuf;

use crate::utils::parse_hex;

/// Inspect an executable reconstructed from section dumps.
///
/// Loads every `.bin` section dump in a directory plus its `.ini` metadata file and
/// prints a summary, or answers address queries against the rebuilt address space.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Directory holding the section dumps
    pub dump_dir: PathBuf,

    /// Metadata file to use instead of the one found in the directory
    #[arg(long)]
    pub metadata: Option<PathBuf>,

    /// Print the section containing ADDR (hex)
    #[arg(long, value_name = "ADDR", value_parser = parse_address)]
    pub find: Vec<u64>,

    /// Hex dump LEN bytes at ADDR (hex address, decimal length)
    #[arg(long, value_name = "ADDR:LEN", value_parser = parse_read)]
    pub read: Vec<ReadRequest>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", help = "Set the logging level")]
    pub log_level: String,
}

/// A `--read` query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRequest {
    pub address: u64,
    pub size: u64,
}

fn parse_address(value: &str) -> Result<u64, String> {
    parse_hex(value).ok_or_else(|| format!("invalid hex address {value:?}"))
}

fn parse_read(value: &str) -> Result<ReadRequest, String> {
    let (address, size) = value
        .split_once(':')
        .ok_or_else(|| format!("expected ADDR:LEN, got {value:?}"))?;
    Ok(ReadRequest {
        address: parse_address(address)?,
        size: size
            .parse()
            .map_err(|_| format!("invalid length {size:?}"))?,
    })
}
