//! Section dump loader.
//!
//! This library rebuilds the virtual address space of an executable from a directory of
//! section dumps (one `NAME-START-SIZE-OFFSET-FLAGS.bin` file per section) and an optional
//! metadata file, and serves bounded byte reads against it.
//! It is organized into several modules:
//! - `config`: CLI configuration.
//! - `error`: Construction and query error types.
//! - `section`: Section filename parsing and content.
//! - `metadata`: Typed metadata and its parser.
//! - `symbol`: Entry/exit point labels.
//! - `arch`: Architecture identification.
//! - `address_space`: The aggregate and its queries.
//! - `dump_dir`: Dump directory scanning and reading.

use std::path::Path;

pub mod address_space;
pub mod arch;
pub mod config;
pub mod dump_dir;
pub mod error;
pub mod metadata;
pub mod section;
pub mod symbol;
pub mod utils;

pub use crate::address_space::AddressSpace;
pub use crate::error::{Error, QueryError, Result};
pub use crate::section::Section;

/// Loads the dump directory at `path`.
pub fn load(path: impl AsRef<Path>) -> Result<AddressSpace> {
    dump_dir::DumpDir::scan(path)?.load()
}
