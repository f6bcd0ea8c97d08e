//! Error types.
//!
//! Construction failures (`Error`) abort building an address space. Query failures
//! (`QueryError`) are ordinary per-call outcomes the caller is expected to inspect.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while parsing sections or metadata and building an address space.
#[derive(Debug, Error)]
pub enum Error {
    /// A numeric component of a section filename could not be parsed.
    #[error("malformed {field} component: {value:?}")]
    MalformedIdentifier { field: &'static str, value: String },

    /// The filename has fewer than the five hyphen-delimited components.
    #[error("expected 5 hyphen-delimited components, found {found}")]
    MissingComponent { found: usize },

    /// The file content does not match the size declared in its filename.
    #[error("declared size {declared} does not match content length {actual}")]
    ContentMismatch { declared: u64, actual: u64 },

    #[error("metadata [{group}] line {line}: {message}")]
    MetadataParseError {
        group: String,
        line: usize,
        message: String,
    },

    /// A section file failed to load. Construction is all-or-nothing.
    #[error("failed to load {filename}")]
    LoadFailed {
        filename: String,
        #[source]
        source: Box<Error>,
    },

    #[error("section {second} overlaps section {first} at {address:#x}")]
    OverlappingSections {
        first: String,
        second: String,
        address: u64,
    },

    #[error("more than one metadata file: {} and {}", first.display(), second.display())]
    DuplicateMetadata { first: PathBuf, second: PathBuf },

    #[error("I/O error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for construction-time operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors returned by read-only queries against a built address space.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QueryError {
    #[error("no section or label at {address:#x}")]
    NotFound { address: u64 },

    /// The containing section ends before the requested range does.
    #[error("read of {size} bytes at {address:#x} crosses section end {section_end:#x}")]
    OutOfBounds {
        address: u64,
        size: u64,
        section_end: u64,
    },

    #[error("architecture is absent or unrecognised")]
    UnknownArchitecture,
}
