//! Section dumps.
//!
//! Each section of the dumped executable lives in its own file whose name encodes
//! where the bytes belong: `NAME-STARTHEX-SIZEDEC-OFFSETDEC-FLAGS.bin`. This module
//! parses that identity and pairs it with the file content.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::utils::{parse_dec, parse_hex};

/// Marker separating the identifier from the extension of a section file.
pub const SECTION_EXTENSION: &str = ".bin";

/// The identity of a section, as encoded in its dump filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionId {
    pub name: String,
    /// Virtual address of the first byte.
    pub start_address: u64,
    pub size: u64,
    /// Offset in the original executable. Kept for provenance only.
    pub offset: u64,
    /// Opaque flag string, usually permission bits.
    pub flags: String,
}

impl SectionId {
    /// Parses a dump filename. Directory components are ignored.
    ///
    /// The identifier is split on at most four hyphens so that `flags` keeps any
    /// further hyphens verbatim.
    pub fn parse(file_name: &str) -> Result<Self> {
        let ident = identifier(basename(file_name));
        let components: Vec<&str> = ident.splitn(5, '-').collect();
        let [name, start, size, offset, flags] = components[..] else {
            return Err(Error::MissingComponent {
                found: components.len(),
            });
        };

        if name.is_empty() {
            return Err(malformed("name", name));
        }
        let start_address = parse_hex(start).ok_or_else(|| malformed("start address", start))?;
        let size = parse_dec(size).ok_or_else(|| malformed("size", size))?;
        let offset = parse_dec(offset).ok_or_else(|| malformed("offset", offset))?;

        if size > 0 && start_address.checked_add(size - 1).is_none() {
            return Err(Error::MalformedIdentifier {
                field: "size",
                value: format!("{size} (overflows address space at {start_address:#x})"),
            });
        }

        Ok(Self {
            name: name.to_string(),
            start_address,
            size,
            offset,
            flags: flags.to_string(),
        })
    }

    /// Canonical filename for this identity. Parsing it yields `self` again.
    pub fn file_name(&self) -> String {
        format!(
            "{}-{:x}-{}-{}-{}{}",
            self.name, self.start_address, self.size, self.offset, self.flags, SECTION_EXTENSION
        )
    }
}

fn malformed(field: &'static str, value: &str) -> Error {
    Error::MalformedIdentifier {
        field,
        value: value.to_string(),
    }
}

fn basename(file_name: &str) -> &str {
    Path::new(file_name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(file_name)
}

/// Strips `.bin` and anything after it, or the last extension when there is no `.bin` marker.
fn identifier(basename: &str) -> &str {
    let marker = basename
        .match_indices(SECTION_EXTENSION)
        .map(|(idx, _)| idx)
        .filter(|&idx| {
            let rest = &basename[idx + SECTION_EXTENSION.len()..];
            rest.is_empty() || rest.starts_with('.')
        })
        .last();
    match marker {
        Some(idx) => &basename[..idx],
        None => basename.rsplit_once('.').map_or(basename, |(stem, _)| stem),
    }
}

/// Returns true if `file_name` carries the section dump extension (`.bin` or `.bin.*`).
pub fn is_section_file(file_name: &str) -> bool {
    let name = basename(file_name);
    name.match_indices(SECTION_EXTENSION).any(|(idx, _)| {
        let rest = &name[idx + SECTION_EXTENSION.len()..];
        idx > 0 && (rest.is_empty() || rest.starts_with('.'))
    })
}

/// One contiguous range of the virtual address space and its raw content.
///
/// Immutable after construction; `data` always holds exactly `size` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    id: SectionId,
    path: PathBuf,
    data: Vec<u8>,
}

impl Section {
    /// Builds a section from its dump filename and the file's bytes.
    pub fn from_file(path: impl Into<PathBuf>, data: Vec<u8>) -> Result<Self> {
        let path = path.into();
        let id = SectionId::parse(&path.to_string_lossy())?;
        Self::new(id, path, data)
    }

    /// Pairs a parsed identity with its content, rejecting a length mismatch.
    pub fn new(id: SectionId, path: PathBuf, data: Vec<u8>) -> Result<Self> {
        let actual = data.len() as u64;
        if actual != id.size {
            return Err(Error::ContentMismatch {
                declared: id.size,
                actual,
            });
        }
        Ok(Self { id, path, data })
    }

    pub fn id(&self) -> &SectionId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.id.name
    }

    pub fn start_address(&self) -> u64 {
        self.id.start_address
    }

    pub fn size(&self) -> u64 {
        self.id.size
    }

    pub fn offset(&self) -> u64 {
        self.id.offset
    }

    pub fn flags(&self) -> &str {
        &self.id.flags
    }

    /// The file this section was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Inclusive address of the last byte.
    ///
    /// Empty sections report their start address here but contain nothing; they are
    /// never registered in an address space.
    pub fn end_address(&self) -> u64 {
        self.id.start_address + self.id.size.saturating_sub(1)
    }

    pub fn contains(&self, address: u64) -> bool {
        address
            .checked_sub(self.id.start_address)
            .is_some_and(|offset| offset < self.id.size)
    }

    /// Returns the `len` bytes at `address` if all of them lie inside this section.
    pub fn slice(&self, address: u64, len: u64) -> Option<&[u8]> {
        let start = address.checked_sub(self.id.start_address)?;
        let end = start.checked_add(len)?;
        if end > self.id.size {
            return None;
        }
        // size == data.len(), so both bounds fit in usize
        self.data.get(start as usize..end as usize)
    }
}
