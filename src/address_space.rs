//! Address space reconstruction.
//!
//! An `AddressSpace` aggregates every section of one dump plus its metadata and answers
//! range reads against virtual addresses:
//! 1. Section building: parses each dump file, all-or-nothing.
//! 2. Ordering: sorts sections by start address and rejects overlaps.
//! 3. Metadata folding: architecture, entry/exit points, relocations, function hints, labels.
//! 4. Queries: section lookup by binary search, bounded reads, label lookup.
//!
//! Once built it is never mutated, so shared references can be handed to any number of
//! threads.

use std::collections::BTreeSet;
use std::path::PathBuf;

use object::endian::Endian;
use object::Endianness;

use crate::arch::Arch;
use crate::error::{Error, QueryError, Result};
use crate::metadata::Metadata;
use crate::section::Section;
use crate::symbol::{Label, LabelKind, LabelTable};

#[derive(Debug, Clone)]
pub struct AddressSpace {
    /// Sorted by start address, non-empty and non-overlapping.
    sections: Vec<Section>,
    arch: Option<Arch>,
    entry_points: BTreeSet<u64>,
    exit_points: BTreeSet<u64>,
    relocations: BTreeSet<u64>,
    functions: BTreeSet<u64>,
    labels: LabelTable,
}

impl AddressSpace {
    /// Builds an address space from section dump files and optional metadata.
    ///
    /// Each file is given as its path (only the basename is parsed) and its full content.
    pub fn new<I, P>(files: I, metadata: Option<Metadata>) -> Result<Self>
    where
        I: IntoIterator<Item = (P, Vec<u8>)>,
        P: Into<PathBuf>,
    {
        let mut sections = Vec::new();
        for (path, data) in files {
            let path = path.into();
            let filename = path.display().to_string();
            let section = Section::from_file(path, data).map_err(|source| Error::LoadFailed {
                filename,
                source: Box::new(source),
            })?;
            sections.push(section);
        }
        Self::from_sections(sections, metadata)
    }

    /// Builds an address space from already parsed sections.
    pub fn from_sections(sections: Vec<Section>, metadata: Option<Metadata>) -> Result<Self> {
        let mut space = Self {
            sections: Vec::with_capacity(sections.len()),
            arch: None,
            entry_points: BTreeSet::new(),
            exit_points: BTreeSet::new(),
            relocations: BTreeSet::new(),
            functions: BTreeSet::new(),
            labels: LabelTable::new(),
        };

        for section in sections {
            if section.is_empty() {
                tracing::warn!(
                    "Skipping empty section {} at {:#x}",
                    section.name(),
                    section.start_address()
                );
                continue;
            }
            tracing::debug!(
                "Loaded section {} [{:#x}, {:#x}] (size: {}, offset: {}, flags: {})",
                section.name(),
                section.start_address(),
                section.end_address(),
                section.size(),
                section.offset(),
                section.flags()
            );
            space.sections.push(section);
        }

        space.sections.sort_by_key(Section::start_address);
        for pair in space.sections.windows(2) {
            let (first, second) = (&pair[0], &pair[1]);
            if second.start_address() <= first.end_address() {
                return Err(Error::OverlappingSections {
                    first: first.name().to_string(),
                    second: second.name().to_string(),
                    address: second.start_address(),
                });
            }
        }

        if let Some(metadata) = metadata {
            space.fold_metadata(metadata);
        }

        tracing::info!(
            "Built address space: {} sections, arch {}, {} entry points, {} exit points, {} relocations, {} function hints",
            space.sections.len(),
            space.arch.as_ref().map_or("unknown", Arch::name),
            space.entry_points.len(),
            space.exit_points.len(),
            space.relocations.len(),
            space.functions.len()
        );
        Ok(space)
    }

    fn fold_metadata(&mut self, metadata: Metadata) {
        self.arch = metadata.arch.as_deref().map(Arch::from_name);

        // Exit points first, so an exported name shadows a call-site name at the same address.
        for symbol in metadata.exit_points {
            self.exit_points.insert(symbol.address);
            self.labels.insert(symbol.address, symbol.name, LabelKind::Exit);
        }
        for symbol in metadata.entry_points {
            self.entry_points.insert(symbol.address);
            self.labels.insert(symbol.address, symbol.name, LabelKind::Entry);
        }
        self.relocations.extend(metadata.relocations);
        self.functions.extend(metadata.functions);
    }

    /// Returns the section whose inclusive range contains `address`.
    pub fn find_section(&self, address: u64) -> Result<&Section, QueryError> {
        let idx = self
            .sections
            .partition_point(|section| section.start_address() <= address);
        idx.checked_sub(1)
            .map(|idx| &self.sections[idx])
            .filter(|section| section.contains(address))
            .ok_or_else(|| {
                tracing::trace!("No section contains {:#x}", address);
                QueryError::NotFound { address }
            })
    }

    pub fn contains(&self, address: u64) -> bool {
        self.find_section(address).is_ok()
    }

    /// Reads exactly `size` bytes at `address`.
    ///
    /// The whole range must lie inside a single section; a read running into an adjacent
    /// section fails with `OutOfBounds` even when the two are contiguous. A zero-length
    /// read always succeeds, whether or not `address` is mapped.
    pub fn read(&self, address: u64, size: u64) -> Result<&[u8], QueryError> {
        if size == 0 {
            return Ok(&[]);
        }
        let section = self.find_section(address)?;
        section.slice(address, size).ok_or_else(|| {
            tracing::trace!(
                "Read of {} bytes at {:#x} runs past {} ending at {:#x}",
                size,
                address,
                section.name(),
                section.end_address()
            );
            QueryError::OutOfBounds {
                address,
                size,
                section_end: section.end_address(),
            }
        })
    }

    fn read_array<const N: usize>(&self, address: u64) -> Result<[u8; N], QueryError> {
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(self.read(address, N as u64)?);
        Ok(bytes)
    }

    pub fn read_u16(&self, address: u64, endian: Endianness) -> Result<u16, QueryError> {
        Ok(endian.read_u16_bytes(self.read_array(address)?))
    }

    pub fn read_u32(&self, address: u64, endian: Endianness) -> Result<u32, QueryError> {
        Ok(endian.read_u32_bytes(self.read_array(address)?))
    }

    pub fn read_u64(&self, address: u64, endian: Endianness) -> Result<u64, QueryError> {
        Ok(endian.read_u64_bytes(self.read_array(address)?))
    }

    /// Reads a native word using the architecture's size and byte order.
    pub fn read_word(&self, address: u64) -> Result<u64, QueryError> {
        let arch = self.arch.as_ref().ok_or(QueryError::UnknownArchitecture)?;
        let endian = arch.endianness().ok_or(QueryError::UnknownArchitecture)?;
        match arch.word_size() {
            Some(8) => self.read_u64(address, endian),
            Some(4) => self.read_u32(address, endian).map(u64::from),
            Some(2) => self.read_u16(address, endian).map(u64::from),
            _ => Err(QueryError::UnknownArchitecture),
        }
    }

    /// The symbolic name at `address`. When an address is both an exit and an entry
    /// point the entry point name wins; see `labels_at` for all of them.
    pub fn label_for(&self, address: u64) -> Result<&str, QueryError> {
        self.labels
            .get(address)
            .ok_or(QueryError::NotFound { address })
    }

    pub fn labels_at(&self, address: u64) -> &[Label] {
        self.labels.all(address)
    }

    /// Addresses named by more than one entry or exit point.
    pub fn label_collisions(&self) -> impl Iterator<Item = (u64, &[Label])> + '_ {
        self.labels.collisions()
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    /// Sections in ascending address order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section_by_name(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.name() == name)
    }

    /// `None` when the metadata did not name one.
    pub fn arch(&self) -> Option<&Arch> {
        self.arch.as_ref()
    }

    pub fn entry_points(&self) -> &BTreeSet<u64> {
        &self.entry_points
    }

    pub fn exit_points(&self) -> &BTreeSet<u64> {
        &self.exit_points
    }

    pub fn relocations(&self) -> &BTreeSet<u64> {
        &self.relocations
    }

    /// Probable function starts. Heuristic, not authoritative.
    pub fn functions(&self) -> &BTreeSet<u64> {
        &self.functions
    }

    pub fn is_relocation(&self, address: u64) -> bool {
        self.relocations.contains(&address)
    }

    pub fn is_function_hint(&self, address: u64) -> bool {
        self.functions.contains(&address)
    }
}
