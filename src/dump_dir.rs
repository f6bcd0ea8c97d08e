//! Dump directory handling.
//!
//! Lists a dump directory, separates section files from the metadata file and reads
//! them, handing the address space two typed inputs: `(path, bytes)` pairs and a
//! parsed `Metadata`.

use memmap2::Mmap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::address_space::AddressSpace;
use crate::error::{Error, Result};
use crate::metadata::{Metadata, METADATA_EXTENSION, METADATA_FILE_NAME};
use crate::section::is_section_file;

/// The classified contents of a dump directory.
#[derive(Debug, Clone)]
pub struct DumpDir {
    root: PathBuf,
    section_files: Vec<PathBuf>,
    metadata_file: Option<PathBuf>,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
    move |source| Error::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl DumpDir {
    /// Lists and classifies the regular files in `root`, in name order.
    pub fn scan(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let mut paths = Vec::new();
        for entry in fs::read_dir(root).map_err(io_error(root))? {
            let entry = entry.map_err(io_error(root))?;
            let path = entry.path();
            if path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        let mut dir = Self {
            root: root.to_path_buf(),
            section_files: Vec::new(),
            metadata_file: None,
        };
        let mut candidates = Vec::new();
        for path in paths {
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                tracing::debug!("Skipping non UTF-8 file name {}", path.display());
                continue;
            };
            if is_section_file(name) {
                dir.section_files.push(path);
            } else if path.extension().is_some_and(|ext| ext == METADATA_EXTENSION) {
                candidates.push(path);
            } else {
                tracing::debug!("Ignoring {}", path.display());
            }
        }
        dir.metadata_file = choose_metadata(candidates)?;

        tracing::debug!(
            "Scanned {}: {} section files, metadata {:?}",
            root.display(),
            dir.section_files.len(),
            dir.metadata_file
        );
        Ok(dir)
    }

    /// Uses `path` as the metadata file instead of the one found by `scan`.
    pub fn with_metadata(mut self, path: impl Into<PathBuf>) -> Self {
        self.metadata_file = Some(path.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn section_files(&self) -> &[PathBuf] {
        &self.section_files
    }

    pub fn metadata_file(&self) -> Option<&Path> {
        self.metadata_file.as_deref()
    }

    /// Reads every section file and the metadata, then builds the address space.
    pub fn load(&self) -> Result<AddressSpace> {
        let mut files = Vec::with_capacity(self.section_files.len());
        for path in &self.section_files {
            let data = read_file(path).map_err(|source| Error::LoadFailed {
                filename: path.display().to_string(),
                source: Box::new(source),
            })?;
            files.push((path.clone(), data));
        }

        let metadata = match &self.metadata_file {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(io_error(path))?;
                Some(Metadata::parse(&text)?)
            }
            None => None,
        };

        AddressSpace::new(files, metadata)
    }
}

/// Picks `aux.ini` when present, otherwise the only `.ini` file.
fn choose_metadata(mut candidates: Vec<PathBuf>) -> Result<Option<PathBuf>> {
    if let Some(idx) = candidates
        .iter()
        .position(|path| path.ends_with(METADATA_FILE_NAME))
    {
        let chosen = candidates.swap_remove(idx);
        for other in &candidates {
            tracing::debug!(
                "Ignoring {} in favour of {}",
                other.display(),
                METADATA_FILE_NAME
            );
        }
        return Ok(Some(chosen));
    }

    let mut candidates = candidates.into_iter();
    match (candidates.next(), candidates.next()) {
        (Some(first), Some(second)) => Err(Error::DuplicateMetadata { first, second }),
        (first, _) => Ok(first),
    }
}

/// Reads a whole file into an owned buffer.
pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path).map_err(io_error(path))?;
    let len = file.metadata().map_err(io_error(path))?.len();
    if len == 0 {
        return Ok(Vec::new());
    }
    // SAFETY: the mapping is copied out immediately and dropped before returning.
    let mmap = unsafe { Mmap::map(&file) }.map_err(io_error(path))?;
    Ok(mmap.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_directory_is_an_io_error() {
        let err = DumpDir::scan("/nonexistent/secload/dump").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|name| Path::new("dump").join(name)).collect()
    }

    #[test]
    fn aux_ini_wins_over_other_ini_files() {
        let chosen = choose_metadata(paths(&["notes.ini", "aux.ini", "zzz.ini"])).unwrap();
        assert_eq!(chosen, Some(PathBuf::from("dump/aux.ini")));
    }

    #[test]
    fn a_lone_ini_file_is_used() {
        let chosen = choose_metadata(paths(&["hello.ini"])).unwrap();
        assert_eq!(chosen, Some(PathBuf::from("dump/hello.ini")));
        assert_eq!(choose_metadata(Vec::new()).unwrap(), None);
    }

    #[test]
    fn several_ini_files_without_aux_are_ambiguous() {
        let err = choose_metadata(paths(&["a.ini", "b.ini"])).unwrap_err();
        assert!(matches!(err, Error::DuplicateMetadata { .. }));
    }
}
