use std::ffi::OsStr;
use std::fs;
use std::path::Path;

use secload::dump_dir::DumpDir;
use secload::{Error, QueryError};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, contents: &[u8]) {
    fs::write(dir.join(name), contents).expect("write dump file");
}

const HELLO_METADATA: &str = "\
[aux]
arch = x86_64

[entry_points]
0 = 0x1005,main

[exit_points]
0 = 1008,puts

[relocations]
0 = 2000

[functions]
0 = 1005
";

fn hello_dump() -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    write(dir.path(), "text-1000-10-0-rx.bin", &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    write(dir.path(), "data-2000-4-4096-rw.bin", &[0xef, 0xbe, 0xad, 0xde]);
    write(dir.path(), "hello.ini", HELLO_METADATA.as_bytes());
    write(dir.path(), "README.txt", b"not a section");
    dir
}

#[test]
fn loads_sections_and_metadata() {
    let dir = hello_dump();
    let space = secload::load(dir.path()).expect("load dump");

    assert_eq!(space.sections().len(), 2);
    assert_eq!(space.find_section(0x1005).unwrap().name(), "text");
    assert_eq!(space.read(0x1000, 4).unwrap(), &[0, 1, 2, 3]);
    assert!(matches!(
        space.read(0x1009, 2),
        Err(QueryError::OutOfBounds { .. })
    ));
    assert_eq!(space.label_for(0x1005), Ok("main"));
    assert_eq!(space.label_for(0x1008), Ok("puts"));
    assert!(matches!(
        space.find_section(0x3000),
        Err(QueryError::NotFound { .. })
    ));

    assert_eq!(space.arch().map(|arch| arch.name()), Some("x86_64"));
    assert_eq!(
        space.read_word(0x2000),
        Err(QueryError::OutOfBounds {
            address: 0x2000,
            size: 8,
            section_end: 0x2003,
        })
    );
    assert!(space.is_relocation(0x2000));
    assert!(space.is_function_hint(0x1005));
}

#[test]
fn classifies_directory_entries() {
    let dir = hello_dump();
    write(dir.path(), "bss-3000-0-0-rw.bin.1", b"");
    let dump = DumpDir::scan(dir.path()).expect("scan dump");

    let names: Vec<String> = dump
        .section_files()
        .iter()
        .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "bss-3000-0-0-rw.bin.1",
            "data-2000-4-4096-rw.bin",
            "text-1000-10-0-rx.bin",
        ]
    );
    assert_eq!(dump.root(), dir.path());
    assert_eq!(
        dump.metadata_file().and_then(|path| path.file_name()),
        Some(OsStr::new("hello.ini"))
    );

    let space = dump.load().expect("load dump");
    assert_eq!(space.sections().len(), 2);
}

#[test]
fn loads_without_metadata() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "text-400000-2-0-r-x.bin", &[0x90, 0xc3]);
    let space = secload::load(dir.path()).unwrap();

    assert!(space.arch().is_none());
    assert!(space.entry_points().is_empty());
    assert_eq!(space.sections()[0].flags(), "r-x");
    assert_eq!(space.read(0x400001, 1).unwrap(), &[0xc3]);
}

#[test]
fn metadata_override() {
    let dir = hello_dump();
    let other = dir.path().join("other.meta");
    fs::write(&other, "[aux]\narch = aarch64\n").unwrap();

    let space = DumpDir::scan(dir.path())
        .unwrap()
        .with_metadata(&other)
        .load()
        .unwrap();
    assert_eq!(space.arch().map(|arch| arch.name()), Some("aarch64"));
    assert!(space.labels().is_empty());
}

#[test]
fn two_ini_files_without_aux_are_rejected() {
    let dir = hello_dump();
    write(dir.path(), "second.ini", b"[aux]\narch = arm\n");
    assert!(matches!(
        DumpDir::scan(dir.path()),
        Err(Error::DuplicateMetadata { .. })
    ));
}

#[test]
fn a_truncated_dump_fails_the_load() {
    let dir = hello_dump();
    write(dir.path(), "rodata-1800-8-0-r.bin", &[0; 6]);
    match secload::load(dir.path()) {
        Err(Error::LoadFailed { filename, source }) => {
            assert!(filename.ends_with("rodata-1800-8-0-r.bin"));
            assert!(matches!(
                *source,
                Error::ContentMismatch {
                    declared: 8,
                    actual: 6
                }
            ));
        }
        other => panic!("expected LoadFailed, got {other:?}"),
    }
}

#[test]
fn bad_metadata_fails_the_load() {
    let dir = hello_dump();
    write(dir.path(), "hello.ini", b"[functions]\n0 = main\n");
    assert!(matches!(
        secload::load(dir.path()),
        Err(Error::MetadataParseError { line: 2, .. })
    ));
}

#[test]
fn overlapping_dumps_fail_the_load() {
    let dir = hello_dump();
    write(dir.path(), "init-1008-4-0-rx.bin", &[0; 4]);
    assert!(matches!(
        secload::load(dir.path()),
        Err(Error::OverlappingSections { .. })
    ));
}

#[test]
fn aux_ini_is_preferred_over_stray_ini_files() {
    let dir = hello_dump();
    fs::rename(dir.path().join("hello.ini"), dir.path().join("aux.ini")).unwrap();
    write(dir.path(), "notes.ini", b"free-form notes, not metadata\n");

    let dump = DumpDir::scan(dir.path()).unwrap();
    assert_eq!(
        dump.metadata_file().and_then(|path| path.file_name()),
        Some(OsStr::new("aux.ini"))
    );
    let space = dump.load().unwrap();
    assert_eq!(space.label_for(0x1005), Ok("main"));
}

#[test]
fn entry_point_name_wins_a_collision() {
    let dir = hello_dump();
    write(
        dir.path(),
        "hello.ini",
        b"[exit_points]\n0 = 1005,puts\n[entry_points]\n0 = 1005,main\n",
    );
    let space = secload::load(dir.path()).unwrap();
    assert_eq!(space.label_for(0x1005), Ok("main"));
    assert_eq!(space.labels_at(0x1005).len(), 2);
}

#[test]
fn ini_quirks_are_honoured() {
    let dir = hello_dump();
    write(
        dir.path(),
        "hello.ini",
        b"[aux]\nARCH = x86_64\n[entry_points]\n0 = 1005,main ; exported\n",
    );
    let space = secload::load(dir.path()).unwrap();
    assert_eq!(space.label_for(0x1005), Ok("main"));
    assert_eq!(space.read_word(0x1000), Ok(0x0706_0504_0302_0100));
}
