//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use tempfile::TempDir;
use varc::{Archive, CreateOptions, Password};

/// A saved archive file inside its own temp directory.
pub struct ArchiveFixture {
    pub dir: TempDir,
    pub path: PathBuf,
}

/// Creates, populates, and saves an archive with the given entries and
/// options, returning the fixture holding it on disk.
pub fn save_archive(entries: &[(&str, &[u8])], options: &CreateOptions) -> ArchiveFixture {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("test.varc");

    let mut archive = Archive::create(&path);
    for (name, data) in entries {
        archive
            .add_virtual(*name, data.to_vec(), options)
            .unwrap_or_else(|e| panic!("failed to add {}: {}", name, e));
    }
    archive.save().expect("save archive");

    ArchiveFixture { dir, path }
}

/// Opens a fixture and asserts every entry's content round-trips.
pub fn assert_contents(
    fixture: &ArchiveFixture,
    password: Option<&Password>,
    entries: &[(&str, &[u8])],
) {
    let mut archive = Archive::open(&fixture.path, password).expect("open archive");
    assert_eq!(archive.entry_count(), entries.len() as u64);

    for (name, expected) in entries {
        let content = archive
            .read_entry(name, password)
            .unwrap_or_else(|e| panic!("failed to read {}: {}", name, e));
        assert_eq!(&content, expected, "content mismatch for '{}'", name);
    }
}
