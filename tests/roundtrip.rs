//! Round-trip integration tests covering the format's core guarantees:
//! every (compression, encryption) combination restores the original bytes,
//! checksums always cover the plaintext, and headers survive byte-exact.

mod common;

use varc::{Archive, CreateOptions, FileKind, Password};

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[test]
fn test_roundtrip_all_pipeline_combinations() {
    let payload: Vec<u8> = (0..10_000u32).map(|i| (i % 253) as u8).collect();
    let password = Password::new("combo-pw");

    for (compress, encrypt) in [(false, false), (true, false), (false, true), (true, true)] {
        let mut options = CreateOptions::new().compress(compress);
        if encrypt {
            options = options.encrypt("combo-pw");
        }

        let fixture = common::save_archive(&[("payload.bin", &payload)], &options);
        let pw = encrypt.then_some(&password);
        common::assert_contents(&fixture, pw, &[("payload.bin", &payload)]);
    }
}

#[test]
fn test_scenario_single_text_file_stored_plain() {
    // S1: one uncompressed, unencrypted text file.
    let options = CreateOptions::new().compress(false);
    let fixture = common::save_archive(&[("hello.txt", b"hello\n")], &options);

    let archive = Archive::open(&fixture.path, None).unwrap();
    let entry = archive.find_entry("hello.txt").expect("entry present");

    assert_eq!(entry.path, "hello.txt");
    assert_eq!(entry.original_size, 6);
    assert_eq!(entry.stored_size, 6);
    assert_eq!(entry.file_type, FileKind::Text);
    assert_eq!(
        hex(&entry.checksum),
        "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03"
    );
}

#[test]
fn test_scenario_compressed_file_verifies_and_restores() {
    // S2: same file at level 9; stored size may be anything, but verify
    // passes and content restores.
    let options = CreateOptions::new().level(9).unwrap();
    let fixture = common::save_archive(&[("hello.txt", b"hello\n")], &options);

    let mut archive = Archive::open(&fixture.path, None).unwrap();
    archive.verify(None).unwrap();
    assert_eq!(archive.read_entry("hello.txt", None).unwrap(), b"hello\n");
}

#[test]
fn test_scenario_empty_archive() {
    // S4: empty archive round trip.
    let fixture = common::save_archive(&[], &CreateOptions::new());

    let raw = std::fs::read(&fixture.path).unwrap();
    assert_eq!(&raw[0..4], b"VARC");

    let archive = Archive::open(&fixture.path, None).unwrap();
    assert_eq!(archive.header().file_count, 0);
    assert_eq!(archive.header().flags, 0);
    assert_eq!(archive.header().version, 0x0003);
    assert_eq!(archive.entry_count(), 0);
}

#[test]
fn test_scenario_pdf_detected_as_document() {
    // S5: %PDF magic bytes produce the DOCUMENT tag.
    let fixture = common::save_archive(
        &[("doc.pdf", b"%PDF-1.4\n1 0 obj\n<<>>\nendobj\n")],
        &CreateOptions::new(),
    );

    let archive = Archive::open(&fixture.path, None).unwrap();
    let entry = archive.find_entry("doc.pdf").unwrap();
    assert_eq!(entry.file_type, FileKind::Document);
    assert_eq!(entry.file_type as u32, 6);
}

#[test]
fn test_checksum_is_over_plaintext_regardless_of_transforms() {
    let payload = b"checksum invariance test payload".to_vec();
    let expected = {
        use varc::crypto::sha256;
        sha256(&payload)
    };

    let combos: [CreateOptions; 3] = [
        CreateOptions::new().compress(false),
        CreateOptions::new(),
        CreateOptions::new().encrypt("pw"),
    ];
    for options in combos {
        let fixture = common::save_archive(&[("file.bin", &payload)], &options);

        let password = Password::new("pw");
        let pw = options.encrypt.then_some(&password);
        let archive = Archive::open(&fixture.path, pw).unwrap();
        assert_eq!(archive.find_entry("file.bin").unwrap().checksum, expected);
    }
}

#[test]
fn test_file_count_tracks_adds_and_removes() {
    let options = CreateOptions::new();
    let fixture = common::save_archive(
        &[("a.txt", b"A" as &[u8]), ("b.txt", b"B"), ("c.txt", b"C")],
        &options,
    );

    let mut archive = Archive::open(&fixture.path, None).unwrap();
    archive.remove_entry("b.txt").unwrap();
    archive
        .add_virtual("d.txt", b"D".to_vec(), &options)
        .unwrap();
    archive.save().unwrap();

    let reopened = Archive::open(&fixture.path, None).unwrap();
    assert_eq!(reopened.header().file_count, 3);
    assert_eq!(reopened.entry_count(), 3);
    assert!(reopened.entry_exists("a.txt"));
    assert!(!reopened.entry_exists("b.txt"));
    assert!(reopened.entry_exists("d.txt"));
}

#[test]
fn test_header_reencode_is_byte_identical() {
    use varc::GlobalHeader;

    let fixture = common::save_archive(&[("x", b"y")], &CreateOptions::new());
    let raw = std::fs::read(&fixture.path).unwrap();

    let decoded = GlobalHeader::decode(&raw).unwrap();
    assert_eq!(decoded.encode(), &raw[..64]);
}

#[test]
fn test_long_paths_roundtrip() {
    let long_name = format!("{}/{}.txt", "d".repeat(100), "f".repeat(500));
    let fixture = common::save_archive(
        &[(long_name.as_str(), b"deep" as &[u8])],
        &CreateOptions::new(),
    );
    common::assert_contents(&fixture, None, &[(long_name.as_str(), b"deep")]);
}

#[test]
fn test_unicode_paths_roundtrip() {
    let entries: [(&str, &[u8]); 3] = [
        ("документ.txt", b"cyrillic"),
        ("日本語/ファイル.dat", b"japanese"),
        ("emoji-🎉.bin", b"party"),
    ];
    let fixture = common::save_archive(&entries, &CreateOptions::new());
    common::assert_contents(&fixture, None, &entries);
}

#[test]
fn test_binary_data_with_all_byte_values() {
    let payload: Vec<u8> = (0u8..=255).cycle().take(4096).collect();
    let fixture = common::save_archive(&[("bytes.bin", &payload)], &CreateOptions::new());
    common::assert_contents(&fixture, None, &[("bytes.bin", &payload)]);
}

#[test]
fn test_glob_find_entries_txt_suffix() {
    let fixture = common::save_archive(
        &[
            ("one.txt", b"1" as &[u8]),
            ("two.txt", b"2"),
            ("three.md", b"3"),
            ("nested/four.txt", b"4"),
            ("five.txt.bak", b"5"),
        ],
        &CreateOptions::new(),
    );

    let archive = Archive::open(&fixture.path, None).unwrap();
    let matches = archive.find_entries("*.txt");
    let mut paths: Vec<&str> = matches.iter().map(|e| e.path.as_str()).collect();
    paths.sort();
    assert_eq!(paths, vec!["nested/four.txt", "one.txt", "two.txt"]);
}

#[test]
fn test_encrypted_archive_header_state() {
    // S3 (header side): encryption marks the header and populates the salt.
    let options = CreateOptions::new().encrypt("pw");
    let fixture = common::save_archive(
        &[("a", b"A" as &[u8]), ("b", b"B"), ("c", b"C")],
        &options,
    );

    let password = Password::new("pw");
    let archive = Archive::open(&fixture.path, Some(&password)).unwrap();
    assert_ne!(archive.header().flags & 0x0001, 0);
    assert_ne!(archive.header().salt, [0u8; 32]);

    common::assert_contents(
        &fixture,
        Some(&password),
        &[("a", b"A"), ("b", b"B"), ("c", b"C")],
    );
}

#[test]
fn test_metadata_block_roundtrip() {
    use varc::ArchiveMetadata;

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("meta.varc");

    let mut archive = Archive::create(&path);
    archive
        .add_virtual("f.txt", b"content".to_vec(), &CreateOptions::new())
        .unwrap();
    archive.set_metadata(ArchiveMetadata {
        creation_time: 1_700_000_000,
        modification_time: 1_700_000_500,
        creator: "integration-test".into(),
        description: "metadata block persistence".into(),
        tags: vec![("purpose".into(), "testing".into())],
    });
    archive.save().unwrap();

    let mut reopened = Archive::open(&path, None).unwrap();
    let meta = reopened.metadata().expect("metadata present");
    assert_eq!(meta.creator, "integration-test");
    assert_eq!(meta.tags, vec![("purpose".into(), "testing".into())]);
    assert!(reopened.header().has_metadata());
    // Entries still parse correctly after the variable-length block.
    assert_eq!(reopened.read_entry("f.txt", None).unwrap(), b"content");
}
