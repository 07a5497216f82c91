//! Security-focused integration tests: wrong passwords, corrupted and
//! truncated archives, and path traversal attempts.

mod common;

use varc::{Archive, CreateOptions, Error, Password};

// =========================================================================
// Wrong password
// =========================================================================

#[test]
fn test_wrong_password_is_decrypt_failure_never_garbage() {
    let options = CreateOptions::new().encrypt("pw");
    let fixture = common::save_archive(
        &[("a", b"A" as &[u8]), ("b", b"B"), ("c", b"C")],
        &options,
    );

    // Correct password opens.
    let password = Password::new("pw");
    Archive::open(&fixture.path, Some(&password)).unwrap();

    // Wrong password is detected at open, on the first entry.
    let wrong = Password::new("wrong");
    let err = Archive::open(&fixture.path, Some(&wrong)).unwrap_err();
    assert!(matches!(err, Error::DecryptFailure));
}

#[test]
fn test_encrypted_archive_without_password() {
    let options = CreateOptions::new().encrypt("pw");
    let fixture = common::save_archive(&[("s.txt", b"secret")], &options);

    let err = Archive::open(&fixture.path, None).unwrap_err();
    assert!(matches!(err, Error::PasswordRequired));
}

#[test]
fn test_wrong_password_on_parsed_buffer_fails_verify() {
    // Parsing an encrypted buffer succeeds without a password; content
    // operations with the wrong one must fail, never silently corrupt.
    let options = CreateOptions::new().encrypt("pw");
    let fixture = common::save_archive(&[("s.txt", b"the secret payload")], &options);

    let buffer = std::fs::read(&fixture.path).unwrap();
    let mut archive = Archive::parse(&buffer).unwrap();

    let wrong = Password::new("not-it");
    let err = archive.verify(Some(&wrong)).unwrap_err();
    assert!(
        matches!(err, Error::DecryptFailure | Error::ChecksumMismatch { .. })
            || matches!(err, Error::DecompressionFailure(_)),
        "unexpected error: {:?}",
        err
    );
}

// =========================================================================
// Corruption
// =========================================================================

/// Flips one byte inside the first entry's data region and expects verify
/// to fail with a corruption-class error.
fn corrupt_and_verify(options: &CreateOptions, password: Option<&Password>) -> Error {
    let payload: Vec<u8> = (0..2048u32).map(|i| (i * 7 % 251) as u8).collect();
    let fixture = common::save_archive(&[("victim.bin", &payload)], options);

    let mut raw = std::fs::read(&fixture.path).unwrap();
    // 64-byte global header + 26-byte entry header + 10-byte path, then a
    // byte safely inside the stored data.
    let data_offset = 64 + 26 + "victim.bin".len() + 16;
    raw[data_offset] ^= 0x01;
    std::fs::write(&fixture.path, &raw).unwrap();

    let mut archive = Archive::open(&fixture.path, password)
        .unwrap_or_else(|e| panic!("open after corruption should succeed for plain archives: {}", e));
    archive.verify(password).unwrap_err()
}

#[test]
fn test_corrupted_plain_entry_is_checksum_mismatch() {
    let err = corrupt_and_verify(&CreateOptions::new().compress(false), None);
    assert!(matches!(err, Error::ChecksumMismatch { .. }), "{:?}", err);
}

#[test]
fn test_corrupted_compressed_entry_fails_some_layer() {
    let err = corrupt_and_verify(&CreateOptions::new(), None);
    // Depending on where the flip lands, the inflate layer or the checksum
    // catches it.
    assert!(
        matches!(
            err,
            Error::ChecksumMismatch { .. } | Error::DecompressionFailure(_)
        ),
        "{:?}",
        err
    );
}

#[test]
fn test_corrupted_encrypted_archive_fails_at_open() {
    let options = CreateOptions::new().compress(false).encrypt("pw");
    let payload = vec![0x5Au8; 1024];
    let fixture = common::save_archive(&[("victim.bin", &payload)], &options);

    let mut raw = std::fs::read(&fixture.path).unwrap();
    let data_offset = 64 + 26 + "victim.bin".len() + 16;
    raw[data_offset] ^= 0x01;
    std::fs::write(&fixture.path, &raw).unwrap();

    // Open performs first-entry validation, and corruption is deliberately
    // indistinguishable from a wrong password.
    let password = Password::new("pw");
    let err = Archive::open(&fixture.path, Some(&password)).unwrap_err();
    assert!(matches!(err, Error::DecryptFailure), "{:?}", err);
}

#[test]
fn test_verify_is_repeatable_after_failure() {
    let err1 = corrupt_and_verify(&CreateOptions::new().compress(false), None);
    let err2 = corrupt_and_verify(&CreateOptions::new().compress(false), None);
    assert_eq!(
        std::mem::discriminant(&err1),
        std::mem::discriminant(&err2)
    );
}

// =========================================================================
// Malformed and truncated archives
// =========================================================================

#[test]
fn test_bad_signature_rejected() {
    let fixture = common::save_archive(&[("f", b"x")], &CreateOptions::new());
    let mut raw = std::fs::read(&fixture.path).unwrap();
    raw[0] = b'Z';
    std::fs::write(&fixture.path, &raw).unwrap();

    let err = Archive::open(&fixture.path, None).unwrap_err();
    assert!(matches!(err, Error::MalformedHeader(_)));
}

#[test]
fn test_truncated_archive_rejected() {
    let payload = vec![1u8; 500];
    let fixture = common::save_archive(&[("f.bin", &payload)], &CreateOptions::new().compress(false));
    let raw = std::fs::read(&fixture.path).unwrap();

    // Cut inside the entry data.
    std::fs::write(&fixture.path, &raw[..raw.len() - 100]).unwrap();
    let err = Archive::open(&fixture.path, None).unwrap_err();
    assert!(matches!(err, Error::Truncated(_)), "{:?}", err);

    // Cut inside the trailing checksum.
    std::fs::write(&fixture.path, &raw[..raw.len() - 8]).unwrap();
    let err = Archive::open(&fixture.path, None).unwrap_err();
    assert!(matches!(err, Error::Truncated(_)), "{:?}", err);

    // Cut inside the global header.
    std::fs::write(&fixture.path, &raw[..40]).unwrap();
    let err = Archive::open(&fixture.path, None).unwrap_err();
    assert!(matches!(err, Error::MalformedHeader(_)), "{:?}", err);
}

#[test]
fn test_file_count_beyond_data_is_truncated() {
    let fixture = common::save_archive(&[("f", b"x")], &CreateOptions::new().compress(false));
    let mut raw = std::fs::read(&fixture.path).unwrap();
    // Bump file_count (big-endian u32 at offset 8) beyond the real records.
    raw[11] = 9;
    std::fs::write(&fixture.path, &raw).unwrap();

    let err = Archive::open(&fixture.path, None).unwrap_err();
    assert!(matches!(err, Error::Truncated(_)), "{:?}", err);
}

// =========================================================================
// Path traversal
// =========================================================================

/// Builds an archive whose entry path is hostile, by patching the path
/// bytes of a normally-created archive.
fn archive_with_hostile_path(hostile: &str) -> Vec<u8> {
    let placeholder = "X".repeat(hostile.len());
    let mut archive = Archive::create("hostile.varc");
    archive
        .add_virtual(
            placeholder.clone(),
            b"malicious".to_vec(),
            &CreateOptions::new().compress(false),
        )
        .unwrap();
    let mut raw = archive.encode();

    let path_offset = 64 + 26;
    raw[path_offset..path_offset + hostile.len()].copy_from_slice(hostile.as_bytes());
    raw
}

#[test]
fn test_traversal_paths_do_not_escape() {
    for hostile in ["../escape.txt", "a/../../escape.txt", "/etc/hostile"] {
        let raw = archive_with_hostile_path(hostile);
        let mut archive = Archive::parse(&raw).unwrap();

        let out = tempfile::TempDir::new().unwrap();
        let result = archive
            .extract_all(out.path(), None, &varc::ExtractOptions::new())
            .unwrap();

        assert!(!result.ok, "extraction of {:?} must not be ok", hostile);
        assert_eq!(result.entries_extracted, 0);
        assert!(matches!(
            result.failures[0].1,
            Error::PathTraversal { .. }
        ));

        // Nothing may exist outside the destination.
        let escape = out.path().parent().unwrap().join("escape.txt");
        assert!(!escape.exists());
    }
}

#[test]
fn test_safe_nested_paths_extract() {
    let fixture = common::save_archive(
        &[("deep/nested/dir/file.txt", b"safe")],
        &CreateOptions::new(),
    );

    let mut archive = Archive::open(&fixture.path, None).unwrap();
    let out = tempfile::TempDir::new().unwrap();
    let result = archive
        .extract_all(out.path(), None, &varc::ExtractOptions::new())
        .unwrap();

    assert!(result.ok);
    let written = out.path().join("deep/nested/dir/file.txt");
    assert_eq!(std::fs::read(written).unwrap(), b"safe");
}
