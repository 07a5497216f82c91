//! Error types for VARC archive operations.
//!
//! All fallible operations in this crate return [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`. The [`Error`] enum covers every failure
//! mode of the format codec, the crypto and compression providers, and the
//! archive controller.
//!
//! ```rust,no_run
//! use varc::{Archive, Error};
//!
//! fn open_archive(path: &str) -> varc::Result<()> {
//!     match Archive::open(path, None) {
//!         Ok(archive) => {
//!             println!("{} entries", archive.entry_count());
//!             Ok(())
//!         }
//!         Err(Error::PasswordRequired) => {
//!             eprintln!("This archive is encrypted.");
//!             Err(Error::PasswordRequired)
//!         }
//!         Err(e) => Err(e),
//!     }
//! }
//! ```

use std::io;

/// The main error type for VARC archive operations.
///
/// # Error Categories
///
/// | Category | Variants | Typical cause |
/// |----------|----------|---------------|
/// | I/O | [`Io`][Self::Io] | File system operations |
/// | Format | [`MalformedHeader`][Self::MalformedHeader], [`Truncated`][Self::Truncated] | Invalid archive data |
/// | Encryption | [`PasswordRequired`][Self::PasswordRequired], [`DecryptFailure`][Self::DecryptFailure], [`CryptoFailure`][Self::CryptoFailure] | Missing/wrong password, CSPRNG failure |
/// | Compression | [`CompressionFailure`][Self::CompressionFailure], [`DecompressionFailure`][Self::DecompressionFailure] | DEFLATE layer errors |
/// | Integrity | [`ChecksumMismatch`][Self::ChecksumMismatch] | Data corruption |
/// | Security | [`PathTraversal`][Self::PathTraversal] | Unsafe entry paths on extraction |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The archive header is invalid: bad signature, unsupported version,
    /// or a buffer shorter than the fixed header size.
    #[error("malformed header: {0}")]
    MalformedHeader(String),

    /// The archive ends before the expected path, data, or checksum bytes
    /// of an entry record.
    #[error("truncated archive: {0}")]
    Truncated(String),

    /// The archive is encrypted and no password was provided.
    #[error("password required for encrypted archive")]
    PasswordRequired,

    /// Decryption failed. A wrong password and corrupted ciphertext are
    /// deliberately indistinguishable here.
    #[error("decryption failed: wrong password or corrupted data")]
    DecryptFailure,

    /// The DEFLATE layer failed while compressing.
    #[error("compression failed: {0}")]
    CompressionFailure(String),

    /// The DEFLATE layer failed while decompressing, including output that
    /// does not match the expected size.
    #[error("decompression failed: {0}")]
    DecompressionFailure(String),

    /// The SHA-256 checksum of an entry's restored content does not match
    /// the stored value.
    #[error("checksum mismatch for entry '{path}'")]
    ChecksumMismatch {
        /// The entry path that failed verification.
        path: String,
    },

    /// An entry path was not found in the archive.
    #[error("entry not found: {path}")]
    NotFound {
        /// The path that was not found.
        path: String,
    },

    /// An entry with the same path already exists in the archive.
    #[error("entry already exists: {path}")]
    EntryExists {
        /// The path that already exists.
        path: String,
    },

    /// An argument was invalid: empty password where one is required,
    /// compression level outside 0-9, or a path longer than 65535 bytes.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The system CSPRNG failed to produce random bytes.
    #[error("cryptographic failure: {0}")]
    CryptoFailure(String),

    /// An entry path would escape the extraction directory.
    ///
    /// This is a **security error**: the archive contains an absolute path
    /// or a `..` component designed to write outside the destination.
    #[error("path traversal detected in entry '{path}'")]
    PathTraversal {
        /// The offending entry path.
        path: String,
    },
}

impl Error {
    /// Returns `true` if this error indicates a security issue.
    ///
    /// Security errors should abort extraction unless the archive source is
    /// fully trusted.
    pub fn is_security_error(&self) -> bool {
        matches!(self, Error::PathTraversal { .. })
    }

    /// Returns `true` if this is a data corruption error.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Error::ChecksumMismatch { .. }
                | Error::Truncated(_)
                | Error::MalformedHeader(_)
                | Error::DecompressionFailure(_)
        )
    }

    /// Returns `true` if this is an encryption-related error.
    pub fn is_encryption_error(&self) -> bool {
        matches!(
            self,
            Error::PasswordRequired | Error::DecryptFailure | Error::CryptoFailure(_)
        )
    }

    /// Returns the entry path associated with this error, if any.
    pub fn entry_path(&self) -> Option<&str> {
        match self {
            Error::ChecksumMismatch { path } => Some(path),
            Error::NotFound { path } => Some(path),
            Error::EntryExists { path } => Some(path),
            Error::PathTraversal { path } => Some(path),
            _ => None,
        }
    }

    /// Creates a `MalformedHeader` error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Error::MalformedHeader(reason.into())
    }

    /// Creates a `Truncated` error.
    pub fn truncated(reason: impl Into<String>) -> Self {
        Error::Truncated(reason.into())
    }

    /// Creates a `NotFound` error for the given entry path.
    pub fn not_found(path: impl Into<String>) -> Self {
        Error::NotFound { path: path.into() }
    }
}

/// A specialized `Result` type for VARC operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_from() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_malformed_header() {
        let err = Error::malformed("bad signature");
        assert_eq!(err.to_string(), "malformed header: bad signature");
        assert!(err.is_corruption());
    }

    #[test]
    fn test_decrypt_failure_is_ambiguous() {
        // Wrong password and corrupted data share one message by design.
        let err = Error::DecryptFailure;
        let msg = err.to_string();
        assert!(msg.contains("wrong password"));
        assert!(msg.contains("corrupted"));
        assert!(err.is_encryption_error());
    }

    #[test]
    fn test_checksum_mismatch() {
        let err = Error::ChecksumMismatch {
            path: "docs/report.pdf".into(),
        };
        assert!(err.to_string().contains("docs/report.pdf"));
        assert!(err.is_corruption());
        assert_eq!(err.entry_path(), Some("docs/report.pdf"));
    }

    #[test]
    fn test_path_traversal_is_security_error() {
        let err = Error::PathTraversal {
            path: "../etc/passwd".into(),
        };
        assert!(err.is_security_error());
        assert!(!err.is_encryption_error());
        assert_eq!(err.entry_path(), Some("../etc/passwd"));
    }

    #[test]
    fn test_entry_exists() {
        let err = Error::EntryExists {
            path: "hello.txt".into(),
        };
        assert_eq!(err.to_string(), "entry already exists: hello.txt");
    }

    #[test]
    fn test_password_required() {
        let err = Error::PasswordRequired;
        assert!(err.to_string().contains("password required"));
        assert!(err.is_encryption_error());
        assert!(!err.is_corruption());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
