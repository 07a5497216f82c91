//! The VARC container format: constants, flags, and the binary codec.
//!
//! A VARC archive is a single self-describing file:
//!
//! ```text
//! global_header (64 B) | entry_record_0 | entry_record_1 | ...
//! ```
//!
//! Each entry record is `entry_header (26 B) | path (UTF-8) | stored bytes |
//! checksum (32 B SHA-256 of the original content)`. There is no trailer and
//! no central directory; records are parsed strictly in order. All
//! multi-byte integers are big-endian.

mod detect;
mod header;

pub use detect::FileKind;
pub use header::{ArchiveMetadata, EntryHeader, GlobalHeader};

/// Magic bytes at offset 0 of every archive: `V A R C`.
pub const SIGNATURE: [u8; 4] = *b"VARC";

/// Current format version, laid out as `(major << 8) | minor`.
pub const VERSION: u16 = 0x0003;

/// Size of the fixed global header in bytes.
pub const GLOBAL_HEADER_SIZE: usize = 64;

/// Size of the fixed per-entry header in bytes.
pub const ENTRY_HEADER_SIZE: usize = 26;

/// PBKDF2 salt size in bytes.
pub const SALT_SIZE: usize = 32;

/// AES initialization vector size in bytes.
pub const IV_SIZE: usize = 16;

/// SHA-256 checksum size in bytes.
pub const CHECKSUM_SIZE: usize = 32;

/// Maximum entry path length in bytes; the on-disk field is 16 bits.
pub const MAX_PATH_LENGTH: usize = 65535;

/// Archive-level flag bits stored in the global header.
pub mod archive_flags {
    /// The archive carries encrypted entries (salt and IV are populated).
    pub const ENCRYPTED: u16 = 0x0001;
    /// Hint that the archive carries compressed entries.
    pub const COMPRESSED: u16 = 0x0002;
    /// A metadata block follows the global header.
    pub const HAS_METADATA: u16 = 0x0004;
    /// Reserved bits, preserved verbatim on round trip.
    pub const RESERVED: u16 = 0xFFF8;
}

/// Per-entry flag bits stored in each entry header.
pub mod entry_flags {
    /// Stored bytes are a DEFLATE stream.
    pub const COMPRESSED: u32 = 0x0001;
    /// Stored bytes are AES-256-CBC ciphertext (under the compression
    /// layer, if both are set).
    pub const ENCRYPTED: u32 = 0x0002;
    /// Entry is a directory marker with no payload.
    pub const DIRECTORY: u32 = 0x0004;
    /// Entry is a symbolic link.
    pub const SYMLINK: u32 = 0x0008;
    /// Entry was hidden on the source filesystem.
    pub const HIDDEN: u32 = 0x0010;
    /// Entry was read-only on the source filesystem.
    pub const READONLY: u32 = 0x0020;
}
