//! In-memory representation of a single archived object.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::crypto;
use crate::format::{entry_flags, EntryHeader, FileKind, CHECKSUM_SIZE, ENTRY_HEADER_SIZE};

/// The kind of object an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryKind {
    /// A regular file with content.
    #[default]
    File,
    /// A directory marker with no payload.
    Directory,
    /// A symbolic link.
    Symlink,
}

impl EntryKind {
    /// Short label used by listings.
    pub fn label(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "dir",
            Self::Symlink => "symlink",
        }
    }
}

/// A single file, directory marker, or symlink record inside an archive.
///
/// `data` holds the entry's *stored* bytes exactly as they appear on disk,
/// which may be encrypted and/or compressed original content. The checksum
/// is always the SHA-256 of the *original* bytes; it is computed when the
/// entry receives content and never recomputed by the pipeline.
#[derive(Debug, Clone, Default)]
pub struct Entry {
    /// UTF-8 relative path with `/` separators.
    pub path: String,
    /// The kind of object this entry records.
    pub kind: EntryKind,
    /// Original (plaintext, uncompressed) content size in bytes.
    pub original_size: u64,
    /// Exact length of `data`.
    pub stored_size: u64,
    /// Detected file type tag.
    pub file_type: FileKind,
    /// Entry flag bits (see [`entry_flags`]).
    pub flags: u32,
    /// Creation time, Unix seconds.
    pub creation_time: u64,
    /// Modification time, Unix seconds.
    pub modification_time: u64,
    /// SHA-256 of the original content.
    pub checksum: [u8; CHECKSUM_SIZE],
    /// Stored bytes as present on disk for this entry.
    pub data: Vec<u8>,
}

impl Entry {
    /// Creates an empty entry with current timestamps.
    pub fn new_empty() -> Self {
        let now = unix_now();
        Self {
            file_type: FileKind::Unknown,
            creation_time: now,
            modification_time: now,
            ..Default::default()
        }
    }

    /// Creates an entry holding in-memory content.
    pub fn from_bytes(path: impl Into<String>, data: Vec<u8>, kind: EntryKind) -> Self {
        let mut entry = Self::new_empty();
        entry.path = path.into();
        entry.kind = kind;
        if kind == EntryKind::Directory {
            entry.flags |= entry_flags::DIRECTORY;
        }
        entry.set_data(data);
        entry
    }

    /// Creates an entry carrying only metadata, without content.
    pub fn metadata_only(
        path: impl Into<String>,
        kind: EntryKind,
        original_size: u64,
        file_type: FileKind,
    ) -> Self {
        let mut entry = Self::new_empty();
        entry.path = path.into();
        entry.kind = kind;
        entry.original_size = original_size;
        entry.file_type = file_type;
        if kind == EntryKind::Directory {
            entry.flags |= entry_flags::DIRECTORY;
        }
        entry
    }

    /// Installs `data` as this entry's original content.
    ///
    /// Consumes the buffer, recomputes both sizes and the SHA-256 checksum,
    /// and detects the file type when it is still unknown. The pipeline may
    /// later replace `data` with transformed bytes, but the checksum set
    /// here stays authoritative.
    pub fn set_data(&mut self, data: Vec<u8>) {
        self.original_size = data.len() as u64;
        self.stored_size = data.len() as u64;
        self.checksum = crypto::sha256(&data);
        if self.file_type == FileKind::Unknown {
            self.file_type = FileKind::detect(&data);
        }
        self.data = data;
    }

    /// Replaces the stored bytes with pipeline output, updating
    /// `stored_size` but leaving the checksum untouched.
    pub fn set_stored_data(&mut self, data: Vec<u8>) {
        self.stored_size = data.len() as u64;
        self.data = data;
    }

    /// Securely wipes and releases the data buffer.
    pub fn clear_data(&mut self) {
        crypto::secure_wipe(&mut self.data);
        self.data = Vec::new();
        self.stored_size = 0;
    }

    /// Returns true if the COMPRESSED flag is set.
    pub fn is_compressed(&self) -> bool {
        self.flags & entry_flags::COMPRESSED != 0
    }

    /// Returns true if the ENCRYPTED flag is set.
    pub fn is_encrypted(&self) -> bool {
        self.flags & entry_flags::ENCRYPTED != 0
    }

    /// Returns true if this entry is a directory marker.
    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory || self.flags & entry_flags::DIRECTORY != 0
    }

    /// Returns true if this entry is a symbolic link.
    pub fn is_symlink(&self) -> bool {
        self.kind == EntryKind::Symlink || self.flags & entry_flags::SYMLINK != 0
    }

    /// Returns true if the HIDDEN flag is set.
    pub fn is_hidden(&self) -> bool {
        self.flags & entry_flags::HIDDEN != 0
    }

    /// Builds the fixed entry header for serialization.
    pub fn header(&self) -> EntryHeader {
        EntryHeader {
            path_length: self.path.len() as u16,
            original_size: self.original_size,
            stored_size: self.stored_size,
            file_type: self.file_type as u32,
            flags: self.flags,
        }
    }

    /// Total on-disk size of this entry's record:
    /// `26 + path + stored bytes + 32-byte checksum`.
    pub fn total_serialized_size(&self) -> u64 {
        ENTRY_HEADER_SIZE as u64
            + self.path.len() as u64
            + self.stored_size
            + CHECKSUM_SIZE as u64
    }

    /// Compression ratio as a percentage (stored / original * 100).
    pub fn compression_ratio(&self) -> f64 {
        if self.original_size == 0 {
            0.0
        } else {
            self.stored_size as f64 * 100.0 / self.original_size as f64
        }
    }
}

/// Formats a byte count with binary-ish units, as listings display sizes.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit])
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
