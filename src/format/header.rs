//! Fixed-layout binary codec for the global header, entry headers, and the
//! optional metadata block.
//!
//! Encoding is byte-exact: decoding a header and re-encoding it reproduces
//! the input bytes, including reserved fields, which are preserved verbatim
//! for forward compatibility.

use crate::error::{Error, Result};
use crate::format::{
    archive_flags, CHECKSUM_SIZE, ENTRY_HEADER_SIZE, GLOBAL_HEADER_SIZE, IV_SIZE, SALT_SIZE,
    SIGNATURE, VERSION,
};

/// Global archive header, written at the beginning of every `.varc` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalHeader {
    /// Format version as `(major << 8) | minor`.
    pub version: u16,
    /// Archive flag bits (see [`archive_flags`]).
    pub flags: u16,
    /// Number of entry records that follow.
    pub file_count: u32,
    /// PBKDF2 salt; all zeros when the archive is not encrypted.
    pub salt: [u8; SALT_SIZE],
    /// AES initialization vector for entry encryption.
    pub iv: [u8; IV_SIZE],
    /// Reserved tail bytes, preserved verbatim.
    pub reserved: [u8; 4],
}

impl Default for GlobalHeader {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobalHeader {
    /// Creates a header for an empty, unencrypted archive.
    pub fn new() -> Self {
        Self {
            version: VERSION,
            flags: 0,
            file_count: 0,
            salt: [0; SALT_SIZE],
            iv: [0; IV_SIZE],
            reserved: [0; 4],
        }
    }

    /// Returns true if the ENCRYPTED flag is set.
    pub fn is_encrypted(&self) -> bool {
        self.flags & archive_flags::ENCRYPTED != 0
    }

    /// Returns true if the COMPRESSED hint flag is set.
    pub fn is_compressed(&self) -> bool {
        self.flags & archive_flags::COMPRESSED != 0
    }

    /// Returns true if a metadata block follows this header.
    pub fn has_metadata(&self) -> bool {
        self.flags & archive_flags::HAS_METADATA != 0
    }

    /// Serializes the header to its fixed 64-byte layout.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(GLOBAL_HEADER_SIZE);
        buf.extend_from_slice(&SIGNATURE);
        buf.extend_from_slice(&self.version.to_be_bytes());
        buf.extend_from_slice(&self.flags.to_be_bytes());
        buf.extend_from_slice(&self.file_count.to_be_bytes());
        buf.extend_from_slice(&self.salt);
        buf.extend_from_slice(&self.iv);
        buf.extend_from_slice(&self.reserved);
        debug_assert_eq!(buf.len(), GLOBAL_HEADER_SIZE);
        buf
    }

    /// Parses a header from the start of `data`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedHeader`] if the buffer is shorter than 64
    /// bytes, the signature does not match, or the version is newer than
    /// this implementation supports.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < GLOBAL_HEADER_SIZE {
            return Err(Error::malformed(format!(
                "buffer too small for global header: {} bytes (need {})",
                data.len(),
                GLOBAL_HEADER_SIZE
            )));
        }

        if data[0..4] != SIGNATURE {
            return Err(Error::malformed("bad signature (expected 'VARC')"));
        }

        let version = read_u16(data, 4);
        if version > VERSION {
            return Err(Error::malformed(format!(
                "unsupported format version {:#06x} (max {:#06x})",
                version, VERSION
            )));
        }

        let flags = read_u16(data, 6);
        let file_count = read_u32(data, 8);

        let mut salt = [0u8; SALT_SIZE];
        salt.copy_from_slice(&data[12..12 + SALT_SIZE]);
        let mut iv = [0u8; IV_SIZE];
        iv.copy_from_slice(&data[44..44 + IV_SIZE]);
        let mut reserved = [0u8; 4];
        reserved.copy_from_slice(&data[60..64]);

        Ok(Self {
            version,
            flags,
            file_count,
            salt,
            iv,
            reserved,
        })
    }
}

/// Fixed 26-byte header preceding each entry's payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryHeader {
    /// Byte length of the UTF-8 path that follows this header.
    pub path_length: u16,
    /// Original (plaintext, uncompressed) content size.
    pub original_size: u64,
    /// Exact byte length of the stored payload.
    pub stored_size: u64,
    /// Detected file-type tag (see [`super::FileKind`]).
    pub file_type: u32,
    /// Per-entry flag bits (see [`super::entry_flags`]).
    pub flags: u32,
}

impl EntryHeader {
    /// Serializes the entry header to its fixed 26-byte layout.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(ENTRY_HEADER_SIZE);
        buf.extend_from_slice(&self.path_length.to_be_bytes());
        buf.extend_from_slice(&self.original_size.to_be_bytes());
        buf.extend_from_slice(&self.stored_size.to_be_bytes());
        buf.extend_from_slice(&self.file_type.to_be_bytes());
        buf.extend_from_slice(&self.flags.to_be_bytes());
        debug_assert_eq!(buf.len(), ENTRY_HEADER_SIZE);
        buf
    }

    /// Parses an entry header from the start of `data`.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < ENTRY_HEADER_SIZE {
            return Err(Error::malformed(format!(
                "buffer too small for entry header: {} bytes (need {})",
                data.len(),
                ENTRY_HEADER_SIZE
            )));
        }

        Ok(Self {
            path_length: read_u16(data, 0),
            original_size: read_u64(data, 2),
            stored_size: read_u64(data, 10),
            file_type: read_u32(data, 18),
            flags: read_u32(data, 22),
        })
    }

    /// Total on-disk size of the record this header describes.
    pub fn record_size(&self) -> u64 {
        ENTRY_HEADER_SIZE as u64
            + self.path_length as u64
            + self.stored_size
            + CHECKSUM_SIZE as u64
    }
}

/// Optional archive metadata, stored after the global header when the
/// HAS_METADATA flag is set.
///
/// Layout: `creation_time (u64) | modification_time (u64) | creator_len
/// (u32) | creator | description_len (u32) | description | tag_count (u16) |
/// tag_count x (key_len (u16), key, value_len (u16), value)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveMetadata {
    /// Archive creation time, Unix seconds.
    pub creation_time: u64,
    /// Last modification time, Unix seconds.
    pub modification_time: u64,
    /// Creator name or identifier.
    pub creator: String,
    /// Free-form archive description.
    pub description: String,
    /// Custom key/value tags.
    pub tags: Vec<(String, String)>,
}

impl ArchiveMetadata {
    /// Serializes the metadata block.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&self.creation_time.to_be_bytes());
        buf.extend_from_slice(&self.modification_time.to_be_bytes());

        buf.extend_from_slice(&(self.creator.len() as u32).to_be_bytes());
        buf.extend_from_slice(self.creator.as_bytes());
        buf.extend_from_slice(&(self.description.len() as u32).to_be_bytes());
        buf.extend_from_slice(self.description.as_bytes());

        buf.extend_from_slice(&(self.tags.len() as u16).to_be_bytes());
        for (key, value) in &self.tags {
            buf.extend_from_slice(&(key.len() as u16).to_be_bytes());
            buf.extend_from_slice(key.as_bytes());
            buf.extend_from_slice(&(value.len() as u16).to_be_bytes());
            buf.extend_from_slice(value.as_bytes());
        }
        buf
    }

    /// Parses a metadata block from `data` starting at `offset`.
    ///
    /// Returns the metadata and the number of bytes consumed.
    pub fn decode(data: &[u8], offset: usize) -> Result<(Self, usize)> {
        let mut pos = offset;

        let creation_time = read_u64_checked(data, &mut pos)?;
        let modification_time = read_u64_checked(data, &mut pos)?;

        let creator = read_string_u32(data, &mut pos)?;
        let description = read_string_u32(data, &mut pos)?;

        let tag_count = read_u16_checked(data, &mut pos)?;
        let mut tags = Vec::with_capacity(tag_count as usize);
        for _ in 0..tag_count {
            let key = read_string_u16(data, &mut pos)?;
            let value = read_string_u16(data, &mut pos)?;
            tags.push((key, value));
        }

        Ok((
            Self {
                creation_time,
                modification_time,
                creator,
                description,
                tags,
            },
            pos - offset,
        ))
    }
}

// Unchecked readers for fixed-size headers whose length was validated once.

fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([data[offset], data[offset + 1]])
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&data[offset..offset + 4]);
    u32::from_be_bytes(buf)
}

fn read_u64(data: &[u8], offset: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&data[offset..offset + 8]);
    u64::from_be_bytes(buf)
}

// Checked readers for the variable-length metadata block.

fn read_u16_checked(data: &[u8], pos: &mut usize) -> Result<u16> {
    if data.len() < *pos + 2 {
        return Err(Error::malformed("metadata block truncated"));
    }
    let value = read_u16(data, *pos);
    *pos += 2;
    Ok(value)
}

fn read_u32_checked(data: &[u8], pos: &mut usize) -> Result<u32> {
    if data.len() < *pos + 4 {
        return Err(Error::malformed("metadata block truncated"));
    }
    let value = read_u32(data, *pos);
    *pos += 4;
    Ok(value)
}

fn read_u64_checked(data: &[u8], pos: &mut usize) -> Result<u64> {
    if data.len() < *pos + 8 {
        return Err(Error::malformed("metadata block truncated"));
    }
    let value = read_u64(data, *pos);
    *pos += 8;
    Ok(value)
}

fn read_bytes_checked<'a>(data: &'a [u8], pos: &mut usize, len: usize) -> Result<&'a [u8]> {
    if data.len() < *pos + len {
        return Err(Error::malformed("metadata block truncated"));
    }
    let bytes = &data[*pos..*pos + len];
    *pos += len;
    Ok(bytes)
}

fn read_string_u32(data: &[u8], pos: &mut usize) -> Result<String> {
    let len = read_u32_checked(data, pos)? as usize;
    let bytes = read_bytes_checked(data, pos, len)?;
    String::from_utf8(bytes.to_vec())
        .map_err(|_| Error::malformed("metadata string is not valid UTF-8"))
}

fn read_string_u16(data: &[u8], pos: &mut usize) -> Result<String> {
    let len = read_u16_checked(data, pos)? as usize;
    let bytes = read_bytes_checked(data, pos, len)?;
    String::from_utf8(bytes.to_vec())
        .map_err(|_| Error::malformed("metadata string is not valid UTF-8"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_header_default() {
        let header = GlobalHeader::new();
        assert_eq!(header.version, 0x0003);
        assert_eq!(header.flags, 0);
        assert_eq!(header.file_count, 0);
        assert_eq!(header.salt, [0u8; 32]);
        assert!(!header.is_encrypted());
        assert!(!header.is_compressed());
    }

    #[test]
    fn test_global_header_roundtrip() {
        let mut header = GlobalHeader::new();
        header.flags = archive_flags::ENCRYPTED | archive_flags::COMPRESSED;
        header.file_count = 42;
        header.salt = [0xAB; 32];
        header.iv = [0xCD; 16];

        let bytes = header.encode();
        assert_eq!(bytes.len(), GLOBAL_HEADER_SIZE);
        assert_eq!(&bytes[0..4], b"VARC");

        let parsed = GlobalHeader::decode(&bytes).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_global_header_preserves_reserved_bits() {
        // Unknown flag bits and reserved bytes must survive a round trip.
        let mut header = GlobalHeader::new();
        header.flags = 0x8000 | archive_flags::ENCRYPTED;
        header.reserved = [1, 2, 3, 4];

        let bytes = header.encode();
        let parsed = GlobalHeader::decode(&bytes).unwrap();
        assert_eq!(parsed.flags, 0x8001);
        assert_eq!(parsed.reserved, [1, 2, 3, 4]);
        assert_eq!(parsed.encode(), bytes);
    }

    #[test]
    fn test_global_header_bad_signature() {
        let mut bytes = GlobalHeader::new().encode();
        bytes[0] = b'X';
        let err = GlobalHeader::decode(&bytes).unwrap_err();
        assert!(matches!(err, Error::MalformedHeader(_)));
    }

    #[test]
    fn test_global_header_short_buffer() {
        let bytes = GlobalHeader::new().encode();
        let err = GlobalHeader::decode(&bytes[..63]).unwrap_err();
        assert!(matches!(err, Error::MalformedHeader(_)));
    }

    #[test]
    fn test_global_header_future_version_rejected() {
        let mut bytes = GlobalHeader::new().encode();
        // version = 0x0104
        bytes[4] = 0x01;
        bytes[5] = 0x04;
        let err = GlobalHeader::decode(&bytes).unwrap_err();
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn test_entry_header_roundtrip() {
        let header = EntryHeader {
            path_length: 17,
            original_size: 1_000_000,
            stored_size: 4321,
            file_type: 6,
            flags: 0x0003,
        };

        let bytes = header.encode();
        assert_eq!(bytes.len(), ENTRY_HEADER_SIZE);

        let parsed = EntryHeader::decode(&bytes).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_entry_header_big_endian_layout() {
        let header = EntryHeader {
            path_length: 0x0102,
            original_size: 0x0304050607080910,
            stored_size: 0,
            file_type: 0,
            flags: 0,
        };
        let bytes = header.encode();
        assert_eq!(&bytes[0..2], &[0x01, 0x02]);
        assert_eq!(
            &bytes[2..10],
            &[0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x10]
        );
    }

    #[test]
    fn test_entry_header_short_buffer() {
        let bytes = EntryHeader::default().encode();
        assert!(EntryHeader::decode(&bytes[..25]).is_err());
    }

    #[test]
    fn test_entry_record_size() {
        let header = EntryHeader {
            path_length: 9,
            original_size: 6,
            stored_size: 6,
            file_type: 1,
            flags: 0,
        };
        // 26 + 9 + 6 + 32
        assert_eq!(header.record_size(), 73);
    }

    #[test]
    fn test_metadata_roundtrip() {
        let meta = ArchiveMetadata {
            creation_time: 1_700_000_000,
            modification_time: 1_700_000_123,
            creator: "backup-job".into(),
            description: "nightly snapshot".into(),
            tags: vec![
                ("host".into(), "build-7".into()),
                ("retention".into(), "30d".into()),
            ],
        };

        let bytes = meta.encode();
        let (parsed, consumed) = ArchiveMetadata::decode(&bytes, 0).unwrap();
        assert_eq!(parsed, meta);
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn test_metadata_empty_roundtrip() {
        let meta = ArchiveMetadata::default();
        let bytes = meta.encode();
        let (parsed, consumed) = ArchiveMetadata::decode(&bytes, 0).unwrap();
        assert_eq!(parsed, meta);
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn test_metadata_truncated() {
        let meta = ArchiveMetadata {
            creator: "someone".into(),
            ..Default::default()
        };
        let bytes = meta.encode();
        assert!(ArchiveMetadata::decode(&bytes[..bytes.len() - 1], 0).is_err());
    }
}
