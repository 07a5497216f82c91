//! Content-based file-type detection.
//!
//! Entries carry a coarse file-type tag so that listings can show what a
//! file is and the compressor can pick a sensible level without trusting
//! file extensions. Detection is purely magic-byte based.

/// Coarse file classification stored in each entry header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u32)]
pub enum FileKind {
    /// Could not be classified (or content shorter than 4 bytes).
    #[default]
    Unknown = 0,
    /// Mostly printable ASCII.
    Text = 1,
    /// Unclassified binary data.
    Binary = 2,
    /// PNG, GIF, JPEG, or WebP image.
    Image = 3,
    /// MP3 or Ogg audio.
    Audio = 4,
    /// ISO-BMFF (MP4 family) video.
    Video = 5,
    /// PDF document.
    Document = 6,
    /// ZIP-family archive.
    Archive = 7,
}

impl FileKind {
    /// Converts the on-disk tag back to a `FileKind`.
    ///
    /// Unrecognized tags map to `Unknown` so that archives written by newer
    /// versions still open.
    pub fn from_u32(value: u32) -> Self {
        match value {
            1 => Self::Text,
            2 => Self::Binary,
            3 => Self::Image,
            4 => Self::Audio,
            5 => Self::Video,
            6 => Self::Document,
            7 => Self::Archive,
            _ => Self::Unknown,
        }
    }

    /// Short label used by listings.
    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Text => "text",
            Self::Binary => "binary",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Document => "document",
            Self::Archive => "archive",
        }
    }

    /// Classifies content by magic bytes.
    ///
    /// Rules are tried top to bottom; content that matches no signature is
    /// classified as text if at least 90% of its first 256 bytes are
    /// printable ASCII (or `\n`, `\r`, `\t`), and binary otherwise.
    pub fn detect(data: &[u8]) -> Self {
        if data.len() < 4 {
            return Self::Unknown;
        }

        if data.starts_with(b"\x89PNG\r\n\x1a\n")
            || data.starts_with(b"GIF87a")
            || data.starts_with(b"GIF89a")
            || data.starts_with(b"\xFF\xD8\xFF")
        {
            return Self::Image;
        }
        if data.starts_with(b"RIFF") && data.len() >= 12 && &data[8..12] == b"WEBP" {
            return Self::Image;
        }

        if data.starts_with(b"ID3")
            || data.starts_with(b"\xFF\xFB")
            || data.starts_with(b"\xFF\xFA")
            || data.starts_with(b"OggS")
        {
            return Self::Audio;
        }

        // ISO-BMFF: 4-byte box size, then "ftyp".
        if data.len() >= 8 && data.starts_with(b"\x00\x00\x00") && &data[4..8] == b"ftyp" {
            return Self::Video;
        }

        if data.starts_with(b"%PDF") {
            return Self::Document;
        }

        if data.starts_with(b"PK\x03\x04") || data.starts_with(b"PK\x05\x06") {
            return Self::Archive;
        }

        let sample = &data[..data.len().min(256)];
        let printable = sample
            .iter()
            .filter(|&&b| (32..=126).contains(&b) || b == b'\n' || b == b'\r' || b == b'\t')
            .count();
        if printable as f64 > sample.len() as f64 * 0.9 {
            Self::Text
        } else {
            Self::Binary
        }
    }
}
