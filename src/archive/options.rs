//! Option types for archive operations.

use crate::codec;
use crate::crypto::Password;
use crate::error::Result;

/// Options controlling how entries are added to an archive.
#[derive(Debug, Clone)]
pub struct CreateOptions {
    /// Compress entry content with DEFLATE.
    pub compress: bool,
    /// Compression level (0-9).
    pub compression_level: u32,
    /// Encrypt entry content with the archive key.
    pub encrypt: bool,
    /// Passphrase used to establish the archive key on the first
    /// encrypting add. Ignored once the archive has crypto state.
    pub password: Option<Password>,
    /// Include hidden files (leading-dot components) when adding
    /// directories.
    pub include_hidden: bool,
    /// Glob patterns (`*`, `?`) excluded when adding directories.
    pub exclude_patterns: Vec<String>,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            compress: true,
            compression_level: codec::LEVEL_DEFAULT,
            encrypt: false,
            password: None,
            include_hidden: false,
            exclude_patterns: Vec::new(),
        }
    }
}

impl CreateOptions {
    /// Creates options with defaults: compress at level 6, no encryption.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables compression.
    pub fn compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Sets the compression level.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidArgument`] for levels above 9.
    pub fn level(mut self, level: u32) -> Result<Self> {
        codec::validate_level(level)?;
        self.compression_level = level;
        Ok(self)
    }

    /// Enables encryption with the given passphrase.
    pub fn encrypt(mut self, password: impl Into<Password>) -> Self {
        self.encrypt = true;
        self.password = Some(password.into());
        self
    }

    /// Includes hidden files when adding directories.
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Adds a glob pattern to exclude when adding directories.
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }
}

/// Options controlling extraction.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Replace existing files. When false, entries whose output path
    /// already exists are skipped.
    pub overwrite: bool,
    /// Substring whitelist: an entry is extracted iff its path contains at
    /// least one of these. Empty means extract everything.
    pub filter: Vec<String>,
}

impl ExtractOptions {
    /// Creates options with defaults: no overwrite, no filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables replacing existing files.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Adds a substring to the extraction whitelist.
    pub fn filter(mut self, needle: impl Into<String>) -> Self {
        self.filter.push(needle.into());
        self
    }

    pub(crate) fn matches(&self, path: &str) -> bool {
        self.filter.is_empty() || self.filter.iter().any(|f| path.contains(f.as_str()))
    }
}

/// Options controlling the human-readable listing.
#[derive(Debug, Clone)]
pub struct ListOptions {
    /// Show the entry type column.
    pub show_type: bool,
    /// Show the hex SHA-256 checksum column.
    pub show_checksums: bool,
    /// Show the modification time column.
    pub show_timestamps: bool,
    /// Format sizes with units instead of raw byte counts.
    pub human_readable: bool,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            show_type: true,
            show_checksums: false,
            show_timestamps: true,
            human_readable: true,
        }
    }
}

impl ListOptions {
    /// Creates options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw output: path and exact byte sizes only.
    pub fn raw() -> Self {
        Self {
            show_type: false,
            show_checksums: false,
            show_timestamps: false,
            human_readable: false,
        }
    }

    /// Enables the checksum column.
    pub fn checksums(mut self, show: bool) -> Self {
        self.show_checksums = show;
        self
    }

    /// Enables the timestamp column.
    pub fn timestamps(mut self, show: bool) -> Self {
        self.show_timestamps = show;
        self
    }
}
