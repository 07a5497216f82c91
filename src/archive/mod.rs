//! The archive controller: owns the header, the ordered entry list, and the
//! crypto/compression providers, and mediates every operation between
//! callers and the entry pipeline.
//!
//! # State machine
//!
//! ```text
//! Closed -> (create | open) -> Open -> (mutate*) -> save -> Open
//!                                 \-> close (auto-saves if modified) -> Closed
//! ```
//!
//! Archives are loaded whole: `open` reads the complete file into memory
//! and parses every entry record up front. There is no random access and no
//! internal threading; batch operations run to completion (or error) on the
//! calling thread and report per-entry progress synchronously.
//!
//! # Example
//!
//! ```rust,no_run
//! use varc::{Archive, CreateOptions};
//!
//! fn main() -> varc::Result<()> {
//!     let mut archive = Archive::create("backup.varc");
//!     archive.add_virtual("hello.txt", b"hello\n".to_vec(), &CreateOptions::new())?;
//!     archive.save()?;
//!
//!     let mut archive = Archive::open("backup.varc", None)?;
//!     let content = archive.read_entry("hello.txt", None)?;
//!     assert_eq!(content, b"hello\n");
//!     Ok(())
//! }
//! ```

mod list;
mod options;
mod pipeline;

pub use options::{CreateOptions, ExtractOptions, ListOptions};

use std::path::{Path, PathBuf};

use crate::crypto::{CryptoProvider, Password};
use crate::entry::{Entry, EntryKind};
use crate::error::{Error, Result};
use crate::format::{
    archive_flags, ArchiveMetadata, EntryHeader, FileKind, GlobalHeader, CHECKSUM_SIZE,
    ENTRY_HEADER_SIZE, GLOBAL_HEADER_SIZE, IV_SIZE, MAX_PATH_LENGTH, SALT_SIZE,
};
use crate::progress::{NoProgress, ProgressReporter};
use crate::{codec, crypto, fsio, glob, safety};

use pipeline::CryptoState;

/// Aggregated outcome of a batch add operation.
///
/// Batch operations do not roll back: entries added before a failure stay
/// in the in-memory list and will be written by the next `save`. Discard
/// them by dropping the archive without saving.
#[derive(Debug, Default)]
pub struct BatchResult {
    /// True when every input was added.
    pub ok: bool,
    /// Number of entries added.
    pub entries_processed: u64,
    /// Total original bytes added.
    pub bytes_processed: u64,
    /// Per-input failures, in input order.
    pub failures: Vec<(String, Error)>,
}

/// Aggregated outcome of `extract_all`.
#[derive(Debug, Default)]
pub struct ExtractResult {
    /// True when no entry failed (skips do not count as failures).
    pub ok: bool,
    /// Number of file entries written to disk.
    pub entries_extracted: u64,
    /// Entries skipped because the output existed and overwrite was off,
    /// or because they did not match the filter.
    pub entries_skipped: u64,
    /// Total original bytes written.
    pub bytes_written: u64,
    /// Per-entry failures, in archive order.
    pub failures: Vec<(String, Error)>,
}

/// Aggregate size statistics for an archive.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveStats {
    /// Number of entries.
    pub entries: u64,
    /// Sum of original sizes.
    pub total_original_size: u64,
    /// Sum of stored sizes.
    pub total_stored_size: u64,
    /// `stored / original * 100`, or 0 when empty.
    pub ratio: f64,
}

/// An in-memory VARC archive.
///
/// Not safe for concurrent access; use one archive per thread.
pub struct Archive {
    filepath: Option<PathBuf>,
    header: GlobalHeader,
    metadata: Option<ArchiveMetadata>,
    entries: Vec<Entry>,
    loaded: bool,
    modified: bool,
    provider: CryptoProvider,
    crypto_state: Option<CryptoState>,
}

impl std::fmt::Debug for Archive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("filepath", &self.filepath)
            .field("entries", &self.entries.len())
            .field("loaded", &self.loaded)
            .field("modified", &self.modified)
            .finish_non_exhaustive()
    }
}

impl Default for Archive {
    fn default() -> Self {
        Self::new()
    }
}

impl Archive {
    /// Creates a closed archive object.
    pub fn new() -> Self {
        Self {
            filepath: None,
            header: GlobalHeader::new(),
            metadata: None,
            entries: Vec::new(),
            loaded: false,
            modified: false,
            provider: CryptoProvider::new(),
            crypto_state: None,
        }
    }

    /// Creates a new empty archive bound to `path`.
    ///
    /// Nothing is written until [`save`][Self::save] is called; the archive
    /// starts out open and modified.
    pub fn create(path: impl Into<PathBuf>) -> Self {
        let mut archive = Self::new();
        archive.filepath = Some(path.into());
        archive.loaded = true;
        archive.modified = true;
        archive
    }

    /// Opens an existing archive, reading and parsing the whole file.
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedHeader`] for a bad signature or version,
    /// - [`Error::Truncated`] when the file ends mid-record,
    /// - [`Error::PasswordRequired`] for an encrypted archive without a
    ///   password,
    /// - [`Error::DecryptFailure`] when the password does not decrypt the
    ///   first encrypted entry.
    pub fn open(path: impl Into<PathBuf>, password: Option<&Password>) -> Result<Self> {
        let path = path.into();
        let buffer = fsio::read_all(&path)?;

        let mut archive = Self::parse(&buffer)?;
        archive.filepath = Some(path);

        if archive.header.is_encrypted() {
            let password = password.ok_or(Error::PasswordRequired)?;
            archive.install_read_state(password)?;
            archive.validate_password()?;
        }

        Ok(archive)
    }

    /// Parses an archive from an in-memory buffer without binding it to a
    /// file path. Encrypted archives parse fine; a password is only needed
    /// once content is read.
    pub fn parse(buffer: &[u8]) -> Result<Self> {
        let header = GlobalHeader::decode(buffer)?;
        let mut offset = GLOBAL_HEADER_SIZE;

        let metadata = if header.has_metadata() {
            let (meta, consumed) = ArchiveMetadata::decode(buffer, offset)?;
            offset += consumed;
            Some(meta)
        } else {
            None
        };

        let mut entries = Vec::with_capacity(header.file_count as usize);
        for index in 0..header.file_count {
            let (entry, consumed) = Self::parse_entry(buffer, offset, index)?;
            offset += consumed;
            entries.push(entry);
        }

        Ok(Self {
            filepath: None,
            header,
            metadata,
            entries,
            loaded: true,
            modified: false,
            provider: CryptoProvider::new(),
            crypto_state: None,
        })
    }

    fn parse_entry(buffer: &[u8], offset: usize, index: u32) -> Result<(Entry, usize)> {
        let mut pos = offset;

        if buffer.len() < pos + ENTRY_HEADER_SIZE {
            return Err(Error::truncated(format!(
                "archive ends inside header of entry {}",
                index
            )));
        }
        let header = EntryHeader::decode(&buffer[pos..])?;
        pos += ENTRY_HEADER_SIZE;

        let path_len = header.path_length as usize;
        if buffer.len() < pos + path_len {
            return Err(Error::truncated(format!(
                "archive ends inside path of entry {}",
                index
            )));
        }
        let path = std::str::from_utf8(&buffer[pos..pos + path_len])
            .map_err(|_| Error::malformed(format!("entry {} path is not valid UTF-8", index)))?
            .to_string();
        pos += path_len;

        // stored_size is attacker-controlled; guard the addition.
        let stored = usize::try_from(header.stored_size).unwrap_or(usize::MAX);
        let data_end = pos.checked_add(stored).unwrap_or(usize::MAX);
        if buffer.len() < data_end {
            return Err(Error::truncated(format!(
                "archive ends inside data of entry {} ({})",
                index, path
            )));
        }
        let data = buffer[pos..data_end].to_vec();
        pos = data_end;

        if buffer.len() < pos + CHECKSUM_SIZE {
            return Err(Error::truncated(format!(
                "archive ends inside checksum of entry {} ({})",
                index, path
            )));
        }
        let mut checksum = [0u8; CHECKSUM_SIZE];
        checksum.copy_from_slice(&buffer[pos..pos + CHECKSUM_SIZE]);
        pos += CHECKSUM_SIZE;

        let kind = if header.flags & crate::format::entry_flags::DIRECTORY != 0 {
            EntryKind::Directory
        } else if header.flags & crate::format::entry_flags::SYMLINK != 0 {
            EntryKind::Symlink
        } else {
            EntryKind::File
        };

        let mut entry = Entry::metadata_only(
            path,
            kind,
            header.original_size,
            FileKind::from_u32(header.file_type),
        );
        entry.flags = header.flags;
        entry.checksum = checksum;
        entry.set_stored_data(data);

        Ok((entry, pos - offset))
    }

    // ----------------------------------------------------------------
    // Lifecycle
    // ----------------------------------------------------------------

    /// Returns true while the archive is open.
    pub fn is_open(&self) -> bool {
        self.loaded
    }

    /// Returns true when mutations have occurred since the last save.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// The file path this archive is bound to.
    pub fn filepath(&self) -> Option<&Path> {
        self.filepath.as_deref()
    }

    /// Serializes and writes the archive to its bound path.
    pub fn save(&mut self) -> Result<()> {
        let path = self
            .filepath
            .clone()
            .ok_or_else(|| Error::InvalidArgument("no output path specified".into()))?;
        self.save_as(path)
    }

    /// Serializes and writes the archive to `path`, rebinding it there.
    pub fn save_as(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let buffer = self.encode();
        fsio::write_all(&path, &buffer)?;

        self.filepath = Some(path);
        self.modified = false;
        Ok(())
    }

    /// Serializes the archive to bytes, exactly as `save` would write them.
    pub fn encode(&mut self) -> Vec<u8> {
        self.update_header();

        let mut buffer = Vec::with_capacity(
            GLOBAL_HEADER_SIZE
                + self
                    .entries
                    .iter()
                    .map(|e| e.total_serialized_size() as usize)
                    .sum::<usize>(),
        );
        buffer.extend_from_slice(&self.header.encode());

        if self.header.has_metadata() {
            if let Some(meta) = &self.metadata {
                buffer.extend_from_slice(&meta.encode());
            }
        }

        for entry in &self.entries {
            buffer.extend_from_slice(&entry.header().encode());
            buffer.extend_from_slice(entry.path.as_bytes());
            buffer.extend_from_slice(&entry.data);
            buffer.extend_from_slice(&entry.checksum);
        }

        buffer
    }

    /// Closes the archive, saving first when modified, and wipes all entry
    /// data and cached key material.
    pub fn close(&mut self) -> Result<()> {
        if self.modified && self.filepath.is_some() {
            self.save()?;
        }
        self.discard();
        Ok(())
    }

    /// Closes the archive without saving, discarding any in-memory
    /// mutations. Entry data and key material are wiped.
    pub fn discard(&mut self) {
        for entry in &mut self.entries {
            entry.clear_data();
        }
        self.entries.clear();
        self.crypto_state = None;
        self.header = GlobalHeader::new();
        self.metadata = None;
        self.filepath = None;
        self.loaded = false;
        self.modified = false;
    }

    fn update_header(&mut self) {
        self.header.file_count = self.entries.len() as u32;

        if self.entries.is_empty() {
            self.header.flags &= !(archive_flags::ENCRYPTED | archive_flags::COMPRESSED);
            self.header.salt = [0; SALT_SIZE];
            self.header.iv = [0; IV_SIZE];
            self.crypto_state = None;
        } else if self.entries.iter().any(|e| e.is_compressed()) {
            self.header.flags |= archive_flags::COMPRESSED;
        } else {
            self.header.flags &= !archive_flags::COMPRESSED;
        }
    }

    // ----------------------------------------------------------------
    // Adding entries
    // ----------------------------------------------------------------

    /// Adds a file from disk under its normalized path.
    ///
    /// Relative paths are stored as given (with `/` separators); absolute
    /// paths and paths containing `..` are reduced to their file name so
    /// the resulting archive stays extractable.
    pub fn add_file(&mut self, path: impl AsRef<Path>, options: &CreateOptions) -> Result<()> {
        let disk_path = path.as_ref();
        let archive_path = archive_path_for(disk_path);
        self.add_file_as(disk_path, archive_path, options)
    }

    /// Adds a file from disk under an explicit archive path.
    pub fn add_file_as(
        &mut self,
        disk_path: impl AsRef<Path>,
        archive_path: impl Into<String>,
        options: &CreateOptions,
    ) -> Result<()> {
        let disk_path = disk_path.as_ref();
        let data = fsio::read_all(disk_path)?;
        let (created, modified) = fsio::file_times(disk_path);

        let mut entry = Entry::from_bytes(archive_path.into(), data, EntryKind::File);
        entry.creation_time = created;
        entry.modification_time = modified;
        self.add_entry(entry, options)
    }

    /// Adds multiple files and/or directories, reporting no progress.
    pub fn add_files(&mut self, paths: &[PathBuf], options: &CreateOptions) -> BatchResult {
        self.add_files_with_progress(paths, options, &mut NoProgress)
    }

    /// Adds multiple files and/or directories. Directories are expanded
    /// recursively; hidden files are skipped unless
    /// [`CreateOptions::include_hidden`] is set.
    ///
    /// Failures do not abort the batch. The progress callback fires once
    /// per processed input.
    pub fn add_files_with_progress(
        &mut self,
        paths: &[PathBuf],
        options: &CreateOptions,
        progress: &mut dyn ProgressReporter,
    ) -> BatchResult {
        let mut inputs: Vec<(PathBuf, String, u64)> = Vec::new();
        let mut result = BatchResult {
            ok: true,
            ..Default::default()
        };

        for path in paths {
            if path.is_dir() {
                match self.collect_dir(path, options) {
                    Ok(mut found) => inputs.append(&mut found),
                    Err(e) => {
                        result.failures.push((path.display().to_string(), e));
                        result.ok = false;
                    }
                }
            } else {
                let size = fsio::file_size(path);
                inputs.push((path.clone(), archive_path_for(path), size));
            }
        }

        let total_entries = inputs.len() as u64;
        let total_bytes: u64 = inputs.iter().map(|(_, _, size)| size).sum();
        progress.on_start(total_entries, total_bytes);

        let mut bytes_done = 0u64;
        for (index, (disk_path, archive_path, size)) in inputs.iter().enumerate() {
            match self.add_file_as(disk_path, archive_path.clone(), options) {
                Ok(()) => {
                    result.entries_processed += 1;
                    result.bytes_processed += size;
                }
                Err(e) => {
                    result.failures.push((archive_path.clone(), e));
                    result.ok = false;
                }
            }
            bytes_done += size;
            progress.on_entry(
                index as u64 + 1,
                total_entries,
                bytes_done,
                total_bytes,
                archive_path,
            );
        }

        progress.on_finish();
        result
    }

    /// Recursively adds the regular files under a directory.
    pub fn add_directory(&mut self, root: impl AsRef<Path>, options: &CreateOptions) -> BatchResult {
        self.add_files(&[root.as_ref().to_path_buf()], options)
    }

    fn collect_dir(
        &self,
        root: &Path,
        options: &CreateOptions,
    ) -> Result<Vec<(PathBuf, String, u64)>> {
        let prefix = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let mut found = Vec::new();
        for file in fsio::iter_dir_recursive(root)? {
            if file.hidden && !options.include_hidden {
                continue;
            }
            if options
                .exclude_patterns
                .iter()
                .any(|p| glob::matches(&file.relative_path, p))
            {
                continue;
            }
            let archive_path = if prefix.is_empty() {
                file.relative_path
            } else {
                format!("{}/{}", prefix, file.relative_path)
            };
            found.push((file.disk_path, archive_path, file.size));
        }
        Ok(found)
    }

    /// Adds in-memory bytes as a file entry.
    pub fn add_virtual(
        &mut self,
        path: impl Into<String>,
        data: Vec<u8>,
        options: &CreateOptions,
    ) -> Result<()> {
        let entry = Entry::from_bytes(path.into(), data, EntryKind::File);
        self.add_entry(entry, options)
    }

    /// Runs an entry holding original content through the pipeline and
    /// appends it.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for an empty path, a path longer than
    ///   65535 bytes, or an invalid compression level,
    /// - [`Error::EntryExists`] when the path is already present.
    pub fn add_entry(&mut self, mut entry: Entry, options: &CreateOptions) -> Result<()> {
        if entry.path.is_empty() {
            return Err(Error::InvalidArgument("entry path must not be empty".into()));
        }
        if entry.path.len() > MAX_PATH_LENGTH {
            return Err(Error::InvalidArgument(format!(
                "entry path exceeds {} bytes",
                MAX_PATH_LENGTH
            )));
        }
        if self.entry_exists(&entry.path) {
            return Err(Error::EntryExists {
                path: entry.path.clone(),
            });
        }
        codec::validate_level(options.compression_level)?;

        if options.encrypt && !entry.is_directory() {
            self.ensure_write_state(options)?;
        }

        let state = if options.encrypt {
            self.crypto_state.as_ref()
        } else {
            None
        };
        pipeline::apply(
            &mut entry,
            options.compress,
            options.compression_level,
            state,
            &self.provider,
        )?;

        self.entries.push(entry);
        self.modified = true;
        Ok(())
    }

    /// Establishes the archive's crypto state on the first encrypting add:
    /// fresh salt and IV go into the header, the derived key is cached.
    fn ensure_write_state(&mut self, options: &CreateOptions) -> Result<()> {
        if self.crypto_state.is_some() {
            return Ok(());
        }

        let password = options
            .password
            .as_ref()
            .ok_or_else(|| Error::InvalidArgument("encryption requires a password".into()))?;

        let salt = self.provider.generate_salt()?;
        let iv = self.provider.generate_iv()?;
        let key = self.provider.derive_key(password, &salt)?;

        self.header.salt = salt;
        self.header.iv = iv;
        self.header.flags |= archive_flags::ENCRYPTED;
        self.crypto_state = Some(CryptoState { key, iv });
        Ok(())
    }

    /// Derives and caches the read key from the header's salt.
    fn install_read_state(&mut self, password: &Password) -> Result<()> {
        if self.crypto_state.is_some() {
            return Ok(());
        }
        let key = self.provider.derive_key(password, &self.header.salt)?;
        self.crypto_state = Some(CryptoState {
            key,
            iv: self.header.iv,
        });
        Ok(())
    }

    fn ensure_read_state(&mut self, password: Option<&Password>) -> Result<()> {
        if !self.header.is_encrypted() || self.crypto_state.is_some() {
            return Ok(());
        }
        let password = password.ok_or(Error::PasswordRequired)?;
        self.install_read_state(password)
    }

    /// Checks the cached key against the first encrypted entry. Any layer
    /// failure is reported as [`Error::DecryptFailure`]; wrong password and
    /// corrupted ciphertext are indistinguishable by design.
    fn validate_password(&self) -> Result<()> {
        let probe = self
            .entries
            .iter()
            .find(|e| e.is_encrypted() && !e.is_directory());
        if let Some(entry) = probe {
            pipeline::verify_entry(entry, self.crypto_state.as_ref(), &self.provider)
                .map_err(|_| Error::DecryptFailure)?;
        }
        Ok(())
    }

    // ----------------------------------------------------------------
    // Removing entries
    // ----------------------------------------------------------------

    /// Removes the entry with the given path.
    pub fn remove_entry(&mut self, path: &str) -> Result<()> {
        let index = self
            .entries
            .iter()
            .position(|e| e.path == path)
            .ok_or_else(|| Error::not_found(path))?;

        let mut entry = self.entries.remove(index);
        entry.clear_data();
        self.modified = true;
        Ok(())
    }

    /// Removes all entries matching a glob pattern (`*`, `?`), returning
    /// the number removed.
    pub fn remove_entries(&mut self, pattern: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain_mut(|entry| {
            if glob::matches(&entry.path, pattern) {
                entry.clear_data();
                false
            } else {
                true
            }
        });

        let count = before - self.entries.len();
        if count > 0 {
            self.modified = true;
        }
        count
    }

    /// Removes every entry.
    pub fn clear_entries(&mut self) {
        for entry in &mut self.entries {
            entry.clear_data();
        }
        self.entries.clear();
        self.modified = true;
    }

    // ----------------------------------------------------------------
    // Queries
    // ----------------------------------------------------------------

    /// Number of entries in the archive.
    pub fn entry_count(&self) -> u64 {
        self.entries.len() as u64
    }

    /// All entries in archive order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// The archive's global header.
    pub fn header(&self) -> &GlobalHeader {
        &self.header
    }

    /// The archive's metadata block, if present.
    pub fn metadata(&self) -> Option<&ArchiveMetadata> {
        self.metadata.as_ref()
    }

    /// Installs a metadata block and sets the HAS_METADATA flag.
    pub fn set_metadata(&mut self, metadata: ArchiveMetadata) {
        self.metadata = Some(metadata);
        self.header.flags |= archive_flags::HAS_METADATA;
        self.modified = true;
    }

    /// Returns the first entry whose path matches byte-for-byte.
    pub fn find_entry(&self, path: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.path == path)
    }

    /// Returns all entries matching a glob pattern (`*`, `?`).
    pub fn find_entries(&self, pattern: &str) -> Vec<&Entry> {
        self.entries
            .iter()
            .filter(|e| glob::matches(&e.path, pattern))
            .collect()
    }

    /// Returns true if an entry with this path exists.
    pub fn entry_exists(&self, path: &str) -> bool {
        self.find_entry(path).is_some()
    }

    /// Sum of all entries' original sizes.
    pub fn total_original_size(&self) -> u64 {
        self.entries.iter().map(|e| e.original_size).sum()
    }

    /// Sum of all entries' stored sizes.
    pub fn total_stored_size(&self) -> u64 {
        self.entries.iter().map(|e| e.stored_size).sum()
    }

    /// Aggregate size statistics.
    pub fn statistics(&self) -> ArchiveStats {
        let original = self.total_original_size();
        let stored = self.total_stored_size();
        ArchiveStats {
            entries: self.entry_count(),
            total_original_size: original,
            total_stored_size: stored,
            ratio: if original == 0 {
                0.0
            } else {
                stored as f64 * 100.0 / original as f64
            },
        }
    }

    // ----------------------------------------------------------------
    // Reading and extraction
    // ----------------------------------------------------------------

    /// Restores an entry's original content into memory.
    pub fn read_entry(&mut self, path: &str, password: Option<&Password>) -> Result<Vec<u8>> {
        self.ensure_read_state(password)?;
        let entry = self
            .find_entry(path)
            .ok_or_else(|| Error::not_found(path))?;
        pipeline::restore(entry, self.crypto_state.as_ref(), &self.provider)
    }

    /// Extracts a single entry to an explicit output path, creating parent
    /// directories as needed.
    pub fn extract_file(
        &mut self,
        path: &str,
        out_path: impl AsRef<Path>,
        password: Option<&Password>,
    ) -> Result<()> {
        let data = self.read_entry(path, password)?;
        fsio::write_all(out_path, &data)
    }

    /// Extracts all matching entries under `out_dir`, without progress.
    pub fn extract_all(
        &mut self,
        out_dir: impl AsRef<Path>,
        password: Option<&Password>,
        options: &ExtractOptions,
    ) -> Result<ExtractResult> {
        self.extract_all_with_progress(out_dir, password, options, &mut NoProgress)
    }

    /// Extracts all matching entries under `out_dir`.
    ///
    /// Directory entries become directories; file entries are validated
    /// against path traversal, filtered by the substring whitelist, and
    /// written with parent directories created. Extraction continues past
    /// failed entries and aggregates the failures.
    pub fn extract_all_with_progress(
        &mut self,
        out_dir: impl AsRef<Path>,
        password: Option<&Password>,
        options: &ExtractOptions,
        progress: &mut dyn ProgressReporter,
    ) -> Result<ExtractResult> {
        let out_dir = out_dir.as_ref();
        self.ensure_read_state(password)?;
        fsio::mkdir_p(out_dir)?;

        let total_entries = self.entries.len() as u64;
        let total_bytes: u64 = self
            .entries
            .iter()
            .filter(|e| !e.is_directory() && options.matches(&e.path))
            .map(|e| e.original_size)
            .sum();
        progress.on_start(total_entries, total_bytes);

        let mut result = ExtractResult {
            ok: true,
            ..Default::default()
        };

        for index in 0..self.entries.len() {
            let path = self.entries[index].path.clone();

            let outcome = self.extract_one(index, out_dir, options);
            match outcome {
                ExtractOutcome::Written(bytes) => {
                    result.entries_extracted += 1;
                    result.bytes_written += bytes;
                }
                ExtractOutcome::Skipped => result.entries_skipped += 1,
                ExtractOutcome::Directory => {}
                ExtractOutcome::Failed(e) => {
                    result.failures.push((path.clone(), e));
                    result.ok = false;
                }
            }

            progress.on_entry(
                index as u64 + 1,
                total_entries,
                result.bytes_written,
                total_bytes,
                &path,
            );
        }

        progress.on_finish();
        Ok(result)
    }

    fn extract_one(&self, index: usize, out_dir: &Path, options: &ExtractOptions) -> ExtractOutcome {
        let entry = &self.entries[index];

        if entry.is_directory() {
            return match safety::validate_extract_path(&entry.path, out_dir)
                .and_then(|dir| fsio::mkdir_p(dir))
            {
                Ok(()) => ExtractOutcome::Directory,
                Err(e) => ExtractOutcome::Failed(e),
            };
        }

        if !options.matches(&entry.path) {
            return ExtractOutcome::Skipped;
        }

        let out_path = match safety::validate_extract_path(&entry.path, out_dir) {
            Ok(p) => p,
            Err(e) => return ExtractOutcome::Failed(e),
        };

        if out_path.exists() && !options.overwrite {
            return ExtractOutcome::Skipped;
        }

        let data = match pipeline::restore(entry, self.crypto_state.as_ref(), &self.provider) {
            Ok(d) => d,
            Err(e) => return ExtractOutcome::Failed(e),
        };

        match fsio::write_all(&out_path, &data) {
            Ok(()) => ExtractOutcome::Written(data.len() as u64),
            Err(e) => ExtractOutcome::Failed(e),
        }
    }

    // ----------------------------------------------------------------
    // Verification
    // ----------------------------------------------------------------

    /// Verifies every entry's integrity without extracting.
    ///
    /// Returns `Ok(())` only when all entries restore cleanly and their
    /// checksums match. Verification does not mutate any entry; calling it
    /// twice yields the same result.
    pub fn verify(&mut self, password: Option<&Password>) -> Result<()> {
        self.verify_with_progress(password, &mut NoProgress)
    }

    /// Verifies every entry, reporting progress per entry. Stops at the
    /// first failure.
    pub fn verify_with_progress(
        &mut self,
        password: Option<&Password>,
        progress: &mut dyn ProgressReporter,
    ) -> Result<()> {
        self.ensure_read_state(password)?;

        let total_entries = self.entries.len() as u64;
        let total_bytes = self.total_original_size();
        progress.on_start(total_entries, total_bytes);

        let mut bytes_done = 0u64;
        for (index, entry) in self.entries.iter().enumerate() {
            pipeline::verify_entry(entry, self.crypto_state.as_ref(), &self.provider)?;
            bytes_done += entry.original_size;
            progress.on_entry(
                index as u64 + 1,
                total_entries,
                bytes_done,
                total_bytes,
                &entry.path,
            );
        }

        progress.on_finish();
        Ok(())
    }

    /// Verifies a single entry by path.
    pub fn verify_entry(&mut self, path: &str, password: Option<&Password>) -> Result<()> {
        self.ensure_read_state(password)?;
        let entry = self
            .find_entry(path)
            .ok_or_else(|| Error::not_found(path))?;
        pipeline::verify_entry(entry, self.crypto_state.as_ref(), &self.provider)
    }

    // ----------------------------------------------------------------
    // Locking and re-keying
    // ----------------------------------------------------------------

    /// Encrypts every entry under a key derived from `password`.
    ///
    /// Entry bytes are transformed immediately: each entry is restored to
    /// plaintext, then re-run through the pipeline with encryption under a
    /// fresh salt and IV. Compressed entries are recompressed at the level
    /// suggested by their file type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when the archive is already
    /// encrypted or the password is empty.
    pub fn lock(&mut self, password: &Password) -> Result<()> {
        if self.header.is_encrypted() {
            return Err(Error::InvalidArgument(
                "archive is already encrypted".into(),
            ));
        }

        let salt = self.provider.generate_salt()?;
        let iv = self.provider.generate_iv()?;
        let key = self.provider.derive_key(password, &salt)?;
        let state = CryptoState { key, iv };

        let provider = &self.provider;
        for entry in &mut self.entries {
            if entry.is_directory() {
                continue;
            }
            let original = pipeline::restore(entry, None, provider)?;
            let recompress = entry.is_compressed();
            let level = codec::optimal_level(entry.file_type);

            entry.flags &= !(crate::format::entry_flags::COMPRESSED
                | crate::format::entry_flags::ENCRYPTED);
            entry.set_stored_data(original);
            pipeline::apply(entry, recompress, level, Some(&state), provider)?;
        }

        self.header.salt = salt;
        self.header.iv = iv;
        self.header.flags |= archive_flags::ENCRYPTED;
        self.crypto_state = Some(state);
        self.modified = true;
        Ok(())
    }

    /// Decrypts every entry and clears the archive's encryption state.
    ///
    /// The password is proven correct by actually decrypting; a wrong one
    /// surfaces as [`Error::DecryptFailure`] and leaves nothing half-done
    /// on disk (the in-memory state must then be discarded).
    pub fn unlock(&mut self, password: &Password) -> Result<()> {
        if !self.header.is_encrypted() {
            return Err(Error::InvalidArgument("archive is not encrypted".into()));
        }

        self.ensure_read_state(Some(password))?;
        let state = self.crypto_state.take();

        let provider = &self.provider;
        for entry in &mut self.entries {
            if entry.is_directory() || !entry.is_encrypted() {
                continue;
            }
            let original = pipeline::restore(entry, state.as_ref(), provider)?;
            if !crypto::verify_checksum(&original, &entry.checksum) {
                return Err(Error::DecryptFailure);
            }
            let recompress = entry.is_compressed();
            let level = codec::optimal_level(entry.file_type);

            entry.flags &= !(crate::format::entry_flags::COMPRESSED
                | crate::format::entry_flags::ENCRYPTED);
            entry.set_stored_data(original);
            pipeline::apply(entry, recompress, level, None, provider)?;
        }

        self.header.flags &= !archive_flags::ENCRYPTED;
        self.header.salt = [0; SALT_SIZE];
        self.header.iv = [0; IV_SIZE];
        self.crypto_state = None;
        self.modified = true;
        Ok(())
    }

    /// Re-keys the archive: verifies `old`, then re-encrypts every
    /// encrypted entry under a fresh salt, IV, and key derived from `new`.
    pub fn change_password(&mut self, old: &Password, new: &Password) -> Result<()> {
        if !self.header.is_encrypted() {
            return Err(Error::InvalidArgument("archive is not encrypted".into()));
        }

        let old_key = self.provider.derive_key(old, &self.header.salt)?;
        let old_state = CryptoState {
            key: old_key,
            iv: self.header.iv,
        };

        let new_salt = self.provider.generate_salt()?;
        let new_iv = self.provider.generate_iv()?;
        let new_key = self.provider.derive_key(new, &new_salt)?;
        let new_state = CryptoState {
            key: new_key,
            iv: new_iv,
        };

        let provider = &self.provider;
        for entry in &mut self.entries {
            if entry.is_directory() || !entry.is_encrypted() {
                continue;
            }
            let original = pipeline::restore(entry, Some(&old_state), provider)?;
            if !crypto::verify_checksum(&original, &entry.checksum) {
                return Err(Error::DecryptFailure);
            }
            let recompress = entry.is_compressed();
            let level = codec::optimal_level(entry.file_type);

            entry.flags &= !crate::format::entry_flags::COMPRESSED;
            entry.flags &= !crate::format::entry_flags::ENCRYPTED;
            entry.set_stored_data(original);
            pipeline::apply(entry, recompress, level, Some(&new_state), provider)?;
        }

        self.header.salt = new_salt;
        self.header.iv = new_iv;
        self.crypto_state = Some(new_state);
        self.modified = true;
        Ok(())
    }
}

enum ExtractOutcome {
    Written(u64),
    Skipped,
    Directory,
    Failed(Error),
}

/// Derives a safe archive path from a disk path: relative paths without
/// `..` are kept (normalized to `/`); anything else falls back to the file
/// name.
fn archive_path_for(path: &Path) -> String {
    use std::path::Component;

    let safe = path
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if safe {
        let joined = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(name) => name.to_str(),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/");
        if !joined.is_empty() {
            return joined;
        }
    }

    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
