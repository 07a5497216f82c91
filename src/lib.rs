//! # varc
//!
//! A library and command-line tool for the VARC secure archive format.
//!
//! VARC packages an ordered collection of named byte streams into a single
//! self-describing container with optional per-entry DEFLATE compression,
//! optional archive-wide AES-256-CBC encryption derived from a passphrase
//! (PBKDF2-HMAC-SHA256), and a mandatory SHA-256 integrity checksum over
//! every entry's original bytes.
//!
//! ## Quick Start
//!
//! ### Creating an Archive
//!
//! ```rust,no_run
//! use varc::{Archive, CreateOptions, Result};
//!
//! fn main() -> Result<()> {
//!     let mut archive = Archive::create("backup.varc");
//!
//!     // Add files from disk
//!     archive.add_file("notes.txt", &CreateOptions::new())?;
//!
//!     // Add data from memory
//!     archive.add_virtual("hello.txt", b"Hello, World!".to_vec(), &CreateOptions::new())?;
//!
//!     archive.save()?;
//!     Ok(())
//! }
//! ```
//!
//! ### Extracting an Archive
//!
//! ```rust,no_run
//! use varc::{Archive, ExtractOptions, Result};
//!
//! fn main() -> Result<()> {
//!     let mut archive = Archive::open("backup.varc", None)?;
//!
//!     for entry in archive.entries() {
//!         println!("{}: {} bytes", entry.path, entry.original_size);
//!     }
//!
//!     let result = archive.extract_all("./output", None, &ExtractOptions::new())?;
//!     println!("extracted {} entries", result.entries_extracted);
//!     Ok(())
//! }
//! ```
//!
//! ### Encrypted Archives
//!
//! ```rust,no_run
//! use varc::{Archive, CreateOptions, Password, Result};
//!
//! fn main() -> Result<()> {
//!     let mut archive = Archive::create("secret.varc");
//!     archive.add_virtual(
//!         "plan.txt",
//!         b"the plan".to_vec(),
//!         &CreateOptions::new().encrypt("passphrase"),
//!     )?;
//!     archive.save()?;
//!
//!     let password = Password::new("passphrase");
//!     let mut archive = Archive::open("secret.varc", Some(&password))?;
//!     archive.verify(Some(&password))?;
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`. Decryption failures from a wrong
//! password are deliberately indistinguishable from corrupted data.
//!
//! ## Safety
//!
//! Extraction validates every entry path: absolute paths and `..`
//! components are rejected, so a malicious archive cannot write outside the
//! destination directory. Derived keys, passphrases, and entry buffers are
//! wiped when dropped or cleared.
//!
//! ## Concurrency
//!
//! The core is single-threaded and synchronous. An [`Archive`] must be used
//! from one thread at a time; long-running batch operations may run on a
//! caller-owned worker thread, where progress callbacks fire synchronously.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod archive;
pub mod codec;
pub mod crypto;
pub mod entry;
pub mod error;
pub mod format;
pub mod fsio;
pub mod glob;
pub mod progress;
pub mod safety;

pub use archive::{
    Archive, ArchiveStats, BatchResult, CreateOptions, ExtractOptions, ExtractResult, ListOptions,
};
pub use crypto::Password;
pub use entry::{Entry, EntryKind};
pub use error::{Error, Result};
pub use format::{ArchiveMetadata, EntryHeader, FileKind, GlobalHeader};
pub use progress::{progress_fn, NoProgress, ProgressReporter};
pub use safety::validate_extract_path;
