//! Filesystem collaborator used by the archive controller.
//!
//! The core touches the filesystem only through these helpers: whole-file
//! reads and writes, recursive directory creation, and recursive directory
//! enumeration for `add_directory`. It never opens the network.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::Result;

/// A regular file discovered by [`iter_dir_recursive`].
#[derive(Debug, Clone)]
pub struct DirFile {
    /// Absolute (or caller-relative) path on disk.
    pub disk_path: PathBuf,
    /// Path relative to the walked root, with `/` separators.
    pub relative_path: String,
    /// File size in bytes.
    pub size: u64,
    /// True if any path component starts with a dot.
    pub hidden: bool,
}

/// Reads an entire file into memory.
pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    Ok(fs::read(path)?)
}

/// Writes a buffer to a file, creating parent directories as needed.
pub fn write_all(path: impl AsRef<Path>, data: &[u8]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, data)?;
    Ok(())
}

/// Creates a directory and all missing parents.
pub fn mkdir_p(path: impl AsRef<Path>) -> Result<()> {
    fs::create_dir_all(path)?;
    Ok(())
}

/// Returns a file's size in bytes, or 0 when it cannot be read.
pub fn file_size(path: impl AsRef<Path>) -> u64 {
    fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Returns a file's (creation, modification) times as Unix seconds.
///
/// Either value falls back to 0 when the platform or filesystem does not
/// expose it.
pub fn file_times(path: impl AsRef<Path>) -> (u64, u64) {
    let Ok(meta) = fs::metadata(path) else {
        return (0, 0);
    };
    let to_secs = |t: std::io::Result<std::time::SystemTime>| {
        t.ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0)
    };
    (to_secs(meta.created()), to_secs(meta.modified()))
}

/// Recursively enumerates regular files under `root`.
///
/// Symbolic links are not followed. Walk errors on individual entries are
/// logged and skipped so one unreadable subtree does not abort the whole
/// enumeration.
pub fn iter_dir_recursive(root: impl AsRef<Path>) -> Result<Vec<DirFile>> {
    let root = root.as_ref();
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                log::warn!("skipping unreadable directory entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .components()
            .filter_map(|c| c.as_os_str().to_str())
            .collect::<Vec<_>>()
            .join("/");
        if relative.is_empty() {
            continue;
        }

        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        let hidden = relative.split('/').any(|seg| seg.starts_with('.'));

        files.push(DirFile {
            disk_path: entry.path().to_path_buf(),
            relative_path: relative,
            size,
            hidden,
        });
    }

    Ok(files)
}
