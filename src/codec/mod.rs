//! Compression provider: gzip-framed DEFLATE with selectable level.
//!
//! One-shot [`compress`]/[`decompress`] operate on in-memory buffers, which
//! is how the archive pipeline uses them. The streaming variants in
//! [`deflate`] process data through `Read`/`Write` in 64 KiB chunks with
//! bounded memory, for callers that cannot hold both sides at once.

pub mod deflate;

pub use deflate::{compress_stream, decompress_stream, DeflateDecoder, DeflateEncoder};

use crate::error::{Error, Result};
use crate::format::FileKind;

/// Minimum DEFLATE level (store only).
pub const LEVEL_NONE: u32 = 0;
/// Fastest compressing level.
pub const LEVEL_FASTEST: u32 = 1;
/// Default compression level.
pub const LEVEL_DEFAULT: u32 = 6;
/// Best compression level.
pub const LEVEL_BEST: u32 = 9;

/// Outcome of a successful one-shot compression.
#[derive(Debug, Clone)]
pub struct CompressionResult {
    /// The compressed bytes.
    pub data: Vec<u8>,
    /// Input size in bytes.
    pub original_size: u64,
    /// Output size in bytes.
    pub compressed_size: u64,
    /// `compressed / original * 100`; 0 for empty input.
    pub ratio: f64,
}

/// Outcome of a successful one-shot decompression.
#[derive(Debug, Clone)]
pub struct DecompressionResult {
    /// The decompressed bytes.
    pub data: Vec<u8>,
    /// The expected output size passed by the caller (0 = unknown).
    pub original_size: u64,
    /// Actual decompressed size in bytes.
    pub decompressed_size: u64,
}

/// Validates a compression level.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] for levels above 9.
pub fn validate_level(level: u32) -> Result<()> {
    if level > LEVEL_BEST {
        return Err(Error::InvalidArgument(format!(
            "invalid compression level {}: must be 0-9",
            level
        )));
    }
    Ok(())
}

/// Compresses `data` with gzip-framed DEFLATE at the given level (0-9).
pub fn compress(data: &[u8], level: u32) -> Result<CompressionResult> {
    validate_level(level)?;

    let compressed = deflate::compress_once(data, level)
        .map_err(|e| Error::CompressionFailure(e.to_string()))?;

    let original_size = data.len() as u64;
    let compressed_size = compressed.len() as u64;
    let ratio = if original_size == 0 {
        0.0
    } else {
        compressed_size as f64 * 100.0 / original_size as f64
    };

    Ok(CompressionResult {
        data: compressed,
        original_size,
        compressed_size,
        ratio,
    })
}

/// Decompresses a gzip-framed DEFLATE stream.
///
/// When `expected_size` is non-zero the output length is checked against it.
///
/// # Errors
///
/// Returns [`Error::DecompressionFailure`] when the stream is invalid or the
/// output size does not match `expected_size`.
pub fn decompress(data: &[u8], expected_size: u64) -> Result<DecompressionResult> {
    let decompressed = deflate::decompress_once(data)
        .map_err(|e| Error::DecompressionFailure(e.to_string()))?;

    let decompressed_size = decompressed.len() as u64;
    if expected_size > 0 && decompressed_size != expected_size {
        return Err(Error::DecompressionFailure(format!(
            "size mismatch: expected {} bytes, got {}",
            expected_size, decompressed_size
        )));
    }

    Ok(DecompressionResult {
        data: decompressed,
        original_size: expected_size,
        decompressed_size,
    })
}

/// Heuristic check for already-compressed data (gzip or zlib framing).
///
/// Diagnostics only: the pipeline trusts entry flags, never sniffing.
pub fn is_compressed(data: &[u8]) -> bool {
    if data.len() < 2 {
        return false;
    }
    // gzip magic
    if data[0] == 0x1F && data[1] == 0x8B {
        return true;
    }
    // zlib CMF/FLG pairs for deflate
    data[0] == 0x78 && matches!(data[1], 0x01 | 0x9C | 0xDA)
}

/// Returns the recommended compression level for a file kind.
///
/// Text and documents compress well; audio and video are usually already
/// compressed and only get the fastest pass.
pub fn optimal_level(kind: FileKind) -> u32 {
    match kind {
        FileKind::Text | FileKind::Document => LEVEL_BEST,
        FileKind::Audio | FileKind::Video => LEVEL_FASTEST,
        _ => LEVEL_DEFAULT,
    }
}
