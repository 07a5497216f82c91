//! Deflate codec implementation (gzip framing).

use std::io::{self, Read, Write};

use flate2::bufread::GzDecoder as FlateDecoder;
use flate2::write::GzEncoder as FlateEncoder;
use flate2::Compression;

/// Streaming chunk size for the `Read`/`Write` variants.
const CHUNK_SIZE: usize = 64 * 1024;

/// One-shot compression of an in-memory buffer.
pub(crate) fn compress_once(data: &[u8], level: u32) -> io::Result<Vec<u8>> {
    let mut encoder = FlateEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(data)?;
    encoder.finish()
}

/// One-shot decompression of an in-memory buffer.
pub(crate) fn decompress_once(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoder = FlateDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Compresses from a reader into a writer in 64 KiB chunks with bounded
/// memory.
///
/// Returns `(bytes_read, bytes_written)`.
pub fn compress_stream<R: Read, W: Write>(
    mut input: R,
    output: W,
    level: u32,
) -> io::Result<(u64, u64)> {
    let mut encoder = FlateEncoder::new(CountingWriter::new(output), Compression::new(level.min(9)));

    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut bytes_read = 0u64;
    loop {
        let n = input.read(&mut buf)?;
        if n == 0 {
            break;
        }
        encoder.write_all(&buf[..n])?;
        bytes_read += n as u64;
    }

    let counter = encoder.finish()?;
    Ok((bytes_read, counter.bytes_written()))
}

/// Decompresses from a reader into a writer in 64 KiB chunks with bounded
/// memory.
///
/// Returns `(bytes_read, bytes_written)`.
pub fn decompress_stream<R: Read, W: Write>(input: R, mut output: W) -> io::Result<(u64, u64)> {
    let counting = CountingReader::new(input);
    let reader = io::BufReader::with_capacity(CHUNK_SIZE, counting);
    let mut decoder = FlateDecoder::new(reader);

    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut written = 0u64;
    loop {
        let n = decoder.read(&mut buf)?;
        if n == 0 {
            break;
        }
        output.write_all(&buf[..n])?;
        written += n as u64;
    }
    output.flush()?;

    let bytes_read = decoder.into_inner().into_inner().bytes_read();
    Ok((bytes_read, written))
}

/// Streaming Deflate encoder over any writer.
pub struct DeflateEncoder<W: Write> {
    inner: FlateEncoder<W>,
}

impl<W: Write> std::fmt::Debug for DeflateEncoder<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeflateEncoder").finish_non_exhaustive()
    }
}

impl<W: Write> DeflateEncoder<W> {
    /// Creates a new encoder writing to `output` at the given level
    /// (values above 9 are clamped).
    pub fn new(output: W, level: u32) -> Self {
        Self {
            inner: FlateEncoder::new(output, Compression::new(level.min(9))),
        }
    }

    /// Finishes encoding and returns the underlying writer.
    pub fn finish(self) -> io::Result<W> {
        self.inner.finish()
    }
}

impl<W: Write> Write for DeflateEncoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Streaming Deflate decoder over any buffered reader.
pub struct DeflateDecoder<R> {
    inner: FlateDecoder<R>,
}

impl<R> std::fmt::Debug for DeflateDecoder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeflateDecoder").finish_non_exhaustive()
    }
}

impl<R: io::BufRead> DeflateDecoder<R> {
    /// Creates a new decoder reading from `input`.
    pub fn new(input: R) -> Self {
        Self {
            inner: FlateDecoder::new(input),
        }
    }
}

impl<R: io::BufRead> Read for DeflateDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

/// A writer wrapper that counts bytes passing through it.
struct CountingWriter<W> {
    inner: W,
    bytes: u64,
}

impl<W> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, bytes: 0 }
    }

    fn bytes_written(&self) -> u64 {
        self.bytes
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.bytes += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// A reader wrapper that counts bytes passing through it.
struct CountingReader<R> {
    inner: R,
    bytes: u64,
}

impl<R> CountingReader<R> {
    fn new(inner: R) -> Self {
        Self { inner, bytes: 0 }
    }

    fn bytes_read(&self) -> u64 {
        self.bytes
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.bytes += n as u64;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor};

    #[test]
    fn test_stream_roundtrip() {
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();

        let mut compressed = Vec::new();
        let (read, written) = compress_stream(Cursor::new(&data), &mut compressed, 6).unwrap();
        assert_eq!(read, data.len() as u64);
        assert_eq!(written, compressed.len() as u64);

        let mut decompressed = Vec::new();
        let (consumed, out) =
            decompress_stream(Cursor::new(&compressed), &mut decompressed).unwrap();
        assert!(consumed > 0);
        assert_eq!(out, data.len() as u64);
        assert_eq!(decompressed, data);
    }

    #[test]
    fn test_encoder_decoder_wrappers() {
        let data = b"streaming wrapper roundtrip data";

        let mut encoder = DeflateEncoder::new(Vec::new(), 9);
        encoder.write_all(data).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut decoder = DeflateDecoder::new(BufReader::new(Cursor::new(compressed)));
        let mut out = Vec::new();
        decoder.read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_level_clamped() {
        // Level above 9 must not panic; it is clamped.
        let mut encoder = DeflateEncoder::new(Vec::new(), 42);
        encoder.write_all(b"x").unwrap();
        encoder.finish().unwrap();
    }
}
