//! The entry transformation pipeline.
//!
//! On write, an entry's original bytes pass through a fixed sequence:
//!
//! ```text
//! checksum = sha256(original)   (already set when content was installed)
//! encrypt with the archive key+IV   (if the entry is to be encrypted)
//! deflate at the requested level    (if the entry is to be compressed)
//! ```
//!
//! Reading reverses whichever steps the entry's flags record: inflate, then
//! decrypt. Hashing comes first so the checksum always covers the plaintext;
//! it survives re-keying without rehashing and is meaningful to callers in
//! any implementation. Encryption runs before compression, which costs the
//! usual pre-compression ratio but removes ratio side channels.

use crate::codec;
use crate::crypto::{self, CryptoProvider, KEY_SIZE};
use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::format::{entry_flags, IV_SIZE};

/// The archive's cached encryption material: one key and one IV per
/// archive, established on the first encrypting add (or at open for an
/// encrypted archive). Wiped on drop.
pub(crate) struct CryptoState {
    pub key: [u8; KEY_SIZE],
    pub iv: [u8; IV_SIZE],
}

impl Drop for CryptoState {
    fn drop(&mut self) {
        crypto::secure_wipe(&mut self.key);
        crypto::secure_wipe(&mut self.iv);
    }
}

impl std::fmt::Debug for CryptoState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoState").finish_non_exhaustive()
    }
}

/// Runs the forward pipeline over an entry that holds original bytes.
///
/// The entry's checksum must already be set ([`Entry::set_data`] does
/// this); it is never touched here.
pub(crate) fn apply(
    entry: &mut Entry,
    compress: bool,
    level: u32,
    state: Option<&CryptoState>,
    provider: &CryptoProvider,
) -> Result<()> {
    if entry.is_directory() {
        return Ok(());
    }

    if let Some(state) = state {
        let ciphertext = provider.encrypt(&state.key, &state.iv, &entry.data);
        entry.set_stored_data(ciphertext);
        entry.flags |= entry_flags::ENCRYPTED;
    }

    if compress {
        let result = codec::compress(&entry.data, level)?;
        entry.set_stored_data(result.data);
        entry.flags |= entry_flags::COMPRESSED;
    }

    Ok(())
}

/// Reverses the pipeline for whichever transforms the entry's flags record
/// and returns the original content bytes.
///
/// # Errors
///
/// Returns [`Error::PasswordRequired`] when the entry is encrypted and no
/// crypto state is available, [`Error::DecompressionFailure`] or
/// [`Error::DecryptFailure`] when a layer cannot be undone.
pub(crate) fn restore(
    entry: &Entry,
    state: Option<&CryptoState>,
    provider: &CryptoProvider,
) -> Result<Vec<u8>> {
    if entry.is_directory() {
        return Ok(Vec::new());
    }

    let mut data = entry.data.clone();

    if entry.is_compressed() {
        // Under the encryption layer the deflate output is CBC ciphertext,
        // whose exact length follows from the original size.
        let expected = if entry.is_encrypted() {
            (entry.original_size / 16 + 1) * 16
        } else {
            entry.original_size
        };
        data = codec::decompress(&data, expected)?.data;
    }

    if entry.is_encrypted() {
        let state = state.ok_or(Error::PasswordRequired)?;
        data = provider.decrypt(&state.key, &state.iv, &data)?;
    }

    Ok(data)
}

/// Restores an entry and compares its content hash against the stored
/// checksum in constant time.
pub(crate) fn verify_entry(
    entry: &Entry,
    state: Option<&CryptoState>,
    provider: &CryptoProvider,
) -> Result<()> {
    if entry.is_directory() {
        return Ok(());
    }

    let original = restore(entry, state, provider)?;
    if !crypto::verify_checksum(&original, &entry.checksum) {
        return Err(Error::ChecksumMismatch {
            path: entry.path.clone(),
        });
    }
    Ok(())
}
