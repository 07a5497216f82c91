//! Cryptographic provider: key derivation, AES-256-CBC, SHA-256, CSPRNG.
//!
//! Entry encryption uses AES-256-CBC with PKCS#7 padding under a key derived
//! from the archive passphrase with PBKDF2-HMAC-SHA256 (100,000 iterations)
//! and the 32-byte salt stored in the global header. Integrity checksums are
//! SHA-256 over each entry's original bytes.
//!
//! The provider is an explicit value owned by the archive controller, not a
//! process-wide singleton; all key and IV material is passed in explicitly.
//!
//! An AES-256-GCM pair with a 16-byte authentication tag is also provided
//! for future format revisions; the current pipeline does not use it.

mod password;

pub use password::Password;

use aes::Aes256;
use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::error::{Error, Result};
use crate::format::{IV_SIZE, SALT_SIZE};

use std::fs::File;
use std::io::Read;
use std::path::Path;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// AES-256 key size in bytes.
pub const KEY_SIZE: usize = 32;

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// AES-GCM nonce size in bytes.
pub const GCM_NONCE_SIZE: usize = 12;

/// PBKDF2-HMAC-SHA256 iteration count (OWASP recommended minimum).
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// SHA-256 digest size in bytes.
pub const HASH_SIZE: usize = 32;

/// File hashing chunk size.
const FILE_CHUNK_SIZE: usize = 64 * 1024;

/// Cryptographic provider for archive operations.
///
/// Stateless: key material lives with the caller and is passed into each
/// operation. Construct one per archive and drop it with the archive.
#[derive(Debug, Default)]
pub struct CryptoProvider;

impl CryptoProvider {
    /// Creates a new provider.
    pub fn new() -> Self {
        Self
    }

    /// Derives a 32-byte AES key from a passphrase with PBKDF2-HMAC-SHA256.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when the password is empty.
    pub fn derive_key(&self, password: &Password, salt: &[u8]) -> Result<[u8; KEY_SIZE]> {
        self.derive_key_with_iterations(password, salt, PBKDF2_ITERATIONS)
    }

    /// Derives a key with an explicit iteration count.
    pub fn derive_key_with_iterations(
        &self,
        password: &Password,
        salt: &[u8],
        iterations: u32,
    ) -> Result<[u8; KEY_SIZE]> {
        if password.is_empty() {
            return Err(Error::InvalidArgument(
                "password must not be empty".into(),
            ));
        }

        let mut key = [0u8; KEY_SIZE];
        pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);
        Ok(key)
    }

    /// Generates a fresh PBKDF2 salt.
    pub fn generate_salt(&self) -> Result<[u8; SALT_SIZE]> {
        let mut salt = [0u8; SALT_SIZE];
        fill_random(&mut salt)?;
        Ok(salt)
    }

    /// Generates a fresh AES initialization vector.
    pub fn generate_iv(&self) -> Result<[u8; IV_SIZE]> {
        let mut iv = [0u8; IV_SIZE];
        fill_random(&mut iv)?;
        Ok(iv)
    }

    /// Returns `n` cryptographically secure random bytes.
    pub fn random_bytes(&self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        fill_random(&mut buf)?;
        Ok(buf)
    }

    /// Encrypts with AES-256-CBC and PKCS#7 padding.
    ///
    /// The ciphertext length is always `(plaintext.len() / 16 + 1) * 16`.
    pub fn encrypt(&self, key: &[u8; KEY_SIZE], iv: &[u8; IV_SIZE], plaintext: &[u8]) -> Vec<u8> {
        Aes256CbcEnc::new(key.into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
    }

    /// Decrypts AES-256-CBC ciphertext and strips PKCS#7 padding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DecryptFailure`] when the ciphertext length is not a
    /// positive multiple of the block size or the padding is invalid. A
    /// wrong key produces invalid padding, so wrong-password and corruption
    /// cases are indistinguishable here by design.
    pub fn decrypt(
        &self,
        key: &[u8; KEY_SIZE],
        iv: &[u8; IV_SIZE],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>> {
        if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
            return Err(Error::DecryptFailure);
        }

        Aes256CbcDec::new(key.into(), iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| Error::DecryptFailure)
    }

    /// Encrypts with AES-256-GCM, returning the ciphertext (with its 16-byte
    /// authentication tag appended) and the nonce used.
    pub fn encrypt_authenticated(
        &self,
        key: &[u8; KEY_SIZE],
        plaintext: &[u8],
    ) -> Result<(Vec<u8>, [u8; GCM_NONCE_SIZE])> {
        let mut nonce_bytes = [0u8; GCM_NONCE_SIZE];
        fill_random(&mut nonce_bytes)?;

        let cipher = Aes256Gcm::new(key.into());
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|_| Error::DecryptFailure)?;
        Ok((ciphertext, nonce_bytes))
    }

    /// Decrypts and authenticates AES-256-GCM ciphertext.
    pub fn decrypt_authenticated(
        &self,
        key: &[u8; KEY_SIZE],
        nonce: &[u8; GCM_NONCE_SIZE],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>> {
        let cipher = Aes256Gcm::new(key.into());
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| Error::DecryptFailure)
    }
}

fn fill_random(buf: &mut [u8]) -> Result<()> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| Error::CryptoFailure(format!("system random source failed: {}", e)))
}

/// Computes the SHA-256 digest of `data`.
pub fn sha256(data: &[u8]) -> [u8; HASH_SIZE] {
    Sha256::digest(data).into()
}

/// Computes the SHA-256 digest of a file, streaming it in 64 KiB chunks.
pub fn sha256_file(path: impl AsRef<Path>) -> Result<[u8; HASH_SIZE]> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; FILE_CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().into())
}

/// Compares the SHA-256 of `data` against a stored checksum in constant
/// time. Returns `false` when the stored checksum is not 32 bytes.
pub fn verify_checksum(data: &[u8], expected: &[u8]) -> bool {
    if expected.len() != HASH_SIZE {
        return false;
    }
    let actual = sha256(data);

    // Constant-time comparison: accumulate the XOR of every byte pair so
    // the loop never exits early on a mismatch.
    let mut diff = 0u8;
    for (a, b) in actual.iter().zip(expected.iter()) {
        diff |= a ^ b;
    }
    diff == 0
}

/// Wipes a buffer with three passes (zero, random, zero).
///
/// The final pass uses [`Zeroize`], which the compiler cannot elide. If the
/// CSPRNG is unavailable the random pass degrades to a second zero pass.
pub fn secure_wipe(buf: &mut [u8]) {
    buf.zeroize();
    if fill_random(buf).is_err() {
        buf.zeroize();
    }
    buf.zeroize();
}

/// Formats bytes as a lowercase hexadecimal string.
pub fn to_hex(data: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(data.len() * 2);
    for byte in data {
        // Writing to a String cannot fail.
        let _ = write!(out, "{:02x}", byte);
    }
    out
}

/// Parses a hexadecimal string into bytes.
pub fn from_hex(hex: &str) -> Result<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return Err(Error::InvalidArgument("odd-length hex string".into()));
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| Error::InvalidArgument(format!("invalid hex at offset {}", i)))
        })
        .collect()
}
