// src/crypto/cipher.rs

//! AES-GCM sealing with a fixed 12-byte nonce.
//!
//! The nonce length is pinned (rather than derived from the cipher) so a
//! decoder can always split the first [`NONCE_LEN`] bytes off a sealed blob
//! without parsing a length field.

use aes_gcm::aead::consts::U12;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::aes::Aes192;
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm, Nonce};
use rand::TryRngCore;
use rand::rngs::OsRng;

use crate::crypto::key::Key;
use crate::errors::{Result, RunnerError};

/// Bytes of random nonce prepended to every sealed blob.
pub const NONCE_LEN: usize = 12;

/// Bytes of authentication tag appended by GCM.
pub const TAG_LEN: usize = 16;

type Aes192Gcm = AesGcm<Aes192, U12>;

enum Sealer {
    Aes128(Aes128Gcm),
    Aes192(Aes192Gcm),
    Aes256(Aes256Gcm),
}

/// Ready-to-use authenticated encryption context.
///
/// Immutable after construction; `seal` draws a fresh nonce from the OS on
/// every call, so one context can be shared by both capturers without
/// locking.
pub struct CipherContext {
    sealer: Sealer,
}

impl CipherContext {
    pub fn new(key: &Key) -> Result<Self> {
        let bytes = key.as_bytes();
        let len = bytes.len();

        let sealer = match len {
            16 => Aes128Gcm::new_from_slice(bytes).map(Sealer::Aes128),
            24 => Aes192Gcm::new_from_slice(bytes).map(Sealer::Aes192),
            32 => Aes256Gcm::new_from_slice(bytes).map(Sealer::Aes256),
            other => return Err(RunnerError::InvalidKeyLength(other)),
        }
        .map_err(|_| RunnerError::InvalidKeyLength(len))?;

        Ok(Self { sealer })
    }

    /// Key strength in bits (128, 192 or 256).
    pub fn key_bits(&self) -> usize {
        match self.sealer {
            Sealer::Aes128(_) => 128,
            Sealer::Aes192(_) => 192,
            Sealer::Aes256(_) => 256,
        }
    }

    /// Encrypt `plaintext` under a fresh random nonce.
    ///
    /// Returns `nonce || ciphertext || tag`.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng
            .try_fill_bytes(&mut nonce)
            .map_err(|e| RunnerError::Entropy(e.to_string()))?;

        let sealed = self
            .encrypt(&nonce, plaintext)
            .map_err(|_| RunnerError::Encryption)?;

        let mut blob = Vec::with_capacity(NONCE_LEN + sealed.len());
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&sealed);
        Ok(blob)
    }

    /// Reverse of [`seal`](Self::seal). Fails if the blob is truncated, was
    /// sealed under a different key, or has been tampered with.
    pub fn open(&self, blob: &[u8]) -> std::result::Result<Vec<u8>, aes_gcm::Error> {
        if blob.len() < NONCE_LEN + TAG_LEN {
            return Err(aes_gcm::Error);
        }
        let (nonce, sealed) = blob.split_at(NONCE_LEN);
        let nonce = Nonce::<U12>::from_slice(nonce);

        match &self.sealer {
            Sealer::Aes128(c) => c.decrypt(nonce, sealed),
            Sealer::Aes192(c) => c.decrypt(nonce, sealed),
            Sealer::Aes256(c) => c.decrypt(nonce, sealed),
        }
    }

    fn encrypt(
        &self,
        nonce: &[u8; NONCE_LEN],
        plaintext: &[u8],
    ) -> std::result::Result<Vec<u8>, aes_gcm::Error> {
        let nonce = Nonce::<U12>::from_slice(nonce);

        match &self.sealer {
            Sealer::Aes128(c) => c.encrypt(nonce, plaintext),
            Sealer::Aes192(c) => c.encrypt(nonce, plaintext),
            Sealer::Aes256(c) => c.encrypt(nonce, plaintext),
        }
    }
}

impl std::fmt::Debug for CipherContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherContext")
            .field("key_bits", &self.key_bits())
            .finish()
    }
}
