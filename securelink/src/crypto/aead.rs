// AES-256-GCM with a detached tag: 256-bit key, 96-bit nonce, 128-bit tag.

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce, Tag};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{Error, Result};

pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

/// AES-256-GCM authenticated encryption with associated data.
pub struct Aes256GcmCipher {
    cipher: Aes256Gcm,
}

impl Aes256GcmCipher {
    /// Create a new AES-256-GCM cipher from a 32-byte key.
    pub fn new(key: &[u8; 32]) -> Result<Self> {
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| Error::InvalidKey(format!("aes-gcm init: {e}")))?;
        Ok(Self { cipher })
    }

    /// Encrypt `buffer` in place under `nonce` and `aad`, returning the tag.
    pub fn seal(
        &self,
        nonce: &[u8; NONCE_LEN],
        aad: &[u8],
        buffer: &mut [u8],
    ) -> Result<[u8; TAG_LEN]> {
        let tag = self
            .cipher
            .encrypt_in_place_detached(Nonce::from_slice(nonce), aad, buffer)
            .map_err(|e| Error::Encryption(format!("{e}")))?;
        let mut out = [0u8; TAG_LEN];
        out.copy_from_slice(&tag);
        Ok(out)
    }

    /// Decrypt `buffer` in place, checking `tag` over the ciphertext and `aad`.
    ///
    /// Any failure is reported as [`Error::TagMismatch`]; a wrong key, a wrong
    /// nonce and a tampered byte look identical to the caller.
    pub fn open(
        &self,
        nonce: &[u8; NONCE_LEN],
        aad: &[u8],
        buffer: &mut [u8],
        tag: &[u8; TAG_LEN],
    ) -> Result<()> {
        self.cipher
            .decrypt_in_place_detached(Nonce::from_slice(nonce), aad, buffer, Tag::from_slice(tag))
            .map_err(|_| Error::TagMismatch)
    }
}

/// A fresh random 96-bit nonce from the OS RNG.
pub fn random_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    nonce
}
