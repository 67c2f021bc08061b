//! AES-CBC with PKCS#7 padding, with the IV carried in front of the ciphertext.
//!
//! Sealed byte layout: `iv (16 bytes) || ciphertext (n * 16 bytes)`.
//!
//! CBC provides confidentiality only. Integrity comes from the HMAC tag that
//! the codec embeds inside the encrypted payload (see [`super::tag`]).

use std::borrow::Cow;

use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, InvalidLength, KeyIvInit};
use common::SealError;
use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroizing;

use crate::key::SecretKey;

/// AES block size in bytes.
pub const BLOCK_LEN: usize = 16;

/// Byte length of a CBC initialisation vector (one block).
pub const IV_LEN: usize = BLOCK_LEN;

/// Key and IV for a single seal or unseal call.
///
/// A context is never reused across calls: every [`CipherContext`] gets its own
/// random IV at construction.
#[derive(Debug)]
pub struct CipherContext<'k> {
    key: Cow<'k, SecretKey>,
    iv: [u8; IV_LEN],
}

impl CipherContext<'static> {
    /// Create a context from optional raw key bytes.
    ///
    /// Generates a fresh 256-bit key when `key` is `None`. Always generates a
    /// fresh random IV.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::InvalidKeyLength`] if `key` is not 16, 24 or 32 bytes.
    pub fn init(key: Option<&[u8]>) -> Result<Self, SealError> {
        let key = match key {
            Some(bytes) => SecretKey::from_slice(bytes)?,
            None => SecretKey::generate(),
        };
        Ok(Self {
            key: Cow::Owned(key),
            iv: random_iv(),
        })
    }
}

impl<'k> CipherContext<'k> {
    /// Create a context that borrows an already-validated key, with a fresh IV.
    pub fn with_key(key: &'k SecretKey) -> Self {
        Self {
            key: Cow::Borrowed(key),
            iv: random_iv(),
        }
    }

    /// The key this context encrypts under.
    pub fn key(&self) -> &SecretKey {
        &self.key
    }

    /// The current IV: freshly generated, or the one read by the last
    /// [`decrypt_with_embedded_iv`](Self::decrypt_with_embedded_iv).
    pub fn iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }

    /// Encrypt `data` and return `iv || ciphertext`.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::InvalidKeyLength`] if the key is not an AES key
    /// length (unreachable for keys built through [`SecretKey`]).
    pub fn encrypt_with_prepended_iv(&self, data: &[u8]) -> Result<Vec<u8>, SealError> {
        let ciphertext = cbc_encrypt(self.key.as_bytes(), &self.iv, data)?;
        let mut sealed = Vec::with_capacity(IV_LEN + ciphertext.len());
        sealed.extend_from_slice(&self.iv);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Read the IV from the first [`IV_LEN`] bytes of `sealed`, store it in the
    /// context, and decrypt the remainder.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::Cipher`] if `sealed` holds no complete ciphertext
    /// block after the IV, if the ciphertext is not block-aligned, or if
    /// padding validation fails. The cases are not distinguished.
    pub fn decrypt_with_embedded_iv(
        &mut self,
        sealed: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, SealError> {
        if sealed.len() < IV_LEN {
            return Err(SealError::Cipher);
        }
        let (iv, ciphertext) = sealed.split_at(IV_LEN);
        if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
            return Err(SealError::Cipher);
        }
        self.iv.copy_from_slice(iv);
        cbc_decrypt(self.key.as_bytes(), &self.iv, ciphertext).map(Zeroizing::new)
    }
}

fn random_iv() -> [u8; IV_LEN] {
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);
    iv
}

fn cbc_encrypt(key: &[u8], iv: &[u8; IV_LEN], data: &[u8]) -> Result<Vec<u8>, SealError> {
    let invalid = |_: InvalidLength| SealError::InvalidKeyLength(key.len());
    let ciphertext = match key.len() {
        16 => cbc::Encryptor::<Aes128>::new_from_slices(key, iv)
            .map_err(invalid)?
            .encrypt_padded_vec_mut::<Pkcs7>(data),
        24 => cbc::Encryptor::<Aes192>::new_from_slices(key, iv)
            .map_err(invalid)?
            .encrypt_padded_vec_mut::<Pkcs7>(data),
        32 => cbc::Encryptor::<Aes256>::new_from_slices(key, iv)
            .map_err(invalid)?
            .encrypt_padded_vec_mut::<Pkcs7>(data),
        n => return Err(SealError::InvalidKeyLength(n)),
    };
    Ok(ciphertext)
}

fn cbc_decrypt(key: &[u8], iv: &[u8; IV_LEN], ciphertext: &[u8]) -> Result<Vec<u8>, SealError> {
    let invalid = |_: InvalidLength| SealError::InvalidKeyLength(key.len());
    let plaintext = match key.len() {
        16 => cbc::Decryptor::<Aes128>::new_from_slices(key, iv)
            .map_err(invalid)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        24 => cbc::Decryptor::<Aes192>::new_from_slices(key, iv)
            .map_err(invalid)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        32 => cbc::Decryptor::<Aes256>::new_from_slices(key, iv)
            .map_err(invalid)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        n => return Err(SealError::InvalidKeyLength(n)),
    };
    plaintext.map_err(|_| SealError::Cipher)
}
