//! [`SecretKey`]: owned AES key material that is wiped when dropped.
//!
//! # Security invariants
//!
//! - Key bytes are **never** logged or included in traces; `Debug` is redacted.
//! - The backing buffer is zeroed on drop, so clones should be dropped promptly.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::SealError;
use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroize;

/// Byte length of a freshly generated key (AES-256).
pub const KEY_LEN: usize = 32;

/// Key lengths the AES family accepts: AES-128, AES-192, AES-256.
pub const ACCEPTED_KEY_LENS: [usize; 3] = [16, 24, KEY_LEN];

/// Symmetric key used for both encryption and the integrity tag.
#[derive(Clone)]
pub struct SecretKey(Vec<u8>);

impl SecretKey {
    /// Generate a fresh random 256-bit key from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut buf = vec![0u8; KEY_LEN];
        OsRng.fill_bytes(&mut buf);
        Self(buf)
    }

    /// Copy caller-supplied key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::InvalidKeyLength`] unless `bytes` is 16, 24 or 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SealError> {
        if !ACCEPTED_KEY_LENS.contains(&bytes.len()) {
            return Err(SealError::InvalidKeyLength(bytes.len()));
        }
        Ok(Self(bytes.to_vec()))
    }

    /// Decode a standard-base64 key, as returned in [`common::protocol::SealedSecret::key`].
    ///
    /// # Errors
    ///
    /// Returns [`SealError::InvalidEncoding`] if `encoded` is not base64 and
    /// [`SealError::InvalidKeyLength`] if the decoded length is not accepted.
    pub fn from_base64(encoded: &str) -> Result<Self, SealError> {
        let mut raw = STANDARD
            .decode(encoded.trim())
            .map_err(|_| SealError::InvalidEncoding("key"))?;
        let key = Self::from_slice(&raw);
        raw.zeroize();
        key
    }

    /// Standard-base64 encoding of the key bytes.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Key length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; a [`SecretKey`] cannot be constructed empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material, not even in debug builds.
        write!(f, "SecretKey({} bytes, [REDACTED])", self.0.len())
    }
}
