//! HMAC-SHA256 integrity tags over raw payload bytes.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::SealError;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Byte length of an HMAC-SHA256 tag.
pub const TAG_LEN: usize = 32;

/// Compute the HMAC-SHA256 tag of `payload` under `key`.
///
/// # Errors
///
/// Returns [`SealError::InvalidKeyLength`] if the MAC rejects the key
/// (HMAC accepts any length, so this is unreachable in practice).
pub fn compute_tag(key: &[u8], payload: &[u8]) -> Result<[u8; TAG_LEN], SealError> {
    let mut mac = keyed_mac(key)?;
    mac.update(payload);
    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(&mac.finalize().into_bytes());
    Ok(tag)
}

/// Recompute the tag of `payload` and compare it with the base64-encoded
/// `expected_tag_b64` in constant time.
///
/// Returns `false` if the expected tag is not valid base64.
pub fn verify_tag(key: &[u8], payload: &[u8], expected_tag_b64: &str) -> bool {
    let Ok(expected) = STANDARD.decode(expected_tag_b64) else {
        return false;
    };
    let Ok(mut mac) = keyed_mac(key) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

fn keyed_mac(key: &[u8]) -> Result<HmacSha256, SealError> {
    <HmacSha256 as Mac>::new_from_slice(key).map_err(|_| SealError::InvalidKeyLength(key.len()))
}
