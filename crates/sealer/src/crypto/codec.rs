//! Seal / unseal orchestration.
//!
//! ```text
//! blob = base64( iv || AES-CBC( base64(plaintext) "\n" base64(HMAC-SHA256(key, plaintext)) ) )
//! ```
//!
//! **Composition:** the tag is computed over the plaintext and encrypted along
//! with it (MAC-then-Encrypt). This is weaker than Encrypt-then-MAC: a forged
//! ciphertext is only rejected after a full decryption, and padding failures
//! surface before the tag is checked. The layout is kept as-is because existing
//! sealed values depend on it.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::{protocol::SealedSecret, SealError};
use tracing::debug;
use zeroize::{Zeroize, Zeroizing};

use super::cipher::CipherContext;
use super::tag::{compute_tag, verify_tag, TAG_LEN};
use crate::key::SecretKey;

/// Separates the encoded plaintext from the encoded tag inside the payload.
const SEPARATOR: char = '\n';

/// Encrypt `plaintext`, generating a fresh 256-bit key when `key` is `None`.
///
/// Every call draws a new random IV, so sealing the same string twice under
/// the same key yields two different blobs.
///
/// # Errors
///
/// Returns [`SealError::InvalidKeyLength`] only if the key is unusable by the
/// cipher, which cannot happen for a [`SecretKey`].
pub fn seal(plaintext: &str, key: Option<&SecretKey>) -> Result<SealedSecret, SealError> {
    let ctx = match key {
        Some(k) => CipherContext::with_key(k),
        None => CipherContext::init(None)?,
    };

    let plain = plaintext.as_bytes();
    let tag = compute_tag(ctx.key().as_bytes(), plain)?;
    let payload = encode_payload(plain, &tag);

    let sealed = ctx.encrypt_with_prepended_iv(payload.as_bytes())?;
    let blob = STANDARD.encode(&sealed);

    debug!(
        plaintext_len = plain.len(),
        blob_len = blob.len(),
        generated_key = key.is_none(),
        "sealed string"
    );

    Ok(SealedSecret {
        blob,
        key: ctx.key().to_base64(),
    })
}

/// Decrypt and verify a blob produced by [`seal`], using the base64 key it returned.
///
/// # Errors
///
/// - [`SealError::InvalidEncoding`] if `blob` or `key` is not base64.
/// - [`SealError::InvalidKeyLength`] if the decoded key is not an AES key length.
/// - [`SealError::Cipher`], [`SealError::MalformedPayload`] or
///   [`SealError::IntegrityCheckFailed`] if the blob does not authenticate.
///
/// The three authentication variants stay distinct for diagnostics, but a
/// wrong key or forged blob lands on `Cipher` far more often than on the
/// others. Callers that relay outcomes to untrusted parties should branch
/// on [`SealError::is_authentication_failure`] only, as the CLI does.
pub fn unseal(blob: &str, key: &str) -> Result<String, SealError> {
    let key = SecretKey::from_base64(key)?;
    unseal_with_key(blob, &key)
}

/// Same as [`unseal`] for callers that already hold a decoded [`SecretKey`].
///
/// # Errors
///
/// See [`unseal`].
pub fn unseal_with_key(blob: &str, key: &SecretKey) -> Result<String, SealError> {
    let sealed = STANDARD
        .decode(blob.trim())
        .map_err(|_| SealError::InvalidEncoding("blob"))?;

    let mut ctx = CipherContext::with_key(key);
    let result = ctx
        .decrypt_with_embedded_iv(&sealed)
        .and_then(|payload| open_payload(key, &payload));

    match &result {
        Ok(plaintext) => debug!(plaintext_len = plaintext.len(), "unsealed string"),
        Err(e) => debug!(code = e.code(), "unseal rejected blob"),
    }
    result
}

/// `base64(plain) "\n" base64(tag)`, built in a buffer that is wiped on drop.
fn encode_payload(plain: &[u8], tag: &[u8; TAG_LEN]) -> Zeroizing<String> {
    let capacity = base64::encoded_len(plain.len(), true).unwrap_or(0)
        + 1
        + base64::encoded_len(TAG_LEN, true).unwrap_or(0);
    let mut payload = Zeroizing::new(String::with_capacity(capacity));
    STANDARD.encode_string(plain, &mut *payload);
    payload.push(SEPARATOR);
    STANDARD.encode_string(tag, &mut *payload);
    payload
}

/// Split the decrypted payload, verify the tag, and only then release the plaintext.
fn open_payload(key: &SecretKey, payload: &[u8]) -> Result<String, SealError> {
    let text = std::str::from_utf8(payload).map_err(|_| SealError::MalformedPayload)?;

    let mut parts = text.split(SEPARATOR);
    let (Some(encoded_plain), Some(encoded_tag), None) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(SealError::MalformedPayload);
    };

    let mut candidate = Zeroizing::new(
        STANDARD
            .decode(encoded_plain)
            .map_err(|_| SealError::MalformedPayload)?,
    );

    if !verify_tag(key.as_bytes(), &candidate, encoded_tag) {
        return Err(SealError::IntegrityCheckFailed);
    }

    String::from_utf8(std::mem::take(&mut *candidate)).map_err(|e| {
        e.into_bytes().zeroize();
        SealError::MalformedPayload
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::cipher::IV_LEN;

    /// Encrypt an arbitrary inner payload the way `seal` would, so tests can
    /// forge structurally wrong payloads under a valid key.
    fn seal_raw(key: &SecretKey, payload: &str) -> String {
        seal_bytes(key, payload.as_bytes())
    }

    fn seal_bytes(key: &SecretKey, payload: &[u8]) -> String {
        let ctx = CipherContext::with_key(key);
        STANDARD.encode(ctx.encrypt_with_prepended_iv(payload).unwrap())
    }

    #[test]
    fn hello_world_round_trip() {
        let sealed = seal("hello world", None).unwrap();
        assert_eq!(unseal(&sealed.blob, &sealed.key).unwrap(), "hello world");
    }

    #[test]
    fn changing_one_key_character_fails() {
        let sealed = seal("hello world", None).unwrap();
        let mut chars: Vec<char> = sealed.key.chars().collect();
        chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
        let altered: String = chars.into_iter().collect();

        let err = unseal(&sealed.blob, &altered).unwrap_err();
        assert!(err.is_authentication_failure(), "unexpected error: {err:?}");
    }

    #[test]
    fn generated_key_is_256_bits() {
        let sealed = seal("x", None).unwrap();
        let key = SecretKey::from_base64(&sealed.key).unwrap();
        assert_eq!(key.len(), 32);
        assert_eq!(unseal_with_key(&sealed.blob, &key).unwrap(), "x");
    }

    #[test]
    fn supplied_key_is_returned() {
        let key = SecretKey::generate();
        let sealed = seal("db-password", Some(&key)).unwrap();
        assert_eq!(sealed.key, key.to_base64());
        assert_eq!(unseal_with_key(&sealed.blob, &key).unwrap(), "db-password");
    }

    #[test]
    fn same_input_gives_different_blobs() {
        let key = SecretKey::generate();
        let a = seal("same", Some(&key)).unwrap();
        let b = seal("same", Some(&key)).unwrap();
        assert_ne!(a.blob, b.blob);
        assert_eq!(unseal_with_key(&a.blob, &key).unwrap(), "same");
        assert_eq!(unseal_with_key(&b.blob, &key).unwrap(), "same");
    }

    #[test]
    fn empty_and_multibyte_plaintext() {
        for p in ["", "ключ 🔑 clé", "line one\nline two\n"] {
            let sealed = seal(p, None).unwrap();
            assert_eq!(unseal(&sealed.blob, &sealed.key).unwrap(), p);
        }
    }

    #[test]
    fn aes128_keys_are_supported() {
        let key = SecretKey::from_slice(&[3u8; 16]).unwrap();
        let sealed = seal("legacy", Some(&key)).unwrap();
        assert_eq!(unseal(&sealed.blob, &sealed.key).unwrap(), "legacy");
    }

    #[test]
    fn wrong_key_is_rejected() {
        let sealed = seal("secret", None).unwrap();
        let other = SecretKey::generate();
        let err = unseal_with_key(&sealed.blob, &other).unwrap_err();
        assert!(err.is_authentication_failure(), "unexpected error: {err:?}");
    }

    #[test]
    fn every_flipped_ciphertext_byte_is_rejected() {
        let key = SecretKey::generate();
        let sealed = seal("tamper me, please", Some(&key)).unwrap();
        let raw = STANDARD.decode(&sealed.blob).unwrap();

        for i in IV_LEN..raw.len() {
            let mut tampered = raw.clone();
            tampered[i] ^= 0x01;
            let err = unseal_with_key(&STANDARD.encode(&tampered), &key).unwrap_err();
            assert!(
                err.is_authentication_failure(),
                "byte {i}: unexpected error {err:?}"
            );
        }
    }

    #[test]
    fn flipped_iv_byte_is_rejected() {
        let key = SecretKey::generate();
        let sealed = seal("tamper me", Some(&key)).unwrap();
        let mut raw = STANDARD.decode(&sealed.blob).unwrap();
        raw[0] ^= 0x01;
        let err = unseal_with_key(&STANDARD.encode(&raw), &key).unwrap_err();
        assert!(err.is_authentication_failure(), "unexpected error: {err:?}");
    }

    #[test]
    fn truncated_blob_is_cipher_error() {
        let key = SecretKey::generate();
        let short = STANDARD.encode([0u8; 8]);
        assert_eq!(unseal_with_key(&short, &key).unwrap_err(), SealError::Cipher);

        let sealed = seal("abc", Some(&key)).unwrap();
        let mut raw = STANDARD.decode(&sealed.blob).unwrap();
        raw.truncate(raw.len() - 3);
        assert_eq!(
            unseal_with_key(&STANDARD.encode(&raw), &key).unwrap_err(),
            SealError::Cipher
        );
    }

    #[test]
    fn non_base64_inputs_are_rejected() {
        let sealed = seal("abc", None).unwrap();
        assert_eq!(
            unseal("***", &sealed.key).unwrap_err(),
            SealError::InvalidEncoding("blob")
        );
        assert_eq!(
            unseal(&sealed.blob, "***").unwrap_err(),
            SealError::InvalidEncoding("key")
        );
    }

    #[test]
    fn wrong_key_length_is_rejected() {
        let sealed = seal("abc", None).unwrap();
        let short_key = STANDARD.encode([1u8; 10]);
        assert_eq!(
            unseal(&sealed.blob, &short_key).unwrap_err(),
            SealError::InvalidKeyLength(10)
        );
    }

    #[test]
    fn payload_without_separator_is_malformed() {
        let key = SecretKey::generate();
        let blob = seal_raw(&key, "aGVsbG8=");
        assert_eq!(
            unseal_with_key(&blob, &key).unwrap_err(),
            SealError::MalformedPayload
        );
    }

    #[test]
    fn payload_with_extra_segment_is_malformed() {
        let key = SecretKey::generate();
        let tag = STANDARD.encode(compute_tag(key.as_bytes(), b"hello").unwrap());
        let blob = seal_raw(&key, &format!("aGVsbG8=\n{tag}\nextra"));
        assert_eq!(
            unseal_with_key(&blob, &key).unwrap_err(),
            SealError::MalformedPayload
        );
    }

    #[test]
    fn payload_with_bad_plaintext_encoding_is_malformed() {
        let key = SecretKey::generate();
        let tag = STANDARD.encode(compute_tag(key.as_bytes(), b"hello").unwrap());
        let blob = seal_raw(&key, &format!("not*base64\n{tag}"));
        assert_eq!(
            unseal_with_key(&blob, &key).unwrap_err(),
            SealError::MalformedPayload
        );
    }

    #[test]
    fn non_utf8_payload_is_malformed() {
        let key = SecretKey::generate();
        let blob = seal_bytes(&key, &[0xFF, 0xFE, b'\n', b'A']);
        assert_eq!(
            unseal_with_key(&blob, &key).unwrap_err(),
            SealError::MalformedPayload
        );
    }

    #[test]
    fn authenticated_non_utf8_plaintext_is_malformed() {
        let key = SecretKey::generate();
        let plain = STANDARD.encode([0xFF]);
        let tag = STANDARD.encode(compute_tag(key.as_bytes(), &[0xFF]).unwrap());
        let blob = seal_raw(&key, &format!("{plain}\n{tag}"));
        assert_eq!(
            unseal_with_key(&blob, &key).unwrap_err(),
            SealError::MalformedPayload
        );
    }

    #[test]
    fn forged_tag_fails_integrity_check() {
        let key = SecretKey::generate();
        let tag = STANDARD.encode(compute_tag(key.as_bytes(), b"hello").unwrap());
        let blob = seal_raw(&key, &format!("Z29vZGJ5ZQ==\n{tag}"));
        assert_eq!(
            unseal_with_key(&blob, &key).unwrap_err(),
            SealError::IntegrityCheckFailed
        );

        let blob = seal_raw(&key, "aGVsbG8=\n!!not-a-tag!!");
        assert_eq!(
            unseal_with_key(&blob, &key).unwrap_err(),
            SealError::IntegrityCheckFailed
        );
    }

    #[test]
    fn matches_hand_built_payload() {
        let key = SecretKey::generate();
        let tag = STANDARD.encode(compute_tag(key.as_bytes(), b"hello").unwrap());
        let blob = seal_raw(&key, &format!("aGVsbG8=\n{tag}"));
        assert_eq!(unseal_with_key(&blob, &key).unwrap(), "hello");
    }

    #[test]
    fn surrounding_whitespace_in_blob_is_ignored() {
        let sealed = seal("trim", None).unwrap();
        let padded = format!("  {}\n", sealed.blob);
        assert_eq!(unseal(&padded, &sealed.key).unwrap(), "trim");
    }
}
