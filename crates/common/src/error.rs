//! Error type shared by the codec library and the command-line front end.

use thiserror::Error;

/// Every way a seal or unseal call can fail.
///
/// Variants map to stable machine codes and process exit codes:
/// - [`SealError::InvalidKeyLength`], [`SealError::InvalidEncoding`] → `2` (bad input)
/// - [`SealError::Cipher`], [`SealError::MalformedPayload`],
///   [`SealError::IntegrityCheckFailed`] → `3` (unseal failed)
///
/// The three unseal failures share one machine code so that front ends never
/// reveal whether padding or the integrity tag rejected a blob.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SealError {
    /// The supplied key is not a valid AES key length (16, 24 or 32 bytes).
    #[error("invalid key length: expected 16, 24 or 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    /// A caller-supplied key or blob is not valid standard base64.
    #[error("invalid base64 in {0}")]
    InvalidEncoding(&'static str),

    /// Decryption or padding validation failed. Wrong keys and corrupted
    /// ciphertext are deliberately indistinguishable.
    #[error("decryption failed")]
    Cipher,

    /// The decrypted payload is not `base64(plaintext) "\n" base64(tag)`.
    #[error("malformed sealed payload")]
    MalformedPayload,

    /// The integrity tag did not match: the blob was tampered with or the key is wrong.
    #[error("integrity check failed: data may have been tampered with")]
    IntegrityCheckFailed,
}

impl SealError {
    /// Returns `true` for failures that mean "this blob does not authenticate
    /// under this key".
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            SealError::Cipher | SealError::MalformedPayload | SealError::IntegrityCheckFailed
        )
    }

    /// Short machine-readable code, safe to expose to callers.
    pub fn code(&self) -> &'static str {
        match self {
            SealError::InvalidKeyLength(_) => "invalid_key",
            SealError::InvalidEncoding(_) => "invalid_encoding",
            SealError::Cipher | SealError::MalformedPayload | SealError::IntegrityCheckFailed => {
                "unseal_failed"
            }
        }
    }

    /// Returns the process exit code a front end should use for this error.
    pub fn exit_code(&self) -> u8 {
        if self.is_authentication_failure() {
            3
        } else {
            2
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        assert_eq!(SealError::InvalidKeyLength(7).exit_code(), 2);
        assert_eq!(SealError::InvalidEncoding("key").exit_code(), 2);
        assert_eq!(SealError::Cipher.exit_code(), 3);
        assert_eq!(SealError::MalformedPayload.exit_code(), 3);
        assert_eq!(SealError::IntegrityCheckFailed.exit_code(), 3);
    }

    #[test]
    fn unseal_failures_share_a_code() {
        assert_eq!(SealError::Cipher.code(), "unseal_failed");
        assert_eq!(SealError::MalformedPayload.code(), "unseal_failed");
        assert_eq!(SealError::IntegrityCheckFailed.code(), "unseal_failed");
        assert_eq!(SealError::InvalidKeyLength(1).code(), "invalid_key");
    }

    #[test]
    fn display_includes_detail() {
        let e = SealError::InvalidKeyLength(15);
        assert!(e.to_string().contains("got 15"));
        let e = SealError::InvalidEncoding("blob");
        assert!(e.to_string().contains("blob"));
    }
}
