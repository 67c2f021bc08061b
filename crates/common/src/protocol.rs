//! Serialisable values exchanged between the codec and its callers.
//!
//! The CLI prints these as JSON on stdout (success) and stderr (failure).

use serde::{Deserialize, Serialize};

use crate::SealError;

// ---------------------------------------------------------------------------
// Seal output
// ---------------------------------------------------------------------------

/// Result of sealing a string: the blob and the key needed to open it.
///
/// Both fields are standard base64 and safe to store in config files,
/// environment variables or text columns. The caller owns the key from here on.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedSecret {
    /// `base64(iv || ciphertext)`.
    pub blob: String,
    /// `base64(key)`.
    pub key: String,
}

impl std::fmt::Debug for SealedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealedSecret")
            .field("blob", &self.blob)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Error body written by front ends on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"unseal_failed"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&SealError> for ErrorResponse {
    /// Unseal failures all collapse into one generic message.
    fn from(e: &SealError) -> Self {
        let message = if e.is_authentication_failure() {
            "blob could not be unsealed with this key".to_owned()
        } else {
            e.to_string()
        };
        Self::new(e.code(), message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sealed_secret_serde() {
        let s = SealedSecret {
            blob: "YmxvYg==".into(),
            key: "a2V5".into(),
        };
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, r#"{"blob":"YmxvYg==","key":"a2V5"}"#);
        let decoded: SealedSecret = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, s);
    }

    #[test]
    fn sealed_secret_debug_redacts_key() {
        let s = SealedSecret {
            blob: "YmxvYg==".into(),
            key: "c2VjcmV0LWtleQ==".into(),
        };
        let dbg = format!("{s:?}");
        assert!(dbg.contains("REDACTED"));
        assert!(!dbg.contains("c2VjcmV0LWtleQ=="));
    }

    #[test]
    fn error_response_hides_unseal_failure_kind() {
        let a = ErrorResponse::from(&SealError::Cipher);
        let b = ErrorResponse::from(&SealError::IntegrityCheckFailed);
        let c = ErrorResponse::from(&SealError::MalformedPayload);
        assert_eq!(a.code, "unseal_failed");
        assert_eq!(a.message, b.message);
        assert_eq!(b.message, c.message);
    }

    #[test]
    fn error_response_keeps_input_errors() {
        let e = ErrorResponse::from(&SealError::InvalidKeyLength(3));
        assert_eq!(e.code, "invalid_key");
        assert!(e.message.contains("got 3"));
    }
}
