//! Sealed-string primitives: AES-CBC cipher wrapper, HMAC-SHA256 tags, and the
//! seal/unseal composition built from them.
//!
//! This module is intentionally free of I/O, configuration and telemetry
//! dependencies. Every call is synchronous and owns its own key/IV context, so
//! the functions are safe to call concurrently.
//!
//! # Blob format
//!
//! ```text
//! base64( iv[16] || AES-CBC-PKCS7( base64(plaintext) "\n" base64(tag[32]) ) )
//! ```

pub mod cipher;
pub mod codec;
pub mod tag;

pub use cipher::{CipherContext, IV_LEN};
pub use codec::{seal, unseal, unseal_with_key};
pub use tag::{compute_tag, verify_tag, TAG_LEN};
