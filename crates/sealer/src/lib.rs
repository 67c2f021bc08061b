//! Sealed-string codec.
//!
//! [`seal`] encrypts a string with AES-CBC under a fresh or caller-supplied key
//! and embeds an HMAC-SHA256 tag of the plaintext; [`unseal`] reverses it and
//! refuses to return anything that does not authenticate.
//!
//! ```
//! let sealed = sealer::seal("hello world", None).unwrap();
//! assert_eq!(sealer::unseal(&sealed.blob, &sealed.key).unwrap(), "hello world");
//! ```

pub mod config;
pub mod crypto;
pub mod key;
pub mod telemetry;

pub use common::{protocol::SealedSecret, SealError};
pub use crypto::{seal, unseal, unseal_with_key};
pub use key::SecretKey;
