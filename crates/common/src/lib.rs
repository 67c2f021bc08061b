//! Common error type and protocol definitions shared across the `sealer` workspace.

pub mod error;
pub mod protocol;

pub use error::SealError;
