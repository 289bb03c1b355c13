//! Credential Vault (C2): validates WhatsApp session credential blobs and
//! extracts the embedded phone number. Storage and encryption-at-rest live
//! in `wafleet-crypto`; this crate only covers the shape contract.

pub mod error;
pub mod validate;

pub use error::{Error, Result};
pub use validate::{validate_credentials, ValidatedCredentials};
