//! Shared error definitions and identifier helpers used across every
//! wafleet crate.

pub mod error;
pub mod ids;
pub mod token;

pub use error::{Error, FromMessage, Result, WafleetError};
