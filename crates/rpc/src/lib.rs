//! Cross-Tenancy RPC (C6): signed HTTP control path for bot CRUD,
//! credential rotation, and lifecycle commands between tenancies, plus the
//! token primitives the direct-DB fast path does not need but the HTTP
//! plane does.

pub mod error;
pub mod http;
pub mod token;

pub use error::{Error, Result};
pub use http::{router, RpcState};
pub use token::RpcClaims;
