//! Admin bearer-token issuance/verification (§6.2) plus connection-locality
//! detection used by the gateway to decide which surfaces a request may
//! reach. Guest tokens live in `wafleet-guestauth`; RPC tokens in
//! `wafleet-rpc` — both layer the same `wafleet_common::token` primitive
//! this crate uses for admin tokens.

pub mod admin;
pub mod error;
pub mod locality;

pub use admin::{AdminClaims, AdminSecret, AdminSession, issue as issue_admin_token, verify as verify_admin_token};
pub use error::{Error, Result};
pub use locality::{has_proxy_headers, is_local_connection};
