//! HTTP gateway: the admin and guest surfaces for one tenancy process,
//! plus the cross-tenancy RPC plane it mounts from `wafleet-rpc`.
//!
//! Lifecycle:
//! 1. `wafleet-config` loads and validates the tenancy's configuration.
//! 2. `Supervisor::resume_on_startup` restarts every previously-online bot.
//! 3. [`server::serve`] binds the HTTP port and serves until Ctrl-C.

pub mod admin;
pub mod error;
pub mod guest;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use state::{AppState, ChannelBroadcaster};
