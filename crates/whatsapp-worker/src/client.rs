//! The boundary to an actual WhatsApp-protocol implementation. Framing, the
//! Noise handshake, and message encoding live behind this trait in whatever
//! session library a deployment links in; this crate only drives it.

use std::path::Path;

use async_trait::async_trait;

#[derive(Debug, Clone)]
pub enum WaDisconnect {
    /// A 401-equivalent: the server rejected our credentials.
    CredentialsRevoked,
    Transient(String),
}

#[derive(Debug, thiserror::Error)]
pub enum WaClientError {
    #[error("not connected")]
    NotConnected,
    #[error("connect failed: {0}")]
    ConnectFailed(String),
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// One WhatsApp-protocol client session. A concrete implementation owns the
/// socket, the Noise handshake, and message framing.
#[async_trait]
pub trait WaSessionClient: Send {
    /// Connect using the `creds.json` at `creds_dir`, performing the
    /// handshake. Returns once the first successful handshake completes.
    async fn connect(&mut self, creds_dir: &Path) -> Result<(), WaClientError>;

    async fn send_text(&mut self, jid: &str, text: &str) -> Result<(), WaClientError>;

    /// Disconnects and, if `purge_credentials`, removes the on-disk creds.
    async fn disconnect(&mut self, purge_credentials: bool);

    /// Polls for a disconnect the client observed since the last call.
    /// Returns `None` while the connection is healthy.
    async fn poll_disconnect(&mut self) -> Option<WaDisconnect>;
}

/// Builds a fresh [`WaSessionClient`] for one bot. The concrete session
/// library provides the real implementation; this crate is generic over it.
pub trait WaSessionClientFactory: Send + Sync {
    fn build(&self) -> Box<dyn WaSessionClient>;
}
