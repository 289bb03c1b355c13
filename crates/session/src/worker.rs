//! The contract between the Supervisor and one running bot session. A
//! concrete WhatsApp-protocol implementation (see `wafleet-whatsapp-worker`)
//! owns the client handshake; this crate only defines the shape the
//! Supervisor drives and the events it listens for.

use async_trait::async_trait;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Offline,
    Loading,
    Online,
    Error,
}

/// Why a session disconnected. The distinction matters: revoked credentials
/// must never trigger an automatic reconnect.
#[derive(Debug, Clone)]
pub enum DisconnectReason {
    /// A 401-equivalent from the protocol layer: credentials were revoked.
    CredentialsRevoked,
    /// Any other disconnect; the worker may retry with backoff.
    Transient(String),
}

/// Events a worker reports upward. The Supervisor relays these to its
/// injected broadcaster and mutates the owning `BotInstance` row.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    StatusChanged {
        bot_id: String,
        status: SessionStatus,
    },
    Disconnected {
        bot_id: String,
        reason: DisconnectReason,
    },
    MessageSent {
        bot_id: String,
    },
}

/// Sink for worker-emitted events. The Supervisor provides the concrete
/// implementation (registry writes + broadcaster fan-out).
#[async_trait]
pub trait SessionEventSink: Send + Sync {
    async fn emit(&self, event: SessionEvent);
}

/// One running (or starting, or faulted) bot session, as seen by the
/// Supervisor. Per-bot operations are serialized by the Supervisor, so
/// implementations need not be internally reentrant across these calls.
#[async_trait]
pub trait SessionWorker: Send + Sync {
    /// Connect, restoring credentials from disk. Emits status transitions
    /// and, on first successful handshake, reports `Online`.
    async fn start(&mut self) -> Result<()>;

    /// Close cleanly. If `preserve_credentials` is false, on-disk
    /// credentials are purged.
    async fn stop(&mut self, preserve_credentials: bool) -> Result<()>;

    /// Best-effort send; fails if the session is not online.
    async fn send_direct_message(&self, jid: &str, text: &str) -> Result<()>;

    fn status(&self) -> SessionStatus;
}

/// Builds a [`SessionWorker`] for one bot. The Supervisor holds one factory
/// per tenancy and calls it once per bot it starts, injecting the sink the
/// worker should report events to.
pub trait SessionWorkerFactory: Send + Sync {
    fn build(
        &self,
        bot_id: &str,
        credentials_dir: &std::path::Path,
        sink: std::sync::Arc<dyn SessionEventSink>,
    ) -> Box<dyn SessionWorker>;
}
