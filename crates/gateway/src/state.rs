//! Shared application state for one tenancy's gateway process, threaded
//! through axum via `State` the way the teacher's `GatewayState` is.

use std::sync::Arc;

use secrecy::SecretString;
use wafleet_guestauth::GuestAuthCore;
use wafleet_lifecycle::LifecycleOrchestrator;
use wafleet_placement::PlacementEngine;
use wafleet_registry::RegistryStore;
use wafleet_supervisor::{EventBroadcaster, Supervisor, SupervisorEvent};

/// Fans Supervisor events out to any number of subscribers (e.g. an admin
/// SSE stream) via a broadcast channel. Never blocks: `tokio::sync::broadcast`
/// drops the message for subscribers that are too far behind.
pub struct ChannelBroadcaster {
    sender: tokio::sync::broadcast::Sender<SupervisorEvent>,
}

impl ChannelBroadcaster {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = tokio::sync::broadcast::channel(256);
        Self { sender }
    }

    #[must_use]
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<SupervisorEvent> {
        self.sender.subscribe()
    }
}

impl Default for ChannelBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBroadcaster for ChannelBroadcaster {
    fn publish(&self, event: SupervisorEvent) {
        let _ = self.sender.send(event);
    }
}

#[derive(Clone)]
pub struct AppState {
    pub tenancy: String,
    pub registry: RegistryStore,
    pub supervisor: Arc<Supervisor>,
    pub placement: Arc<PlacementEngine>,
    pub lifecycle: Arc<LifecycleOrchestrator>,
    pub guest_auth: Arc<GuestAuthCore>,
    pub rpc: wafleet_rpc::RpcState,
    pub admin_secret: Arc<wafleet_auth::AdminSecret>,
    pub admin_username: String,
    pub admin_password_hash: Arc<SecretString>,
    pub events: Arc<ChannelBroadcaster>,
}

impl axum::extract::FromRef<AppState> for Arc<wafleet_auth::AdminSecret> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.admin_secret)
    }
}
