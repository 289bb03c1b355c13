//! Realtime push events the Supervisor publishes on every state change. A
//! single fan-out sink is injected; slow or disconnected subscribers must
//! never block a state transition.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum SupervisorEvent {
    #[serde(rename = "BOT_CREATED")]
    BotCreated { bot_id: String },
    #[serde(rename = "BOT_APPROVED")]
    BotApproved { bot_id: String },
    #[serde(rename = "BOT_STATUS_CHANGED")]
    BotStatusChanged { bot_id: String, status: String },
    #[serde(rename = "BOT_ERROR")]
    BotError { bot_id: String, reason: String },
    #[serde(rename = "BOT_DELETED")]
    BotDeleted { bot_id: String },
    #[serde(rename = "BOT_RESUMED")]
    BotResumed { bot_id: String },
}

/// The broadcaster the Supervisor publishes every state transition to.
/// Implementations must not block or panic on a full/slow subscriber —
/// drop and continue.
pub trait EventBroadcaster: Send + Sync {
    fn publish(&self, event: SupervisorEvent);
}

/// Discards every event. Useful for tests and for tenancies that haven't
/// wired a realtime push layer yet.
#[derive(Default)]
pub struct NullBroadcaster;

impl EventBroadcaster for NullBroadcaster {
    fn publish(&self, _event: SupervisorEvent) {}
}
