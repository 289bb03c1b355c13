//! Row types persisted by the registry store. Field names mirror the data
//! model's attributes so sqlx's `query_as` derives map straight to columns.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BotStatus {
    Offline,
    Loading,
    Online,
    Error,
    Dormant,
}

impl std::fmt::Display for BotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Offline => "offline",
            Self::Loading => "loading",
            Self::Online => "online",
            Self::Error => "error",
            Self::Dormant => "dormant",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
    Dormant,
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Dormant => "dormant",
        };
        f.write_str(s)
    }
}

/// The central entity: a persistent record of one WhatsApp-protocol bot
/// session, owned by exactly one tenancy.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BotInstance {
    pub id: String,
    pub name: String,
    pub phone_number: String,
    pub server_name: String,
    pub credentials: Option<String>,
    pub status: BotStatus,
    pub approval_status: ApprovalStatus,
    pub approval_date: Option<String>,
    pub expiration_months: Option<i64>,
    pub auto_like: bool,
    pub auto_react: bool,
    pub auto_view_status: bool,
    pub chatgpt_enabled: bool,
    pub always_online: bool,
    pub presence_auto_switch: bool,
    pub typing_mode: String,
    pub presence_mode: String,
    pub credential_verified: bool,
    pub invalid_reason: Option<String>,
    pub auto_start: bool,
    pub is_guest: bool,
    pub messages_count: i64,
    pub commands_count: i64,
    pub last_activity: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl BotInstance {
    /// A bot with no approval date or no expiration window never expires.
    /// Otherwise expired once `now > approval_date + expiration_months * 30
    /// days`.
    #[must_use]
    pub fn is_expired(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        let (Some(approval_date), Some(months)) = (&self.approval_date, self.expiration_months) else {
            return false;
        };
        let Ok(approved_at) = chrono::DateTime::parse_from_rfc3339(approval_date) else {
            return false;
        };
        let expires_at = approved_at.to_utc() + chrono::Duration::days(months * 30);
        now > expires_at
    }
}

/// Fields a caller supplies when registering a new bot. Server-managed
/// fields (id, counters, timestamps, status) are filled in by the store.
#[derive(Debug, Clone, Default)]
pub struct NewBotFields {
    pub name: String,
    pub credentials: Option<String>,
    pub credential_verified: bool,
    pub is_guest: bool,
    pub auto_start: bool,
}

/// The God Registry row: a globally unique phone -> owning-tenancy mapping.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct GlobalRegistration {
    pub phone_number: String,
    pub tenancy_name: String,
    pub registered_at: String,
}

/// Catalog entry for one tenancy in the fleet.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Server {
    pub name: String,
    pub max_bot_count: i64,
    pub current_bot_count: i64,
    pub status: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub shared_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Activity {
    pub id: String,
    pub activity_type: String,
    pub description: String,
    pub metadata: Option<String>,
    pub tenancy: String,
    pub bot_instance_id: Option<String>,
    pub remote_tenancy: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Command {
    pub id: String,
    pub tenancy: String,
    pub name: String,
    pub description: Option<String>,
    pub response_template: Option<String>,
    pub category: Option<String>,
    pub is_active: bool,
    pub is_custom_code: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PromotionalOfferConfig {
    pub tenancy: String,
    pub is_active: bool,
    pub start_date: Option<String>,
    pub duration_type: String,
    pub duration_value: i64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Capacity {
    pub can_add: bool,
    pub current: i64,
    pub max: i64,
}

/// Outcome of [`crate::store::RegistryStore::create_cross_server_registration`].
#[derive(Debug)]
pub enum RegistrationOutcome {
    Success(BotInstance),
    AlreadyRegisteredTo(String),
    CapacityFull,
}
