//! The tenancy's own configuration: everything §6.4 names plus the file-level
//! settings a deployment may want checked into version control (HTTP bind
//! address, default expiration, promotional-offer defaults). Secrets
//! (`ADMIN_JWT_SECRET`, `GUEST_TOKEN_SECRET`, `CREDENTIAL_VAULT_PASSPHRASE`,
//! `DATABASE_URL`) are environment-only and never written to a config file.

use secrecy::Secret;
use serde::{Deserialize, Serialize};

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_bot_count() -> u32 {
    10
}

fn default_expiration_months() -> u32 {
    12
}

/// File-backed, non-secret tenancy settings. Environment variables named in
/// §6.4 override these at process startup; see [`crate::loader::apply_env_overrides`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenancyConfig {
    /// Canonical tenancy name. Overridden at runtime by `SERVER_NAME` /
    /// `RUNTIME_SERVER_NAME` if set; see the design note in spec.md §9 — this
    /// value must never change once a process has started.
    #[serde(default)]
    pub server_name: Option<String>,

    /// Default per-tenancy bot capacity; overridden by `BOTCOUNT`.
    #[serde(default = "default_bot_count")]
    pub bot_count: u32,

    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Default expiration window (months) applied to newly approved bots
    /// when the approval call does not specify one explicitly.
    #[serde(default = "default_expiration_months")]
    pub default_expiration_months: u32,
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            server_name: None,
            bot_count: default_bot_count(),
            bind: default_bind(),
            port: default_port(),
            default_expiration_months: default_expiration_months(),
        }
    }
}

/// Process-wide secrets, loaded from environment only. Never (de)serialized
/// to a config file; `Secret` keeps them out of accidental `Debug` output.
pub struct Secrets {
    pub admin_jwt_secret: Secret<String>,
    pub guest_token_secret: Secret<String>,
    pub credential_vault_passphrase: Secret<String>,
    pub admin_username: String,
    pub admin_password_hash: Secret<String>,
    pub database_url: String,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("admin_jwt_secret", &"***")
            .field("guest_token_secret", &"***")
            .field("credential_vault_passphrase", &"***")
            .field("admin_username", &self.admin_username)
            .field("admin_password_hash", &"***")
            .field("database_url", &self.database_url)
            .finish()
    }
}
