//! Guest Auth Core (C7): three entry paths to a short-lived guest token
//! bound to `(phoneNumber, botId)` — session-ID proof, WhatsApp OTP, and
//! authenticated credential rotation.

use std::sync::Arc;

use async_trait::async_trait;
use wafleet_registry::{ApprovalStatus, RegistryStore};
use wafleet_supervisor::Supervisor;

use crate::error::{Error, Result};
use crate::otp::OtpStore;
use crate::token::{self, GuestClaims};

/// The concrete WhatsApp connectivity test is an external collaborator —
/// same boundary the session worker crate draws around the protocol
/// client. A real deployment wires this to an actual handshake attempt
/// using the candidate credentials; tests use a scripted double.
#[async_trait]
pub trait CredentialProbe: Send + Sync {
    async fn test_connection(&self, credentials_json: &str) -> bool;
}

/// Always succeeds. Placeholder for environments with no session library
/// wired up yet.
pub struct AlwaysOkProbe;

#[async_trait]
impl CredentialProbe for AlwaysOkProbe {
    async fn test_connection(&self, _credentials_json: &str) -> bool {
        true
    }
}

pub struct GuestAuthCore {
    tenancy: String,
    registry: RegistryStore,
    supervisor: Arc<Supervisor>,
    probe: Arc<dyn CredentialProbe>,
    otp: OtpStore,
    token_secret: String,
}

impl GuestAuthCore {
    #[must_use]
    pub fn new(
        tenancy: impl Into<String>,
        registry: RegistryStore,
        supervisor: Arc<Supervisor>,
        probe: Arc<dyn CredentialProbe>,
        token_secret: impl Into<String>,
    ) -> Self {
        Self {
            tenancy: tenancy.into(),
            registry,
            supervisor,
            probe,
            otp: OtpStore::new(),
            token_secret: token_secret.into(),
        }
    }

    /// Path A: a guest submits a session-credentials blob. The phone it
    /// extracts must already own a bot somewhere in the fleet. If that bot
    /// is local, the new credentials are probed and, on success, written
    /// directly and the worker restarted; on failure `credentialVerified`
    /// is cleared and the failure reason recorded.
    pub async fn session_proof(&self, credentials_raw: &[u8]) -> Result<String> {
        let validated = wafleet_credentials::validate_credentials(credentials_raw, None)?;
        let registration = self
            .registry
            .find_global_registration(&validated.phone)
            .await?
            .ok_or(Error::NotRegistered)?;

        let bot = self
            .registry
            .find_bot_by_phone(&registration.tenancy_name, &validated.phone)
            .await?
            .ok_or(Error::BotNotFound)?;

        if self.probe.test_connection(&validated.canonical_json).await {
            self.registry
                .update_bot_on_server(&registration.tenancy_name, &bot.id, Some(&validated.canonical_json), true)
                .await?;
            if registration.tenancy_name == self.tenancy {
                self.supervisor.restart_bot(&bot.id).await.ok();
            }
        } else {
            self.registry
                .update_bot_on_server(&registration.tenancy_name, &bot.id, None, false)
                .await?;
            self.registry
                .set_invalid_reason(&registration.tenancy_name, &bot.id, Some("credential connection test failed"))
                .await?;
            return Err(Error::NotVerified);
        }

        token::issue(&validated.phone, &bot.id, chrono::Utc::now(), &self.token_secret).map_err(Into::into)
    }

    /// Path B, step 1: request an OTP for `phone`. The owning bot must be
    /// local, approved, unexpired, and credential-verified.
    pub async fn request_otp(&self, phone: &str) -> Result<()> {
        let bot = self
            .registry
            .find_bot_by_phone(&self.tenancy, phone)
            .await?
            .ok_or(Error::BotNotFound)?;
        if bot.approval_status != ApprovalStatus::Approved {
            return Err(Error::NotApproved);
        }
        if bot.is_expired(chrono::Utc::now()) {
            return Err(Error::Expired);
        }
        if !bot.credential_verified {
            return Err(Error::NotVerified);
        }

        let code = self.otp.issue(phone, &bot.id);
        let jid = format!("{phone}@s.whatsapp.net");
        self.supervisor
            .send_message_through_bot(&bot.id, &jid, &format!("Your verification code is {code}. It expires in 10 minutes."))
            .await?;
        Ok(())
    }

    /// Path B, step 2: exchange `(phone, code)` for a guest token.
    pub fn verify_otp(&self, phone: &str, code: &str) -> Result<String> {
        let bot_id = self.otp.verify(phone, code)?;
        token::issue(phone, &bot_id, chrono::Utc::now(), &self.token_secret).map_err(Into::into)
    }

    /// Path C: an already-authenticated guest rotates credentials. The
    /// token's `(phone, botId)` must match the new blob's extracted phone,
    /// and the Supervisor restarts the worker on success.
    pub async fn rotate_credentials(&self, guest_token: &str, credentials_raw: &[u8]) -> Result<()> {
        let claims = self.verify_token(guest_token)?;
        let validated = wafleet_credentials::validate_credentials(credentials_raw, Some(&claims.phone))?;

        self.registry
            .update_bot_on_server(&self.tenancy, &claims.bot_id, Some(&validated.canonical_json), true)
            .await?;
        self.supervisor.restart_bot(&claims.bot_id).await?;
        Ok(())
    }

    pub fn verify_token(&self, token: &str) -> Result<GuestClaims> {
        token::verify(token, &self.token_secret, chrono::Utc::now())
    }
}
