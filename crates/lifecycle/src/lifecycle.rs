//! Lifecycle Orchestrator (C8): admin approve/revoke/reject/delete, batch
//! operation over `(botId, tenancy)` pairs, and promotional-offer
//! auto-approval for freshly placed guest bots.

use std::sync::Arc;

use wafleet_placement::PlacementEngine;
use wafleet_registry::{ApprovalStatus, BotInstance, RegistryStore};
use wafleet_supervisor::Supervisor;

use crate::error::{Error, Result};

pub struct LifecycleOrchestrator {
    tenancy: String,
    registry: RegistryStore,
    supervisor: Arc<Supervisor>,
    placement: PlacementEngine,
}

/// One unit of work in a batch operation, naming the tenancy that owns
/// `bot_id` so the orchestrator can reject anything outside its own scope.
pub struct BatchItem {
    pub bot_id: String,
    pub tenancy: String,
    pub action: BatchAction,
}

pub enum BatchAction {
    Start,
    Stop,
    Approve { expiration_months: Option<i64> },
    Revoke,
    Reject,
    Delete,
    Migrate { target: String },
}

pub struct BatchOutcome {
    pub bot_id: String,
    pub tenancy: String,
    pub result: std::result::Result<(), String>,
}

impl LifecycleOrchestrator {
    #[must_use]
    pub fn new(tenancy: impl Into<String>, registry: RegistryStore, supervisor: Arc<Supervisor>) -> Self {
        let tenancy = tenancy.into();
        let placement = PlacementEngine::new(registry.clone());
        Self {
            tenancy,
            registry,
            supervisor,
            placement,
        }
    }

    async fn require_local_bot(&self, bot_id: &str) -> Result<BotInstance> {
        self.registry.get_bot(&self.tenancy, bot_id).await?.ok_or(Error::BotNotFound)
    }

    /// Approves a bot, optionally migrating it to `target_tenancy` first.
    /// Migration moves the row off this tenancy, so the approved bot is
    /// started here only when it stays local; a remote approval still
    /// writes `approval_status` but leaves starting it to that tenancy's
    /// own orchestrator.
    pub async fn approve(
        &self,
        bot_id: &str,
        expiration_months: Option<i64>,
        target_tenancy: Option<&str>,
    ) -> Result<()> {
        let bot = self.require_local_bot(bot_id).await?;

        let owning_tenancy = if let Some(target) = target_tenancy {
            if target != self.tenancy {
                self.placement.migrate_bot(bot_id, &self.tenancy, target).await?;
            }
            target.to_string()
        } else {
            self.tenancy.clone()
        };

        self.registry
            .set_approval(&owning_tenancy, bot_id, ApprovalStatus::Approved, expiration_months)
            .await?;

        if owning_tenancy == self.tenancy {
            if bot.auto_start {
                self.supervisor.start_bot(bot_id).await?;
            }
            self.supervisor
                .schedule_approval_notification(bot_id.to_string(), bot.phone_number.clone());
        }
        Ok(())
    }

    /// Stops the worker, resets approval to pending, and clears the
    /// approval date — `set_approval` always nulls the date for a
    /// non-approved status, which is exactly this operation's contract.
    pub async fn revoke(&self, bot_id: &str) -> Result<()> {
        self.require_local_bot(bot_id).await?;
        self.supervisor.stop_bot(bot_id, true).await?;
        self.registry
            .set_approval(&self.tenancy, bot_id, ApprovalStatus::Pending, None)
            .await?;
        Ok(())
    }

    pub async fn reject(&self, bot_id: &str) -> Result<()> {
        self.require_local_bot(bot_id).await?;
        self.registry
            .set_approval(&self.tenancy, bot_id, ApprovalStatus::Rejected, None)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, bot_id: &str) -> Result<()> {
        self.require_local_bot(bot_id).await?;
        self.supervisor.destroy_bot(bot_id).await?;
        Ok(())
    }

    pub async fn start(&self, bot_id: &str) -> Result<()> {
        self.require_local_bot(bot_id).await?;
        self.supervisor.start_bot(bot_id).await?;
        Ok(())
    }

    pub async fn stop(&self, bot_id: &str) -> Result<()> {
        self.require_local_bot(bot_id).await?;
        self.supervisor.stop_bot(bot_id, true).await?;
        Ok(())
    }

    pub async fn migrate(&self, bot_id: &str, target: &str) -> Result<()> {
        self.require_local_bot(bot_id).await?;
        self.supervisor.stop_bot(bot_id, true).await?;
        self.placement.migrate_bot(bot_id, &self.tenancy, target).await?;
        Ok(())
    }

    /// Runs every item, accumulating a per-item result instead of failing
    /// the whole batch on the first error. Items naming a foreign tenancy
    /// are rejected outright: lifecycle commands against bots this
    /// orchestrator doesn't own must go through signed RPC, not a local
    /// batch call.
    pub async fn batch_operate(&self, items: Vec<BatchItem>) -> Vec<BatchOutcome> {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            let result = if item.tenancy != self.tenancy {
                Err(Error::CrossTenancy)
            } else {
                match &item.action {
                    BatchAction::Start => self.start(&item.bot_id).await,
                    BatchAction::Stop => self.stop(&item.bot_id).await,
                    BatchAction::Approve { expiration_months } => {
                        self.approve(&item.bot_id, *expiration_months, None).await
                    },
                    BatchAction::Revoke => self.revoke(&item.bot_id).await,
                    BatchAction::Reject => self.reject(&item.bot_id).await,
                    BatchAction::Delete => self.delete(&item.bot_id).await,
                    BatchAction::Migrate { target } => self.migrate(&item.bot_id, target).await,
                }
            };
            out.push(BatchOutcome {
                bot_id: item.bot_id,
                tenancy: item.tenancy,
                result: result.map_err(|e| e.to_string()),
            });
        }
        out
    }

    /// If this tenancy's promotional offer is active and unexpired, marks a
    /// freshly placed guest bot approved immediately. Returns whether
    /// auto-approval applied.
    pub async fn maybe_auto_approve(&self, bot: &BotInstance) -> Result<bool> {
        if !bot.is_guest {
            return Ok(false);
        }
        let Some(offer) = self.registry.get_offer_config(&self.tenancy).await? else {
            return Ok(false);
        };
        if !offer.is_active || self.offer_expired(&offer) {
            return Ok(false);
        }

        self.registry
            .set_approval(&self.tenancy, &bot.id, ApprovalStatus::Approved, None)
            .await?;
        if bot.auto_start {
            self.supervisor.start_bot(&bot.id).await?;
        }
        Ok(true)
    }

    fn offer_expired(&self, offer: &wafleet_registry::PromotionalOfferConfig) -> bool {
        let Some(start_date) = &offer.start_date else {
            return false;
        };
        let Ok(start) = chrono::DateTime::parse_from_rfc3339(start_date) else {
            return false;
        };
        let span = match offer.duration_type.as_str() {
            "days" => chrono::Duration::days(offer.duration_value),
            "months" => chrono::Duration::days(offer.duration_value * 30),
            _ => return false,
        };
        chrono::Utc::now() > start.to_utc() + span
    }
}
