//! Per-tenancy registry of live Session Workers. Starts, stops, restarts,
//! and destroys them; enforces resume-on-startup, the creation watchdog,
//! and delayed post-approval notifications; and is the single broadcaster
//! for bot state changes.

use std::{path::PathBuf, sync::Arc, time::Duration};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex as TokioMutex;
use tracing::{error, info, warn};
use wafleet_registry::{ApprovalStatus, BotStatus as RegistryBotStatus, RegistryStore};
use wafleet_session::{SessionEvent, SessionEventSink, SessionStatus, SessionWorker, SessionWorkerFactory};

use crate::error::{Error, Result};
use crate::events::{EventBroadcaster, SupervisorEvent};

const STAGGER_INTERVAL: Duration = Duration::from_secs(2);
const CREATION_WATCHDOG: Duration = Duration::from_secs(5 * 60);
const APPROVAL_NOTIFICATION_DELAY: Duration = Duration::from_secs(5);

type WorkerHandle = Arc<TokioMutex<Box<dyn SessionWorker>>>;

pub struct Supervisor {
    tenancy: String,
    registry: RegistryStore,
    factory: Arc<dyn SessionWorkerFactory>,
    broadcaster: Arc<dyn EventBroadcaster>,
    credentials_root: PathBuf,
    workers: Arc<DashMap<String, WorkerHandle>>,
}

/// Forwards worker-level events into the registry and the broadcaster.
struct SupervisorSink {
    tenancy: String,
    registry: RegistryStore,
    broadcaster: Arc<dyn EventBroadcaster>,
}

#[async_trait]
impl SessionEventSink for SupervisorSink {
    async fn emit(&self, event: SessionEvent) {
        match event {
            SessionEvent::StatusChanged { bot_id, status } => {
                let registry_status = match status {
                    SessionStatus::Offline => RegistryBotStatus::Offline,
                    SessionStatus::Loading => RegistryBotStatus::Loading,
                    SessionStatus::Online => RegistryBotStatus::Online,
                    SessionStatus::Error => RegistryBotStatus::Error,
                };
                if let Err(e) = self
                    .registry
                    .set_bot_status(&self.tenancy, &bot_id, registry_status)
                    .await
                {
                    warn!(bot_id, error = %e, "failed to persist status change");
                }
                self.broadcaster.publish(SupervisorEvent::BotStatusChanged {
                    bot_id,
                    status: registry_status.to_string(),
                });
            },
            SessionEvent::Disconnected { bot_id, reason } => {
                if let wafleet_session::DisconnectReason::CredentialsRevoked = reason {
                    let _ = self
                        .registry
                        .set_invalid_reason(&self.tenancy, &bot_id, Some("credentials revoked"))
                        .await;
                }
                self.broadcaster.publish(SupervisorEvent::BotError {
                    bot_id,
                    reason: format!("{reason:?}"),
                });
            },
            SessionEvent::MessageSent { bot_id } => {
                let _ = self.registry.increment_message_count(&self.tenancy, &bot_id).await;
            },
        }
    }
}

impl Supervisor {
    #[must_use]
    pub fn new(
        tenancy: impl Into<String>,
        registry: RegistryStore,
        factory: Arc<dyn SessionWorkerFactory>,
        broadcaster: Arc<dyn EventBroadcaster>,
        credentials_root: PathBuf,
    ) -> Self {
        Self {
            tenancy: tenancy.into(),
            registry,
            factory,
            broadcaster,
            credentials_root,
            workers: Arc::new(DashMap::new()),
        }
    }

    fn sink(&self) -> Arc<dyn SessionEventSink> {
        Arc::new(SupervisorSink {
            tenancy: self.tenancy.clone(),
            registry: self.registry.clone(),
            broadcaster: Arc::clone(&self.broadcaster),
        })
    }

    fn credentials_dir(&self, bot_id: &str) -> PathBuf {
        self.credentials_root.join(format!("bot_{bot_id}"))
    }

    /// Registers resource bookkeeping for a freshly-created bot row and
    /// arms the 5-minute creation watchdog. Does not itself start the
    /// worker — the caller decides that based on auto-start policy.
    pub async fn register_new_bot(&self, bot_id: &str) -> Result<()> {
        self.broadcaster.publish(SupervisorEvent::BotCreated {
            bot_id: bot_id.to_string(),
        });
        self.registry
            .log_activity(&self.tenancy, "bot_created", "bot instance created", Some(bot_id), None)
            .await?;
        self.arm_creation_watchdog(bot_id.to_string());
        Ok(())
    }

    fn arm_creation_watchdog(&self, bot_id: String) {
        let registry = self.registry.clone();
        let tenancy = self.tenancy.clone();
        let workers = Arc::clone(&self.workers);
        tokio::spawn(async move {
            tokio::time::sleep(CREATION_WATCHDOG).await;
            let Ok(Some(bot)) = registry.get_bot(&tenancy, &bot_id).await else {
                return;
            };
            if matches!(bot.status, RegistryBotStatus::Loading | RegistryBotStatus::Error) {
                warn!(bot_id, "creation watchdog expired, auto-deleting bot");
                workers.remove(&bot_id);
                let _ = registry.delete_bot_cascade(&tenancy, &bot_id).await;
                let _ = registry
                    .log_activity(&tenancy, "auto_cleanup", "creation watchdog expired", None, None)
                    .await;
            }
        });
    }

    pub async fn start_bot(&self, bot_id: &str) -> Result<()> {
        let bot = self
            .registry
            .get_bot(&self.tenancy, bot_id)
            .await?
            .ok_or_else(|| Error::BotNotFound(bot_id.to_string()))?;
        if bot.approval_status != ApprovalStatus::Approved {
            return Err(Error::NotApproved(bot_id.to_string()));
        }

        if let Some(creds) = &bot.credentials {
            let dir = self.credentials_dir(bot_id);
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| Error::Message(format!("create credentials dir: {e}")))?;
            tokio::fs::write(dir.join("creds.json"), creds)
                .await
                .map_err(|e| Error::Message(format!("write credentials: {e}")))?;
        }

        let mut worker = self.factory.build(bot_id, &self.credentials_dir(bot_id), self.sink());
        worker.start().await?;
        self.workers.insert(bot_id.to_string(), Arc::new(TokioMutex::new(worker)));
        Ok(())
    }

    pub async fn stop_bot(&self, bot_id: &str, preserve_credentials: bool) -> Result<()> {
        if let Some((_, handle)) = self.workers.remove(bot_id) {
            handle.lock().await.stop(preserve_credentials).await?;
        }
        self.registry
            .set_bot_status(&self.tenancy, bot_id, RegistryBotStatus::Offline)
            .await?;
        Ok(())
    }

    pub async fn restart_bot(&self, bot_id: &str) -> Result<()> {
        self.stop_bot(bot_id, true).await?;
        self.start_bot(bot_id).await
    }

    pub async fn destroy_bot(&self, bot_id: &str) -> Result<()> {
        if let Some((_, handle)) = self.workers.remove(bot_id) {
            handle.lock().await.stop(false).await?;
        }
        self.registry.delete_bot_cascade(&self.tenancy, bot_id).await?;
        self.broadcaster.publish(SupervisorEvent::BotDeleted {
            bot_id: bot_id.to_string(),
        });
        Ok(())
    }

    pub async fn get_bot(&self, bot_id: &str) -> Result<Option<wafleet_registry::BotInstance>> {
        Ok(self.registry.get_bot(&self.tenancy, bot_id).await?)
    }

    pub async fn get_all_statuses(&self) -> Vec<(String, SessionStatus)> {
        let mut out = Vec::new();
        for entry in self.workers.iter() {
            let status = entry.value().lock().await.status();
            out.push((entry.key().clone(), status));
        }
        out
    }

    pub async fn send_message_through_bot(&self, bot_id: &str, jid: &str, text: &str) -> Result<()> {
        let Some(handle) = self.workers.get(bot_id).map(|e| Arc::clone(e.value())) else {
            return Err(Error::BotNotFound(bot_id.to_string()));
        };
        handle.lock().await.send_direct_message(jid, text).await?;
        Ok(())
    }

    /// Enumerates resumable bots for this tenancy and starts them staggered
    /// by [`STAGGER_INTERVAL`] per bot. One failing worker never stops the
    /// others.
    pub async fn resume_on_startup(self: &Arc<Self>) -> Result<()> {
        let bots = self.registry.list_resumable_bots(&self.tenancy).await?;
        self.registry
            .log_activity(
                &self.tenancy,
                "supervisor_startup",
                &format!("resuming {} bot(s)", bots.len()),
                None,
                None,
            )
            .await?;

        for (i, bot) in bots.into_iter().enumerate() {
            let this = Arc::clone(self);
            let delay = STAGGER_INTERVAL * u32::try_from(i).unwrap_or(u32::MAX);
            tokio::spawn(async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                this.registry
                    .set_bot_status(&this.tenancy, &bot.id, RegistryBotStatus::Loading)
                    .await
                    .ok();
                match this.start_bot(&bot.id).await {
                    Ok(()) => {
                        info!(bot_id = %bot.id, "bot resumed");
                        this.broadcaster.publish(SupervisorEvent::BotResumed { bot_id: bot.id.clone() });
                    },
                    Err(e) => {
                        error!(bot_id = %bot.id, error = %e, "resume failed");
                        this.registry
                            .set_bot_status(&this.tenancy, &bot.id, RegistryBotStatus::Error)
                            .await
                            .ok();
                        this.broadcaster.publish(SupervisorEvent::BotError {
                            bot_id: bot.id.clone(),
                            reason: e.to_string(),
                        });
                    },
                }
            });
        }
        Ok(())
    }

    /// Best-effort notification to the bot's own owner, scheduled ~5s after
    /// approval. Failure is logged, never fatal.
    pub fn schedule_approval_notification(self: &Arc<Self>, bot_id: String, owner_jid: String) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(APPROVAL_NOTIFICATION_DELAY).await;
            let message = "Your bot has been approved and is starting up.";
            if let Err(e) = this.send_message_through_bot(&bot_id, &owner_jid, message).await {
                warn!(bot_id, error = %e, "approval notification failed");
                let _ = this
                    .registry
                    .log_activity(
                        &this.tenancy,
                        "approval_notification_failed",
                        &e.to_string(),
                        Some(&bot_id),
                        None,
                    )
                    .await;
            }
        });
    }
}
