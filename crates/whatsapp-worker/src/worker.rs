//! Concrete [`SessionWorker`] for a WhatsApp-protocol bot. Owns a single
//! [`WaSessionClient`], reconnecting it with bounded exponential backoff on
//! transient disconnects and refusing to reconnect once credentials are
//! revoked.

use std::{path::PathBuf, sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};
use wafleet_session::{DisconnectReason, SessionEvent, SessionEventSink, SessionStatus};

use crate::client::{WaClientError, WaDisconnect, WaSessionClient, WaSessionClientFactory};

/// Reconnect attempts before a transient disconnect is treated as fatal.
const MAX_RECONNECT_ATTEMPTS: u32 = 6;
/// Backoff doubles from this floor up to a one-minute ceiling.
const BACKOFF_FLOOR: Duration = Duration::from_secs(1);
const BACKOFF_CEILING: Duration = Duration::from_secs(60);

pub struct WhatsAppSessionWorker {
    bot_id: String,
    credentials_dir: PathBuf,
    client: Arc<Mutex<Box<dyn WaSessionClient>>>,
    sink: Arc<dyn SessionEventSink>,
    status: Arc<Mutex<SessionStatus>>,
    shutdown: Option<watch::Sender<bool>>,
}

impl WhatsAppSessionWorker {
    #[must_use]
    pub fn new(
        bot_id: impl Into<String>,
        credentials_dir: PathBuf,
        client: Box<dyn WaSessionClient>,
        sink: Arc<dyn SessionEventSink>,
    ) -> Self {
        Self {
            bot_id: bot_id.into(),
            credentials_dir,
            client: Arc::new(Mutex::new(client)),
            sink,
            status: Arc::new(Mutex::new(SessionStatus::Offline)),
            shutdown: None,
        }
    }

    async fn set_status(&self, status: SessionStatus) {
        *self.status.lock().await = status;
        self.sink
            .emit(SessionEvent::StatusChanged {
                bot_id: self.bot_id.clone(),
                status,
            })
            .await;
    }
}

#[async_trait]
impl wafleet_session::SessionWorker for WhatsAppSessionWorker {
    async fn start(&mut self) -> wafleet_session::Result<()> {
        self.set_status(SessionStatus::Loading).await;

        {
            let mut client = self.client.lock().await;
            client
                .connect(&self.credentials_dir)
                .await
                .map_err(|e| wafleet_session::Error::external("whatsapp connect", e))?;
        }
        self.set_status(SessionStatus::Online).await;

        let (tx, mut rx) = watch::channel(false);
        self.shutdown = Some(tx);

        let client = Arc::clone(&self.client);
        let sink = Arc::clone(&self.sink);
        let status = Arc::clone(&self.status);
        let bot_id = self.bot_id.clone();

        tokio::spawn(async move {
            let mut attempt: u32 = 0;
            loop {
                let disconnect = tokio::select! {
                    _ = rx.changed() => return,
                    d = async {
                        let mut client = client.lock().await;
                        client.poll_disconnect().await
                    } => d,
                };

                let Some(reason) = disconnect else {
                    continue;
                };

                match reason {
                    WaDisconnect::CredentialsRevoked => {
                        warn!(bot_id, "whatsapp credentials revoked, not reconnecting");
                        *status.lock().await = SessionStatus::Error;
                        sink.emit(SessionEvent::StatusChanged {
                            bot_id: bot_id.clone(),
                            status: SessionStatus::Error,
                        })
                        .await;
                        sink.emit(SessionEvent::Disconnected {
                            bot_id: bot_id.clone(),
                            reason: DisconnectReason::CredentialsRevoked,
                        })
                        .await;
                        return;
                    },
                    WaDisconnect::Transient(detail) => {
                        attempt += 1;
                        sink.emit(SessionEvent::Disconnected {
                            bot_id: bot_id.clone(),
                            reason: DisconnectReason::Transient(detail.clone()),
                        })
                        .await;

                        if attempt > MAX_RECONNECT_ATTEMPTS {
                            warn!(bot_id, attempts = attempt, "reconnect budget exhausted");
                            *status.lock().await = SessionStatus::Error;
                            sink.emit(SessionEvent::StatusChanged {
                                bot_id: bot_id.clone(),
                                status: SessionStatus::Error,
                            })
                            .await;
                            return;
                        }

                        let backoff = (BACKOFF_FLOOR * 2u32.saturating_pow(attempt - 1))
                            .min(BACKOFF_CEILING);
                        info!(bot_id, attempt, ?backoff, "reconnecting after transient disconnect");
                        tokio::time::sleep(backoff).await;
                    },
                }
            }
        });

        Ok(())
    }

    async fn stop(&mut self, preserve_credentials: bool) -> wafleet_session::Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(true);
        }
        let mut client = self.client.lock().await;
        client.disconnect(!preserve_credentials).await;
        drop(client);
        self.set_status(SessionStatus::Offline).await;
        Ok(())
    }

    async fn send_direct_message(&self, jid: &str, text: &str) -> wafleet_session::Result<()> {
        if *self.status.lock().await != SessionStatus::Online {
            return Err(wafleet_session::Error::NotOnline);
        }
        let mut client = self.client.lock().await;
        client
            .send_text(jid, text)
            .await
            .map_err(map_send_err)?;
        drop(client);
        self.sink
            .emit(SessionEvent::MessageSent {
                bot_id: self.bot_id.clone(),
            })
            .await;
        Ok(())
    }

    fn status(&self) -> SessionStatus {
        self.status.try_lock().map(|s| *s).unwrap_or(SessionStatus::Loading)
    }
}

fn map_send_err(e: WaClientError) -> wafleet_session::Error {
    wafleet_session::Error::external("whatsapp send", e)
}

/// Adapts a [`WaSessionClientFactory`] into the [`wafleet_session::SessionWorkerFactory`]
/// contract the Supervisor drives.
pub struct WhatsAppWorkerFactory {
    client_factory: Arc<dyn WaSessionClientFactory>,
}

impl WhatsAppWorkerFactory {
    #[must_use]
    pub fn new(client_factory: Arc<dyn WaSessionClientFactory>) -> Self {
        Self { client_factory }
    }
}

impl wafleet_session::SessionWorkerFactory for WhatsAppWorkerFactory {
    fn build(
        &self,
        bot_id: &str,
        credentials_dir: &std::path::Path,
        sink: Arc<dyn SessionEventSink>,
    ) -> Box<dyn wafleet_session::SessionWorker> {
        let client = self.client_factory.build();
        Box::new(WhatsAppSessionWorker::new(
            bot_id,
            credentials_dir.to_path_buf(),
            client,
            sink,
        ))
    }
}
