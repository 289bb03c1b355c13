//! Bot Supervisor (C4): creates, starts, stops, restarts, and destroys
//! Session Workers for one tenancy; owns crash isolation, staggered resume,
//! the creation watchdog, and the realtime broadcaster.

pub mod error;
pub mod events;
pub mod supervisor;

pub use error::{Error, Result};
pub use events::{EventBroadcaster, NullBroadcaster, SupervisorEvent};
pub use supervisor::Supervisor;

#[cfg(test)]
mod tests {
    use std::{path::Path, sync::Arc};

    use async_trait::async_trait;
    use sqlx::SqlitePool;
    use wafleet_registry::{NewBotFields, RegistrationOutcome, RegistryStore, Server};
    use wafleet_session::{SessionEventSink, SessionStatus, SessionWorker, SessionWorkerFactory};

    use super::*;

    struct StubWorker {
        status: SessionStatus,
        sink: Arc<dyn SessionEventSink>,
        bot_id: String,
        fail: bool,
    }

    #[async_trait]
    impl SessionWorker for StubWorker {
        async fn start(&mut self) -> wafleet_session::Result<()> {
            if self.fail {
                return Err(wafleet_session::Error::invalid_input("scripted failure"));
            }
            self.status = SessionStatus::Online;
            self.sink
                .emit(wafleet_session::SessionEvent::StatusChanged {
                    bot_id: self.bot_id.clone(),
                    status: SessionStatus::Online,
                })
                .await;
            Ok(())
        }

        async fn stop(&mut self, _preserve_credentials: bool) -> wafleet_session::Result<()> {
            self.status = SessionStatus::Offline;
            Ok(())
        }

        async fn send_direct_message(&self, _jid: &str, _text: &str) -> wafleet_session::Result<()> {
            if self.status != SessionStatus::Online {
                return Err(wafleet_session::Error::NotOnline);
            }
            Ok(())
        }

        fn status(&self) -> SessionStatus {
            self.status
        }
    }

    struct StubFactory {
        fail: bool,
    }

    impl SessionWorkerFactory for StubFactory {
        fn build(
            &self,
            bot_id: &str,
            _credentials_dir: &Path,
            sink: Arc<dyn SessionEventSink>,
        ) -> Box<dyn SessionWorker> {
            Box::new(StubWorker {
                status: SessionStatus::Offline,
                sink,
                bot_id: bot_id.to_string(),
                fail: self.fail,
            })
        }
    }

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        wafleet_registry::run_migrations(&pool).await.unwrap();
        pool
    }

    async fn seeded_store(tenancy: &str) -> RegistryStore {
        let store = RegistryStore::new(test_pool().await);
        store
            .upsert_server(&Server {
                name: tenancy.to_string(),
                max_bot_count: 10,
                current_bot_count: 0,
                status: "active".into(),
                description: None,
                url: None,
                shared_secret: None,
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn start_bot_requires_approval() {
        let store = seeded_store("Server1").await;
        let outcome = store
            .create_cross_server_registration(
                "254700000001",
                "Server1",
                NewBotFields {
                    name: "Bot1".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let bot = match outcome {
            RegistrationOutcome::Success(bot) => bot,
            other => panic!("{other:?}"),
        };

        let supervisor = Arc::new(Supervisor::new(
            "Server1",
            store,
            Arc::new(StubFactory { fail: false }),
            Arc::new(NullBroadcaster),
            std::env::temp_dir().join("wafleet-test-creds"),
        ));

        let result = supervisor.start_bot(&bot.id).await;
        assert!(matches!(result, Err(Error::NotApproved(_))));
    }

    #[tokio::test]
    async fn approved_bot_starts_and_reports_online() {
        let store = seeded_store("Server1").await;
        let outcome = store
            .create_cross_server_registration(
                "254700000001",
                "Server1",
                NewBotFields {
                    name: "Bot1".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let bot = match outcome {
            RegistrationOutcome::Success(bot) => bot,
            other => panic!("{other:?}"),
        };
        store
            .set_approval("Server1", &bot.id, wafleet_registry::ApprovalStatus::Approved, Some(12))
            .await
            .unwrap();

        let supervisor = Arc::new(Supervisor::new(
            "Server1",
            store.clone(),
            Arc::new(StubFactory { fail: false }),
            Arc::new(NullBroadcaster),
            std::env::temp_dir().join("wafleet-test-creds"),
        ));

        supervisor.start_bot(&bot.id).await.unwrap();
        let statuses = supervisor.get_all_statuses().await;
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].1, SessionStatus::Online);

        let row = store.get_bot("Server1", &bot.id).await.unwrap().unwrap();
        assert_eq!(row.status, wafleet_registry::BotStatus::Online);
    }
}
