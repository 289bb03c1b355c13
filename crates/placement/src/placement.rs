//! Placement Engine (C5): resolves the canonical tenancy for a phone
//! number, checks capacity, and invokes the atomic cross-server
//! registration; also performs bot migration between tenancies.

use wafleet_registry::{NewBotFields, RegistryStore};

use crate::error::{Error, Result};

#[derive(Debug)]
pub enum PlacementOutcome {
    /// Registered locally: `canonical_tenancy == current_tenancy`.
    Registered(wafleet_registry::BotInstance),
    /// Registered, but on a tenancy other than the caller's own — the
    /// caller must surface this to the end user.
    RegisteredElsewhere {
        bot: wafleet_registry::BotInstance,
        tenancy: String,
    },
}

pub struct PlacementEngine {
    registry: RegistryStore,
}

impl PlacementEngine {
    #[must_use]
    pub fn new(registry: RegistryStore) -> Self {
        Self { registry }
    }

    /// If the phone is already globally registered, that tenancy is
    /// canonical regardless of what the caller requested. Otherwise an
    /// explicit `selected_server` wins (when the caller is allowed to
    /// pick), falling back to `current_tenancy`.
    pub async fn resolve_canonical_tenancy(
        &self,
        phone: &str,
        selected_server: Option<&str>,
        caller_may_select: bool,
        current_tenancy: &str,
    ) -> Result<String> {
        if let Some(existing) = self.registry.find_global_registration(phone).await? {
            return Ok(existing.tenancy_name);
        }
        if caller_may_select
            && let Some(selected) = selected_server
        {
            return Ok(selected.to_string());
        }
        Ok(current_tenancy.to_string())
    }

    /// Places a new registration. If the canonical tenancy is full and the
    /// caller did not explicitly choose it, falls back to the tenancy in
    /// the catalog with the most free slots; fails `AllFull` if none have
    /// capacity.
    pub async fn place(
        &self,
        phone: &str,
        selected_server: Option<&str>,
        caller_may_select: bool,
        current_tenancy: &str,
        fields: NewBotFields,
    ) -> Result<PlacementOutcome> {
        let mut target = self
            .resolve_canonical_tenancy(phone, selected_server, caller_may_select, current_tenancy)
            .await?;

        let capacity = self.registry.check_capacity(&target).await?;
        if !capacity.can_add && selected_server.is_none() {
            target = self.pick_tenancy_with_most_free_slots().await?;
        }

        match self
            .registry
            .create_cross_server_registration(phone, &target, fields)
            .await?
        {
            wafleet_registry::RegistrationOutcome::Success(bot) => {
                if target == current_tenancy {
                    Ok(PlacementOutcome::Registered(bot))
                } else {
                    Ok(PlacementOutcome::RegisteredElsewhere { bot, tenancy: target })
                }
            },
            wafleet_registry::RegistrationOutcome::AlreadyRegisteredTo(tenancy) => {
                Err(Error::RegisteredElsewhere {
                    phone: phone.to_string(),
                    tenancy,
                })
            },
            wafleet_registry::RegistrationOutcome::CapacityFull => Err(Error::AllFull),
        }
    }

    async fn pick_tenancy_with_most_free_slots(&self) -> Result<String> {
        let servers = self.registry.list_servers().await?;
        servers
            .into_iter()
            .filter(|s| s.max_bot_count > s.current_bot_count)
            .max_by_key(|s| s.max_bot_count - s.current_bot_count)
            .map(|s| s.name)
            .ok_or(Error::AllFull)
    }

    /// Moves a bot to `target`, requiring capacity there first. Leaves the
    /// phone globally unique and pointing at `target` on success; on
    /// failure the row is left untouched.
    pub async fn migrate_bot(&self, bot_id: &str, source: &str, target: &str) -> Result<()> {
        let capacity = self.registry.check_capacity(target).await?;
        if !capacity.can_add {
            return Err(Error::AllFull);
        }
        self.registry.move_bot_between_tenancies(bot_id, source, target).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use wafleet_registry::Server;

    use super::*;

    async fn test_store() -> RegistryStore {
        let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
        wafleet_registry::run_migrations(&pool).await.unwrap();
        RegistryStore::new(pool)
    }

    async fn seed(store: &RegistryStore, name: &str, max: i64) {
        store
            .upsert_server(&Server {
                name: name.to_string(),
                max_bot_count: max,
                current_bot_count: 0,
                status: "active".into(),
                description: None,
                url: None,
                shared_secret: None,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn registers_locally_when_capacity_exists() {
        let store = test_store().await;
        seed(&store, "Server1", 10).await;
        let engine = PlacementEngine::new(store);

        let outcome = engine
            .place(
                "254700000001",
                None,
                false,
                "Server1",
                NewBotFields {
                    name: "Bot1".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(matches!(outcome, PlacementOutcome::Registered(_)));
    }

    #[tokio::test]
    async fn falls_back_to_most_free_tenancy_when_full() {
        let store = test_store().await;
        seed(&store, "Server1", 1).await;
        seed(&store, "Server2", 10).await;
        let engine = PlacementEngine::new(store.clone());

        engine
            .place(
                "254700000001",
                None,
                false,
                "Server1",
                NewBotFields {
                    name: "Bot1".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let outcome = engine
            .place(
                "254700000002",
                None,
                false,
                "Server1",
                NewBotFields {
                    name: "Bot2".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        match outcome {
            PlacementOutcome::RegisteredElsewhere { tenancy, .. } => assert_eq!(tenancy, "Server2"),
            other => panic!("{other:?}"),
        }
    }

    #[tokio::test]
    async fn migration_requires_target_capacity() {
        let store = test_store().await;
        seed(&store, "Server1", 10).await;
        seed(&store, "Server2", 1).await;
        let engine = PlacementEngine::new(store.clone());

        let bot = match engine
            .place(
                "254700000001",
                None,
                false,
                "Server1",
                NewBotFields {
                    name: "Bot1".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
        {
            PlacementOutcome::Registered(bot) => bot,
            other => panic!("{other:?}"),
        };

        let other = store
            .create_cross_server_registration(
                "254700000099",
                "Server2",
                NewBotFields {
                    name: "Filler".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(matches!(other, wafleet_registry::RegistrationOutcome::Success(_)));

        let result = engine.migrate_bot(&bot.id, "Server1", "Server2").await;
        assert!(matches!(result, Err(Error::AllFull)));
    }
}
