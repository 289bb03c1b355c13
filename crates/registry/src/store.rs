//! Tenancy-scoped CRUD over the registry tables plus the handful of
//! explicitly cross-tenancy operations (`get_bot_on_server`,
//! `update_bot_on_server`, `create_cross_tenancy_activity`) that trusted
//! callers — the RPC layer — may invoke with a target tenancy other than
//! their own.

use sqlx::SqlitePool;
use wafleet_common::ids::new_id;

use crate::error::{Context, Error, Result};
use crate::models::{
    Activity, ApprovalStatus, BotInstance, BotStatus, Capacity, Command, GlobalRegistration,
    NewBotFields, PromotionalOfferConfig, RegistrationOutcome, Server,
};

pub async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[derive(Clone)]
pub struct RegistryStore {
    pool: SqlitePool,
}

impl RegistryStore {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ── Server catalog ──────────────────────────────────────────────────

    pub async fn upsert_server(&self, server: &Server) -> Result<()> {
        sqlx::query(
            "INSERT INTO servers (name, max_bot_count, current_bot_count, status, description, url, shared_secret)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(name) DO UPDATE SET
               max_bot_count = excluded.max_bot_count,
               status = excluded.status,
               description = excluded.description,
               url = excluded.url,
               shared_secret = excluded.shared_secret",
        )
        .bind(&server.name)
        .bind(server.max_bot_count)
        .bind(server.current_bot_count)
        .bind(&server.status)
        .bind(&server.description)
        .bind(&server.url)
        .bind(&server.shared_secret)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_server(&self, tenancy: &str) -> Result<Option<Server>> {
        let row = sqlx::query_as::<_, Server>("SELECT * FROM servers WHERE name = ?")
            .bind(tenancy)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn list_servers(&self) -> Result<Vec<Server>> {
        let rows = sqlx::query_as::<_, Server>("SELECT * FROM servers ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Capacity probe. Read-only: reports the Server row's declared max
    /// alongside the live count of non-deleted bots on that tenancy.
    pub async fn check_capacity(&self, tenancy: &str) -> Result<Capacity> {
        let server = self
            .get_server(tenancy)
            .await?
            .ok_or_else(|| Error::ServerNotFound(tenancy.to_string()))?;
        let current: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM bot_instances WHERE server_name = ?")
                .bind(tenancy)
                .fetch_one(&self.pool)
                .await?;
        Ok(Capacity {
            can_add: current < server.max_bot_count,
            current,
            max: server.max_bot_count,
        })
    }

    // ── Registration ────────────────────────────────────────────────────

    pub async fn find_global_registration(
        &self,
        phone: &str,
    ) -> Result<Option<GlobalRegistration>> {
        let row = sqlx::query_as::<_, GlobalRegistration>(
            "SELECT * FROM global_registrations WHERE phone_number = ?",
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Performs, in one transaction: verify no prior global registration for
    /// `phone`, verify target capacity, insert the `BotInstance`, insert the
    /// `GlobalRegistration`, increment `Server.current_bot_count`. On any
    /// failure no rows persist.
    pub async fn create_cross_server_registration(
        &self,
        phone: &str,
        target_tenancy: &str,
        fields: NewBotFields,
    ) -> Result<RegistrationOutcome> {
        let mut tx = self.pool.begin().await?;

        if let Some(existing) = sqlx::query_as::<_, GlobalRegistration>(
            "SELECT * FROM global_registrations WHERE phone_number = ?",
        )
        .bind(phone)
        .fetch_optional(&mut *tx)
        .await?
        {
            tx.rollback().await?;
            return Ok(RegistrationOutcome::AlreadyRegisteredTo(
                existing.tenancy_name,
            ));
        }

        let server = sqlx::query_as::<_, Server>("SELECT * FROM servers WHERE name = ?")
            .bind(target_tenancy)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| Error::ServerNotFound(target_tenancy.to_string()))?;

        if server.current_bot_count >= server.max_bot_count {
            tx.rollback().await?;
            return Ok(RegistrationOutcome::CapacityFull);
        }

        let id = new_id();
        let approval_status = ApprovalStatus::Pending;
        let status = if fields.credential_verified {
            BotStatus::Dormant
        } else {
            BotStatus::Loading
        };

        sqlx::query(
            "INSERT INTO bot_instances
               (id, name, phone_number, server_name, credentials, status, approval_status,
                credential_verified, auto_start, is_guest)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&fields.name)
        .bind(phone)
        .bind(target_tenancy)
        .bind(&fields.credentials)
        .bind(status)
        .bind(approval_status)
        .bind(fields.credential_verified)
        .bind(fields.auto_start)
        .bind(fields.is_guest)
        .execute(&mut *tx)
        .await
        .context("insert bot_instances row")?;

        sqlx::query(
            "INSERT INTO global_registrations (phone_number, tenancy_name) VALUES (?, ?)",
        )
        .bind(phone)
        .bind(target_tenancy)
        .execute(&mut *tx)
        .await
        .context("insert global_registrations row")?;

        sqlx::query("UPDATE servers SET current_bot_count = current_bot_count + 1 WHERE name = ?")
            .bind(target_tenancy)
            .execute(&mut *tx)
            .await
            .context("increment server bot count")?;

        let bot = sqlx::query_as::<_, BotInstance>("SELECT * FROM bot_instances WHERE id = ?")
            .bind(&id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(RegistrationOutcome::Success(bot))
    }

    /// Deletes the `BotInstance` and `GlobalRegistration` and decrements the
    /// server count. Idempotent: missing rows are not an error.
    pub async fn rollback_cross_server_registration(
        &self,
        phone: &str,
        bot_id: &str,
        tenancy: &str,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query(
            "DELETE FROM bot_instances WHERE id = ? AND server_name = ?",
        )
        .bind(bot_id)
        .bind(tenancy)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query("DELETE FROM global_registrations WHERE phone_number = ? AND tenancy_name = ?")
            .bind(phone)
            .bind(tenancy)
            .execute(&mut *tx)
            .await?;

        if deleted > 0 {
            sqlx::query(
                "UPDATE servers SET current_bot_count = MAX(current_bot_count - 1, 0) WHERE name = ?",
            )
            .bind(tenancy)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    // ── Bot CRUD ─────────────────────────────────────────────────────────

    pub async fn get_bot(&self, tenancy: &str, bot_id: &str) -> Result<Option<BotInstance>> {
        let row = sqlx::query_as::<_, BotInstance>(
            "SELECT * FROM bot_instances WHERE id = ? AND server_name = ?",
        )
        .bind(bot_id)
        .bind(tenancy)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Cross-tenancy read. Callers must be trusted (the RPC layer) since no
    /// tenancy scoping is implied by the caller's own identity.
    pub async fn get_bot_on_server(
        &self,
        target_tenancy: &str,
        bot_id: &str,
    ) -> Result<Option<BotInstance>> {
        self.get_bot(target_tenancy, bot_id).await
    }

    pub async fn find_bot_by_phone(&self, tenancy: &str, phone: &str) -> Result<Option<BotInstance>> {
        let row = sqlx::query_as::<_, BotInstance>(
            "SELECT * FROM bot_instances WHERE phone_number = ? AND server_name = ?",
        )
        .bind(phone)
        .bind(tenancy)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list_bots(&self, tenancy: &str) -> Result<Vec<BotInstance>> {
        let rows = sqlx::query_as::<_, BotInstance>(
            "SELECT * FROM bot_instances WHERE server_name = ? ORDER BY created_at",
        )
        .bind(tenancy)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Bots eligible for resume-on-startup: approved, and either credential
    /// verified or carrying no credentials at all.
    pub async fn list_resumable_bots(&self, tenancy: &str) -> Result<Vec<BotInstance>> {
        let rows = sqlx::query_as::<_, BotInstance>(
            "SELECT * FROM bot_instances
             WHERE server_name = ? AND approval_status = 'approved'
               AND (credential_verified = 1 OR credentials IS NULL)
             ORDER BY created_at",
        )
        .bind(tenancy)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn set_bot_status(&self, tenancy: &str, bot_id: &str, status: BotStatus) -> Result<()> {
        sqlx::query(
            "UPDATE bot_instances SET status = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
             WHERE id = ? AND server_name = ?",
        )
        .bind(status)
        .bind(bot_id)
        .bind(tenancy)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_invalid_reason(
        &self,
        tenancy: &str,
        bot_id: &str,
        reason: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE bot_instances SET invalid_reason = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
             WHERE id = ? AND server_name = ?",
        )
        .bind(reason)
        .bind(bot_id)
        .bind(tenancy)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_approval(
        &self,
        tenancy: &str,
        bot_id: &str,
        status: ApprovalStatus,
        expiration_months: Option<i64>,
    ) -> Result<()> {
        let approval_date = matches!(status, ApprovalStatus::Approved)
            .then(|| chrono::Utc::now().to_rfc3339());
        sqlx::query(
            "UPDATE bot_instances
             SET approval_status = ?, approval_date = ?, expiration_months = ?,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
             WHERE id = ? AND server_name = ?",
        )
        .bind(status)
        .bind(approval_date)
        .bind(expiration_months)
        .bind(bot_id)
        .bind(tenancy)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Updates a row on a tenancy other than the caller's own. Restricted to
    /// trusted callers (direct-DB cross-tenancy plane, signed RPC).
    pub async fn update_bot_on_server(
        &self,
        target_tenancy: &str,
        bot_id: &str,
        credentials: Option<&str>,
        credential_verified: bool,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE bot_instances
             SET credentials = ?, credential_verified = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
             WHERE id = ? AND server_name = ?",
        )
        .bind(credentials)
        .bind(credential_verified)
        .bind(bot_id)
        .bind(target_tenancy)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn increment_message_count(&self, tenancy: &str, bot_id: &str) -> Result<()> {
        sqlx::query(
            "UPDATE bot_instances
             SET messages_count = messages_count + 1,
                 last_activity = strftime('%Y-%m-%dT%H:%M:%fZ', 'now'),
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
             WHERE id = ? AND server_name = ?",
        )
        .bind(bot_id)
        .bind(tenancy)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Moves a bot between tenancy scopes. Caller is responsible for the
    /// capacity check and `GlobalRegistration` update; this only moves the
    /// `server_name` label and both servers' counts within one transaction.
    pub async fn move_bot_between_tenancies(
        &self,
        bot_id: &str,
        source: &str,
        target: &str,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let moved = sqlx::query(
            "UPDATE bot_instances SET server_name = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
             WHERE id = ? AND server_name = ?",
        )
        .bind(target)
        .bind(bot_id)
        .bind(source)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if moved == 0 {
            tx.rollback().await?;
            return Err(Error::BotNotFound(bot_id.to_string()));
        }

        sqlx::query("UPDATE servers SET current_bot_count = MAX(current_bot_count - 1, 0) WHERE name = ?")
            .bind(source)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE servers SET current_bot_count = current_bot_count + 1 WHERE name = ?")
            .bind(target)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE global_registrations SET tenancy_name = ? WHERE phone_number = (SELECT phone_number FROM bot_instances WHERE id = ?)")
            .bind(target)
            .bind(bot_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Removes related Activities and Commands linked to the bot, then the
    /// `BotInstance` row, then decrements the server count.
    pub async fn delete_bot_cascade(&self, tenancy: &str, bot_id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM activities WHERE bot_instance_id = ?")
            .bind(bot_id)
            .execute(&mut *tx)
            .await?;

        let bot = sqlx::query_as::<_, BotInstance>(
            "SELECT * FROM bot_instances WHERE id = ? AND server_name = ?",
        )
        .bind(bot_id)
        .bind(tenancy)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(bot) = bot else {
            tx.rollback().await?;
            return Ok(());
        };

        sqlx::query("DELETE FROM global_registrations WHERE phone_number = ? AND tenancy_name = ?")
            .bind(&bot.phone_number)
            .bind(tenancy)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM bot_instances WHERE id = ? AND server_name = ?")
            .bind(bot_id)
            .bind(tenancy)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE servers SET current_bot_count = MAX(current_bot_count - 1, 0) WHERE name = ?")
            .bind(tenancy)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    // ── Activity log ─────────────────────────────────────────────────────

    pub async fn log_activity(
        &self,
        tenancy: &str,
        activity_type: &str,
        description: &str,
        bot_instance_id: Option<&str>,
        metadata: Option<&serde_json::Value>,
    ) -> Result<()> {
        let metadata = metadata.map(serde_json::Value::to_string);
        sqlx::query(
            "INSERT INTO activities (id, activity_type, description, metadata, tenancy, bot_instance_id)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(new_id())
        .bind(activity_type)
        .bind(description)
        .bind(metadata)
        .bind(tenancy)
        .bind(bot_instance_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Logs an activity on the target tenancy naming the source tenancy.
    /// Every cross-tenancy RPC handler must call this on success.
    pub async fn create_cross_tenancy_activity(
        &self,
        target_tenancy: &str,
        source_tenancy: &str,
        activity_type: &str,
        description: &str,
        bot_instance_id: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO activities (id, activity_type, description, tenancy, bot_instance_id, remote_tenancy)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(new_id())
        .bind(activity_type)
        .bind(description)
        .bind(target_tenancy)
        .bind(bot_instance_id)
        .bind(source_tenancy)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_activities(&self, tenancy: &str, limit: i64) -> Result<Vec<Activity>> {
        let rows = sqlx::query_as::<_, Activity>(
            "SELECT * FROM activities WHERE tenancy = ? ORDER BY created_at DESC LIMIT ?",
        )
        .bind(tenancy)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ── Commands ─────────────────────────────────────────────────────────

    pub async fn list_commands(&self, tenancy: &str) -> Result<Vec<Command>> {
        let rows = sqlx::query_as::<_, Command>(
            "SELECT * FROM commands WHERE tenancy = ? ORDER BY name",
        )
        .bind(tenancy)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ── Promotional offer ────────────────────────────────────────────────

    pub async fn get_offer_config(&self, tenancy: &str) -> Result<Option<PromotionalOfferConfig>> {
        let row = sqlx::query_as::<_, PromotionalOfferConfig>(
            "SELECT * FROM promotional_offer_configs WHERE tenancy = ?",
        )
        .bind(tenancy)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn set_offer_config(&self, config: &PromotionalOfferConfig) -> Result<()> {
        sqlx::query(
            "INSERT INTO promotional_offer_configs (tenancy, is_active, start_date, duration_type, duration_value)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(tenancy) DO UPDATE SET
                 is_active = excluded.is_active,
                 start_date = excluded.start_date,
                 duration_type = excluded.duration_type,
                 duration_value = excluded.duration_value",
        )
        .bind(&config.tenancy)
        .bind(config.is_active)
        .bind(&config.start_date)
        .bind(&config.duration_type)
        .bind(config.duration_value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    async fn seed_server(store: &RegistryStore, name: &str, max: i64) {
        store
            .upsert_server(&Server {
                name: name.to_string(),
                max_bot_count: max,
                current_bot_count: 0,
                status: "active".into(),
                description: None,
                url: None,
                shared_secret: Some("s3cret".into()),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn check_capacity_reports_free_slots() {
        let store = RegistryStore::new(test_pool().await);
        seed_server(&store, "Server1", 10).await;
        let cap = store.check_capacity("Server1").await.unwrap();
        assert!(cap.can_add);
        assert_eq!(cap.current, 0);
        assert_eq!(cap.max, 10);
    }

    #[tokio::test]
    async fn registration_is_atomic_and_visible() {
        let store = RegistryStore::new(test_pool().await);
        seed_server(&store, "Server1", 10).await;

        let outcome = store
            .create_cross_server_registration(
                "254700000001",
                "Server1",
                NewBotFields {
                    name: "Bot1".into(),
                    credentials: None,
                    credential_verified: false,
                    is_guest: false,
                    auto_start: false,
                },
            )
            .await
            .unwrap();

        let bot = match outcome {
            RegistrationOutcome::Success(bot) => bot,
            other => panic!("expected success, got {other:?}"),
        };

        let reg = store.find_global_registration("254700000001").await.unwrap();
        assert_eq!(reg.unwrap().tenancy_name, "Server1");
        let cap = store.check_capacity("Server1").await.unwrap();
        assert_eq!(cap.current, 1);
        assert_eq!(bot.server_name, "Server1");
    }

    #[tokio::test]
    async fn duplicate_phone_is_rejected_with_no_new_rows() {
        let store = RegistryStore::new(test_pool().await);
        seed_server(&store, "Server1", 10).await;
        seed_server(&store, "Server2", 10).await;

        store
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

        let outcome = store
            .create_cross_server_registration(
                "254700000001",
                "Server2",
                NewBotFields {
                    name: "Bot2".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        match outcome {
            RegistrationOutcome::AlreadyRegisteredTo(t) => assert_eq!(t, "Server1"),
            other => panic!("expected AlreadyRegisteredTo, got {other:?}"),
        }
        let cap2 = store.check_capacity("Server2").await.unwrap();
        assert_eq!(cap2.current, 0);
    }

    #[tokio::test]
    async fn full_server_rejects_registration() {
        let store = RegistryStore::new(test_pool().await);
        seed_server(&store, "Server1", 1).await;
        store
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

        let outcome = store
            .create_cross_server_registration(
                "254700000002",
                "Server1",
                NewBotFields {
                    name: "Bot2".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(matches!(outcome, RegistrationOutcome::CapacityFull));
    }

    #[tokio::test]
    async fn rollback_restores_pre_registration_state() {
        let store = RegistryStore::new(test_pool().await);
        seed_server(&store, "Server1", 10).await;

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
            other => panic!("expected success, got {other:?}"),
        };

        store
            .rollback_cross_server_registration("254700000001", &bot.id, "Server1")
            .await
            .unwrap();

        assert!(
            store
                .find_global_registration("254700000001")
                .await
                .unwrap()
                .is_none()
        );
        let cap = store.check_capacity("Server1").await.unwrap();
        assert_eq!(cap.current, 0);
    }

    #[tokio::test]
    async fn cascade_delete_removes_bot_registration_and_activities() {
        let store = RegistryStore::new(test_pool().await);
        seed_server(&store, "Server1", 10).await;

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
            other => panic!("expected success, got {other:?}"),
        };

        store
            .log_activity("Server1", "note", "test note", Some(&bot.id), None)
            .await
            .unwrap();

        store.delete_bot_cascade("Server1", &bot.id).await.unwrap();

        assert!(store.get_bot("Server1", &bot.id).await.unwrap().is_none());
        assert!(
            store
                .find_global_registration("254700000001")
                .await
                .unwrap()
                .is_none()
        );
        assert!(store.list_activities("Server1", 10).await.unwrap().is_empty());
        let cap = store.check_capacity("Server1").await.unwrap();
        assert_eq!(cap.current, 0);
    }

    #[tokio::test]
    async fn migrate_bot_moves_ownership_and_counts() {
        let store = RegistryStore::new(test_pool().await);
        seed_server(&store, "Server1", 10).await;
        seed_server(&store, "Server2", 10).await;

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
            other => panic!("expected success, got {other:?}"),
        };

        store
            .move_bot_between_tenancies(&bot.id, "Server1", "Server2")
            .await
            .unwrap();

        assert!(store.get_bot("Server1", &bot.id).await.unwrap().is_none());
        assert!(store.get_bot("Server2", &bot.id).await.unwrap().is_some());
        assert_eq!(store.check_capacity("Server1").await.unwrap().current, 0);
        assert_eq!(store.check_capacity("Server2").await.unwrap().current, 1);
        let reg = store.find_global_registration("254700000001").await.unwrap();
        assert_eq!(reg.unwrap().tenancy_name, "Server2");
    }

    #[tokio::test]
    async fn find_bot_by_phone_scopes_to_tenancy() {
        let store = RegistryStore::new(test_pool().await);
        seed_server(&store, "Server1", 10).await;
        seed_server(&store, "Server2", 10).await;

        store
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

        assert!(store.find_bot_by_phone("Server1", "254700000001").await.unwrap().is_some());
        assert!(store.find_bot_by_phone("Server2", "254700000001").await.unwrap().is_none());
    }
}
