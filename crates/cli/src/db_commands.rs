use clap::Subcommand;

#[derive(Subcommand)]
pub enum DbCommand {
    /// Run pending migrations, creating the database file if needed.
    Migrate,
    /// Delete all rows from every table but keep the schema.
    Clear,
    /// Delete the database file entirely (WAL/SHM siblings included).
    Reset,
}

const TABLES: &[&str] = &[
    "commands",
    "activities",
    "global_registrations",
    "bot_instances",
    "promotional_offer_configs",
    "servers",
];

pub async fn run(cmd: DbCommand) -> anyhow::Result<()> {
    match cmd {
        DbCommand::Migrate => migrate().await,
        DbCommand::Clear => clear().await,
        DbCommand::Reset => reset(),
    }
}

async fn migrate() -> anyhow::Result<()> {
    let secrets = wafleet_config::load_secrets()?;
    let pool = sqlx::SqlitePool::connect(&secrets.database_url).await?;
    wafleet_registry::run_migrations(&pool).await?;
    println!("Migrations applied.");
    Ok(())
}

async fn clear() -> anyhow::Result<()> {
    let secrets = wafleet_config::load_secrets()?;
    let pool = sqlx::SqlitePool::connect(&secrets.database_url).await?;
    for table in TABLES {
        sqlx::query(&format!("DELETE FROM {table}")).execute(&pool).await?;
    }
    println!("All tables cleared.");
    Ok(())
}

fn reset() -> anyhow::Result<()> {
    let secrets = wafleet_config::load_secrets()?;
    let Some(path) = sqlite_path(&secrets.database_url) else {
        anyhow::bail!("DATABASE_URL is not a sqlite:// URL; cannot reset");
    };
    let deleted = remove_sqlite_files(path)?;
    if deleted.is_empty() {
        println!("No database file found at {path}.");
    } else {
        for file in &deleted {
            println!("Deleted: {file}");
        }
        println!("Run `wafleet db migrate` to recreate the schema.");
    }
    Ok(())
}

fn sqlite_path(url: &str) -> Option<&str> {
    url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:"))
}

fn remove_sqlite_files(path: &str) -> anyhow::Result<Vec<String>> {
    let mut deleted = Vec::new();
    for suffix in ["", "-wal", "-shm"] {
        let file = format!("{path}{suffix}");
        if std::path::Path::new(&file).exists() {
            std::fs::remove_file(&file)?;
            deleted.push(file);
        }
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_path_strips_either_prefix() {
        assert_eq!(sqlite_path("sqlite:///tmp/wafleet.db"), Some("/tmp/wafleet.db"));
        assert_eq!(sqlite_path("sqlite:wafleet.db"), Some("wafleet.db"));
        assert_eq!(sqlite_path("postgres://localhost/db"), None);
    }

    #[test]
    fn remove_sqlite_files_deletes_db_and_wal_shm_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("wafleet.db");
        std::fs::write(&db, b"").unwrap();
        std::fs::write(format!("{}-wal", db.display()), b"").unwrap();

        let deleted = remove_sqlite_files(db.to_str().unwrap()).unwrap();

        assert_eq!(deleted.len(), 2);
        assert!(!db.exists());
    }

    #[test]
    fn remove_sqlite_files_is_a_noop_when_nothing_exists() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("missing.db");
        let deleted = remove_sqlite_files(db.to_str().unwrap()).unwrap();
        assert!(deleted.is_empty());
    }
}
