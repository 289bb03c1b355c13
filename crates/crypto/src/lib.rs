//! Encryption-at-rest for stored WhatsApp session credentials.
//!
//! A random DEK (Data Encryption Key) is wrapped with a passphrase-derived
//! KEK via Argon2id. Trait-based [`Cipher`] design allows swapping the
//! encryption backend without touching the rest of the system.

pub mod error;
pub mod kdf;
pub mod key_wrap;
pub mod traits;
pub mod vault;
pub mod xchacha20;

pub use {
    error::VaultError,
    traits::Cipher,
    vault::Vault,
    xchacha20::XChaCha20Poly1305Cipher,
};

/// Run database migrations for the credential vault's metadata table.
pub async fn run_migrations(pool: &sqlx::SqlitePool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .set_ignore_missing(true)
        .run(pool)
        .await?;
    Ok(())
}
