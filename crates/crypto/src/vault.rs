//! Encryption-at-rest for stored WhatsApp session credentials.
//!
//! A single DEK (Data Encryption Key) is generated once per tenancy and
//! wrapped with a KEK derived (Argon2id) from the `CREDENTIAL_VAULT_PASSPHRASE`
//! environment value. Unlike an interactively-unlocked password vault, this
//! vault unseals itself once at process startup from that env value — there
//! is no admin-facing unlock step, since bot credentials must be readable by
//! the Supervisor without a human in the loop.

use {base64::Engine, sqlx::SqlitePool, tokio::sync::RwLock, zeroize::Zeroizing};

use crate::{
    error::VaultError,
    kdf::{self, KdfParams},
    key_wrap,
    traits::Cipher,
    xchacha20::XChaCha20Poly1305Cipher,
};

/// Row from the `vault_metadata` table.
struct VaultRow {
    kdf_salt: String,
    kdf_params: String,
    wrapped_dek: String,
}

/// Encryption-at-rest vault for credential blobs.
///
/// Generic over [`Cipher`] but defaults to [`XChaCha20Poly1305Cipher`].
pub struct Vault<C: Cipher = XChaCha20Poly1305Cipher> {
    pool: SqlitePool,
    cipher: C,
    dek: RwLock<Option<Zeroizing<[u8; 32]>>>,
}

impl Vault<XChaCha20Poly1305Cipher> {
    pub async fn new(pool: SqlitePool) -> Result<Self, VaultError> {
        Self::with_cipher(pool, XChaCha20Poly1305Cipher).await
    }
}

impl<C: Cipher> Vault<C> {
    pub async fn with_cipher(pool: SqlitePool, cipher: C) -> Result<Self, VaultError> {
        Ok(Self {
            pool,
            cipher,
            dek: RwLock::new(None),
        })
    }

    /// Unseal (or initialize, if this is the first run) with the deployment's
    /// passphrase. Idempotent: calling twice with the right passphrase is a
    /// no-op after the first call.
    pub async fn unseal(&self, passphrase: &str) -> Result<(), VaultError> {
        match self.load_metadata().await? {
            None => self.initialize(passphrase).await,
            Some(row) => {
                let salt = kdf::decode_salt(&row.kdf_salt)?;
                let params: KdfParams = serde_json::from_str(&row.kdf_params)?;
                let kek = kdf::derive_key(passphrase.as_bytes(), &salt, &params)?;
                let dek = key_wrap::unwrap_dek(&self.cipher, &kek, &row.wrapped_dek)
                    .map_err(|_| VaultError::BadCredential)?;
                *self.dek.write().await = Some(dek);
                tracing::info!("credential vault unsealed");
                Ok(())
            },
        }
    }

    async fn initialize(&self, passphrase: &str) -> Result<(), VaultError> {
        let mut dek = Zeroizing::new([0u8; 32]);
        rand::RngCore::fill_bytes(&mut rand::rng(), dek.as_mut());

        let salt_b64 = kdf::generate_salt();
        let salt = kdf::decode_salt(&salt_b64)?;
        let params = KdfParams::default();
        let kek = kdf::derive_key(passphrase.as_bytes(), &salt, &params)?;
        let wrapped_dek = key_wrap::wrap_dek(&self.cipher, &kek, &dek)?;
        let params_json = serde_json::to_string(&params)?;

        sqlx::query(
            "INSERT INTO vault_metadata (id, kdf_salt, kdf_params, wrapped_dek) VALUES (1, ?, ?, ?)",
        )
        .bind(&salt_b64)
        .bind(&params_json)
        .bind(&wrapped_dek)
        .execute(&self.pool)
        .await?;

        *self.dek.write().await = Some(dek);
        tracing::info!("credential vault initialized");
        Ok(())
    }

    /// Encrypt a credential blob. `aad` should bind the ciphertext to its
    /// owner, e.g. `"bot:<bot_id>"`.
    pub async fn encrypt_string(&self, plaintext: &str, aad: &str) -> Result<String, VaultError> {
        let guard = self.dek.read().await;
        let dek = guard.as_ref().ok_or(VaultError::Sealed)?;

        let encrypted = self
            .cipher
            .encrypt(dek, plaintext.as_bytes(), aad.as_bytes())?;

        let mut blob = Vec::with_capacity(1 + encrypted.len());
        blob.push(self.cipher.version_tag());
        blob.extend_from_slice(&encrypted);
        Ok(base64::engine::general_purpose::STANDARD.encode(blob))
    }

    pub async fn decrypt_string(&self, b64: &str, aad: &str) -> Result<String, VaultError> {
        let guard = self.dek.read().await;
        let dek = guard.as_ref().ok_or(VaultError::Sealed)?;

        let blob = base64::engine::general_purpose::STANDARD.decode(b64)?;
        if blob.is_empty() {
            return Err(VaultError::CipherError("empty blob".to_string()));
        }

        let version = blob[0];
        if version != self.cipher.version_tag() {
            return Err(VaultError::CipherError(format!(
                "unsupported cipher version: {version:#04x}"
            )));
        }

        let plaintext = self.cipher.decrypt(dek, &blob[1..], aad.as_bytes())?;
        String::from_utf8(plaintext).map_err(|e| VaultError::CipherError(e.to_string()))
    }

    pub async fn is_unsealed(&self) -> bool {
        self.dek.read().await.is_some()
    }

    async fn load_metadata(&self) -> Result<Option<VaultRow>, VaultError> {
        let row: Option<(String, String, String)> = sqlx::query_as(
            "SELECT kdf_salt, kdf_params, wrapped_dek FROM vault_metadata WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(kdf_salt, kdf_params, wrapped_dek)| VaultRow {
            kdf_salt,
            kdf_params,
            wrapped_dek,
        }))
    }
}
