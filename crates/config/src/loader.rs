use std::path::{Path, PathBuf};

use secrecy::Secret;
use tracing::{debug, warn};

use crate::{
    env_subst::substitute_env,
    schema::{Secrets, TenancyConfig},
};

const CONFIG_FILENAMES: &[&str] = &["wafleet.toml", "wafleet.yaml", "wafleet.yml", "wafleet.json"];

/// Load config from the given path (any supported format), with `${VAR}`
/// substitution applied to the raw text first.
pub fn load_config(path: &Path) -> anyhow::Result<TenancyConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover a config file in standard locations, load it (or fall back to
/// defaults), then apply environment variable overrides. This is the
/// entrypoint the `cli` binary calls at startup.
pub fn discover_and_load() -> TenancyConfig {
    let mut cfg = if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                TenancyConfig::default()
            },
        }
    } else {
        debug!("no config file found, using defaults");
        TenancyConfig::default()
    };
    apply_env_overrides(&mut cfg);
    cfg
}

/// Apply the §6.4 environment variables on top of a loaded config. Env
/// always wins over file values — this is the only override direction the
/// specification allows.
pub fn apply_env_overrides(cfg: &mut TenancyConfig) {
    if let Ok(v) = std::env::var("BOTCOUNT")
        && let Ok(n) = v.parse::<u32>()
    {
        cfg.bot_count = n;
    }
    // RUNTIME_SERVER_NAME takes precedence over SERVER_NAME, which in turn
    // takes precedence over whatever was loaded from the config file.
    if let Ok(v) = std::env::var("SERVER_NAME") {
        cfg.server_name = Some(v);
    }
    if let Ok(v) = std::env::var("RUNTIME_SERVER_NAME") {
        cfg.server_name = Some(v);
    }
    if let Ok(v) = std::env::var("BIND") {
        cfg.bind = v;
    }
    if let Ok(v) = std::env::var("PORT")
        && let Ok(p) = v.parse::<u16>()
    {
        cfg.port = p;
    }
}

/// Load the environment-only secrets. Fails loudly (unlike `TenancyConfig`
/// loading) because a tenancy with no admin secret or database URL cannot
/// safely start.
pub fn load_secrets() -> anyhow::Result<Secrets> {
    Ok(Secrets {
        admin_jwt_secret: Secret::new(require_env("ADMIN_JWT_SECRET")?),
        guest_token_secret: Secret::new(require_env("GUEST_TOKEN_SECRET")?),
        credential_vault_passphrase: Secret::new(require_env("CREDENTIAL_VAULT_PASSPHRASE")?),
        admin_username: require_env("ADMIN_USERNAME")?,
        admin_password_hash: Secret::new(require_env("ADMIN_PASSWORD_HASH")?),
        database_url: std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://wafleet.db".into()),
    })
}

fn require_env(name: &str) -> anyhow::Result<String> {
    std::env::var(name).map_err(|_| anyhow::anyhow!("required environment variable {name} is not set"))
}

fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }
    if let Some(dirs) = directories::ProjectDirs::from("", "", "wafleet") {
        let config_dir = dirs.config_dir();
        for name in CONFIG_FILENAMES {
            let p = config_dir.join(name);
            if p.exists() {
                return Some(p);
            }
        }
    }
    None
}

/// Returns the user-global config directory (`~/.config/wafleet/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "wafleet").map(|d| d.config_dir().to_path_buf())
}

/// Returns the path of an existing config file, or the default TOML path.
pub fn find_or_default_config_path() -> PathBuf {
    if let Some(path) = find_config_file() {
        return path;
    }
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wafleet.toml")
}

/// Serialize `config` to TOML and write it to the user-global config path.
pub fn save_config(config: &TenancyConfig) -> anyhow::Result<PathBuf> {
    let path = find_or_default_config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("serialize config: {e}"))?;
    std::fs::write(&path, toml_str)?;
    debug!(path = %path.display(), "saved config");
    Ok(path)
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<TenancyConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_win_over_file_values() {
        let mut cfg = TenancyConfig {
            server_name: Some("FromFile".into()),
            bot_count: 10,
            ..Default::default()
        };
        // SAFETY: single-threaded test, restored immediately below.
        unsafe { std::env::set_var("BOTCOUNT", "25") };
        unsafe { std::env::set_var("SERVER_NAME", "FromEnv") };
        apply_env_overrides(&mut cfg);
        unsafe { std::env::remove_var("BOTCOUNT") };
        unsafe { std::env::remove_var("SERVER_NAME") };

        assert_eq!(cfg.bot_count, 25);
        assert_eq!(cfg.server_name.as_deref(), Some("FromEnv"));
    }

    #[test]
    fn default_bot_count_is_ten() {
        assert_eq!(TenancyConfig::default().bot_count, 10);
    }
}
