//! Configuration loading, validation, and env substitution.
//!
//! Config files: `wafleet.toml`, `wafleet.yaml`, or `wafleet.json`, searched
//! in `./` then `~/.config/wafleet/`. `${ENV_VAR}` substitution applies to
//! all string values. Environment variables always take precedence over
//! file values (§6.4 of the specification): `SERVER_NAME`, `BOTCOUNT`,
//! `RUNTIME_SERVER_NAME`, plus the database/admin/secret settings below.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{config_dir, discover_and_load, find_or_default_config_path, load_secrets, save_config},
    schema::{Secrets, TenancyConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
