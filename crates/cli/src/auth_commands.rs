use anyhow::Result;
use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHasher, SaltString};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum AuthCommand {
    /// Hash an admin password for `ADMIN_PASSWORD_HASH`.
    HashPassword {
        /// Password to hash. Omit to be prompted.
        #[arg(long)]
        password: Option<String>,
    },
    /// Mint an admin bearer token against `ADMIN_JWT_SECRET`, for scripting.
    IssueToken {
        /// Operator name recorded in the token's subject claim.
        #[arg(long)]
        operator: String,
    },
}

pub async fn run(cmd: AuthCommand) -> Result<()> {
    match cmd {
        AuthCommand::HashPassword { password } => hash_password(password),
        AuthCommand::IssueToken { operator } => issue_token(&operator),
    }
}

fn hash_password(password: Option<String>) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => {
            print!("Password: ");
            std::io::Write::flush(&mut std::io::stdout())?;
            let mut line = String::new();
            std::io::stdin().read_line(&mut line)?;
            line.trim_end().to_string()
        },
    };
    println!("{}", hash_for(&password)?);
    Ok(())
}

fn hash_for(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))
}

fn issue_token(operator: &str) -> Result<()> {
    let secrets = wafleet_config::load_secrets()?;
    let secret = secrecy::ExposeSecret::expose_secret(&secrets.admin_jwt_secret);
    let token = wafleet_auth::issue_admin_token(operator, chrono::Utc::now(), secret)
        .map_err(|e| anyhow::anyhow!("failed to issue token: {e}"))?;
    println!("{token}");
    Ok(())
}
