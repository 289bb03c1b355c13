mod auth_commands;
mod config_commands;
mod db_commands;
mod doctor_commands;

use std::sync::Arc;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use secrecy::ExposeSecret;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use wafleet_guestauth::{AlwaysOkProbe, GuestAuthCore};
use wafleet_lifecycle::LifecycleOrchestrator;
use wafleet_placement::PlacementEngine;
use wafleet_registry::RegistryStore;
use wafleet_supervisor::Supervisor;
use wafleet_whatsapp_worker::{WaClientError, WaDisconnect, WaSessionClient, WaSessionClientFactory, WhatsAppWorkerFactory};

#[derive(Parser)]
#[command(name = "wafleet", about = "Multi-tenant WhatsApp bot orchestration platform")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Address to bind to (overrides config value).
    #[arg(long, global = true)]
    bind: Option<String>,
    /// Port to listen on (overrides config value).
    #[arg(long, global = true)]
    port: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server for this tenancy (default when no subcommand given).
    Serve,
    /// Admin account and credential management.
    #[command(subcommand)]
    Auth(auth_commands::AuthCommand),
    /// Inspect or write tenancy configuration.
    #[command(subcommand)]
    Config(config_commands::ConfigCommand),
    /// Database migration and maintenance commands.
    #[command(subcommand)]
    Db(db_commands::DbCommand),
    /// Diagnose a tenancy's config, database, and secrets.
    Doctor,
}

fn init_telemetry(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry.with(fmt::layer().json().with_target(true).with_thread_ids(false)).init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_thread_ids(false).with_ansi(true))
            .init();
    }
}

/// Placeholder for the real WhatsApp Noise-protocol client: a production
/// deployment links in an actual session library here. This always fails
/// to connect so a misconfigured deployment shows `error` status rather
/// than a silent fake "online".
struct UnimplementedClient;

#[async_trait]
impl WaSessionClient for UnimplementedClient {
    async fn connect(&mut self, _creds_dir: &std::path::Path) -> Result<(), WaClientError> {
        Err(WaClientError::ConnectFailed(
            "no WhatsApp protocol client is linked into this build".into(),
        ))
    }

    async fn send_text(&mut self, _jid: &str, _text: &str) -> Result<(), WaClientError> {
        Err(WaClientError::NotConnected)
    }

    async fn disconnect(&mut self, _purge_credentials: bool) {}

    async fn poll_disconnect(&mut self) -> Option<WaDisconnect> {
        None
    }
}

struct UnimplementedClientFactory;

impl WaSessionClientFactory for UnimplementedClientFactory {
    fn build(&self) -> Box<dyn WaSessionClient> {
        Box::new(UnimplementedClient)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    match cli.command {
        None | Some(Commands::Serve) => serve(&cli).await,
        Some(Commands::Auth(cmd)) => auth_commands::run(cmd).await,
        Some(Commands::Config(cmd)) => config_commands::run(cmd),
        Some(Commands::Db(cmd)) => db_commands::run(cmd).await,
        Some(Commands::Doctor) => doctor_commands::run().await,
    }
}

async fn serve(cli: &Cli) -> anyhow::Result<()> {
    let config = wafleet_config::discover_and_load();
    let secrets = wafleet_config::load_secrets()?;

    let tenancy = config
        .server_name
        .clone()
        .ok_or_else(|| anyhow::anyhow!("SERVER_NAME (or RUNTIME_SERVER_NAME) must be set"))?;

    info!(%tenancy, bind = %config.bind, port = config.port, "starting gateway");

    let pool = sqlx::SqlitePool::connect(&secrets.database_url).await?;
    wafleet_registry::run_migrations(&pool).await?;
    let registry = RegistryStore::new(pool);

    let broadcaster = Arc::new(wafleet_gateway::ChannelBroadcaster::new());
    let worker_factory = Arc::new(WhatsAppWorkerFactory::new(Arc::new(UnimplementedClientFactory)));
    let credentials_dir = std::env::var("WAFLEET_CREDENTIALS_DIR")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::env::temp_dir().join("wafleet-credentials"));

    let supervisor = Arc::new(Supervisor::new(
        &tenancy,
        registry.clone(),
        worker_factory,
        broadcaster.clone(),
        credentials_dir,
    ));
    supervisor.resume_on_startup().await?;

    let placement = Arc::new(PlacementEngine::new(registry.clone()));
    let lifecycle = Arc::new(LifecycleOrchestrator::new(tenancy.clone(), registry.clone(), supervisor.clone()));
    let guest_auth = Arc::new(GuestAuthCore::new(
        tenancy.clone(),
        registry.clone(),
        supervisor.clone(),
        Arc::new(AlwaysOkProbe),
        secrets.guest_token_secret.expose_secret().clone(),
    ));

    let rpc = wafleet_rpc::RpcState {
        tenancy: tenancy.clone(),
        registry: registry.clone(),
        supervisor: supervisor.clone(),
    };

    let state = wafleet_gateway::AppState {
        tenancy: tenancy.clone(),
        registry,
        supervisor,
        placement,
        lifecycle,
        guest_auth,
        rpc,
        admin_secret: Arc::new(wafleet_auth::AdminSecret(secrets.admin_jwt_secret)),
        admin_username: secrets.admin_username,
        admin_password_hash: Arc::new(secrets.admin_password_hash),
        events: broadcaster,
    };

    let bind = cli.bind.clone().unwrap_or(config.bind);
    let port = cli.port.unwrap_or(config.port);
    wafleet_gateway::server::serve(state, &bind, port).await
}
