use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use partner_desk::api::{build_router, AppState};
use partner_desk::auth::SessionSigner;
use partner_desk::config::{
    configured_database_url, database_url_candidates, load_file_config, mask_database_url,
    FileConfig, DEFAULT_LISTEN, DEFAULT_SESSION_TTL_HOURS,
};
use partner_desk::db::{resolve_pool_max_connections, CrmDb};
use partner_desk::error::{get_error_info, CrmError};
use partner_desk::store::{open_store, SharedStore, StorageConfig};

#[derive(Parser)]
#[command(name = "partner-desk")]
#[command(about = "Partner onboarding desk - kanban lifecycle with document approval guardrails")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file (default: .partner-desk/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum StorageMode {
    /// Process memory only; data is lost on exit
    Memory,
    /// PostgreSQL, failing if no database is reachable
    Postgres,
    /// PostgreSQL when a database url is configured, memory otherwise
    Auto,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to listen on
        #[arg(short, long, env = "PARTNER_DESK_LISTEN")]
        listen: Option<String>,

        #[arg(long, value_enum, default_value = "auto", env = "PARTNER_DESK_STORAGE")]
        storage: StorageMode,

        /// Database URL (overrides DATABASE_URL and the config file)
        #[arg(long)]
        database_url: Option<String>,

        /// Pool size (default: PARTNER_DESK_DB_MAX_CONNECTIONS or 10)
        #[arg(long)]
        max_connections: Option<u32>,

        /// Secret used to sign session cookies
        #[arg(long, env = "PARTNER_DESK_SESSION_SECRET", hide_env_values = true)]
        session_secret: Option<String>,

        /// Session lifetime in hours
        #[arg(long)]
        session_ttl_hours: Option<u32>,

        /// Serve every route without a session
        #[arg(long)]
        no_auth: bool,

        /// Apply the schema before serving
        #[arg(long)]
        init_schema: bool,
    },

    /// Initialize database schema
    InitDb {
        /// Database URL
        #[arg(short, long)]
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        match err.downcast_ref::<CrmError>() {
            Some(crm) => {
                error!("{crm}");
                if let Some((_, fix)) = get_error_info(crm.code()) {
                    error!("Hint: {fix}");
                }
                std::process::exit(crm.exit_code());
            }
            None => {
                error!("{err:#}");
                std::process::exit(1);
            }
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("partner_desk=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let file = load_file_config(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Serve {
            listen,
            storage,
            database_url,
            max_connections,
            session_secret,
            session_ttl_hours,
            no_auth,
            init_schema,
        } => {
            let max_connections = max_connections.unwrap_or_else(resolve_pool_max_connections);
            let store = open_configured_store(
                storage,
                database_url,
                max_connections,
                init_schema,
                &file,
            )
            .await?;

            let secret = session_secret
                .or_else(|| file.session_secret.clone())
                .unwrap_or_else(|| {
                    warn!("No session secret configured; sessions will not survive a restart");
                    uuid::Uuid::new_v4().simple().to_string()
                });
            let ttl_hours = session_ttl_hours
                .or(file.session_ttl_hours)
                .unwrap_or(DEFAULT_SESSION_TTL_HOURS);
            if no_auth {
                warn!("Authentication disabled; every route is public");
            }

            let state = AppState::new(store, SessionSigner::new(&secret, ttl_hours), !no_auth);
            let listen = listen
                .or_else(|| file.listen.clone())
                .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
            let listener = tokio::net::TcpListener::bind(&listen)
                .await
                .with_context(|| format!("Failed to bind {listen}"))?;
            info!("Listening on {listen}");
            axum::serve(listener, build_router(state))
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("HTTP server failed")?;
            Ok(())
        }

        Commands::InitDb { url } => {
            let url = url
                .or_else(|| configured_database_url(&file))
                .or_else(|| database_url_candidates(&file).pop())
                .context("No database url available")?;
            let db = CrmDb::connect(&url, 1).await?;
            db.initialize_schema().await?;
            info!("Schema initialized at {}", mask_database_url(&url));
            Ok(())
        }
    }
}

async fn open_configured_store(
    mode: StorageMode,
    explicit_url: Option<String>,
    max_connections: u32,
    init_schema: bool,
    file: &FileConfig,
) -> anyhow::Result<SharedStore> {
    if mode == StorageMode::Memory
        || (mode == StorageMode::Auto
            && explicit_url.is_none()
            && configured_database_url(file).is_none())
    {
        info!("Using in-memory storage");
        return Ok(open_store(StorageConfig::Memory).await?);
    }

    let candidates = explicit_url.map_or_else(|| database_url_candidates(file), |url| vec![url]);
    for url in candidates {
        let masked = mask_database_url(&url);
        match open_store(StorageConfig::Postgres {
            database_url: url,
            max_connections,
            init_schema,
        })
        .await
        {
            Ok(store) => {
                info!("Using postgres storage at {masked}");
                return Ok(store);
            }
            Err(e) => warn!("Database {masked} unavailable: {e}"),
        }
    }
    bail!("No reachable database; pass --storage memory to run without one")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
