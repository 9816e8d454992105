use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use psyform_api::config::{AppConfig, StorageBackend};
use psyform_api::database::{DatabaseManager, MemoryRepository, PgRepository, RepositoryState};
use psyform_api::{app, AppState};

#[derive(Parser)]
#[command(name = "psyform-api")]
#[command(about = "PsyForm API - questionnaires between psychologists and their patients")]
#[command(version)]
struct Args {
    #[arg(long, help = "Address to bind (overrides PSYFORM_HOST)")]
    host: Option<String>,

    #[arg(long, help = "Port to listen on (overrides PSYFORM_PORT)")]
    port: Option<u16>,

    #[arg(long, help = "Storage backend: postgres or memory (overrides STORAGE_BACKEND)")]
    storage: Option<StorageBackend>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")))
        .init();

    let args = Args::parse();

    let mut config: AppConfig = psyform_api::config::config().clone();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(storage) = args.storage {
        config.storage = storage;
    }
    config.validate().map_err(anyhow::Error::msg)?;

    tracing::info!("Starting PsyForm API in {:?} mode with {:?} storage", config.environment, config.storage);

    let repo: RepositoryState = match config.storage {
        StorageBackend::Postgres => {
            let pool = DatabaseManager::connect(&config.database).await.context("connecting to database")?;
            DatabaseManager::migrate(&pool).await.context("running migrations")?;
            Arc::new(PgRepository::new(pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Arc::new(MemoryRepository::new())
        }
    };

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("PsyForm API listening on http://{}", bind_addr);

    axum::serve(listener, app(AppState::new(config, repo))).await?;
    Ok(())
}
