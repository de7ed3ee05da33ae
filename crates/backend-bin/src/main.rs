// ============================
// crates/backend-bin/src/main.rs
// ============================
//! Tokio / Axum entry-point for the Medika API server.
use anyhow::Context;
use clap::Parser;
use medika_backend::{
    auth::PhcVerifier,
    config::{LogSettings, Settings},
    create_router,
    storage::FlatFileStorage,
    store::RedisSessionStore,
    AppState,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "medika-server", about = "Medika API server")]
struct Cli {
    /// TOML configuration file; `MEDIKA_*` environment variables override it
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let json = log.json.then(|| tracing_subscriber::fmt::layer().json());
    let plain = (!log.json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(plain)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load_from(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;

    init_tracing(&settings.log);

    let store = RedisSessionStore::connect(&settings.redis)
        .await
        .context("failed to connect to the session store")?;
    let storage = FlatFileStorage::open(&settings.storage.path)
        .await
        .context("failed to open the user store")?;
    let addr = settings.bind_addr()?;

    let state = Arc::new(AppState::new(
        settings,
        Arc::new(store),
        Arc::new(storage),
        Arc::new(PhcVerifier::default()),
    )?);
    state.bootstrap_admin().await?;

    let app = create_router(state);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Listening");
    axum::serve(listener, app).await?;

    Ok(())
}
