use anyhow::Context;
use clap::Parser;
use forge_daemon::{
    build_router, cors_layer, read_config, write_config, AppState, DaemonConfig, InMemoryStore,
    TemplateEngine,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_ADDR: &str = "127.0.0.1:9000";
const DEFAULT_DATA_DIR: &str = "./.forge";
const DEFAULT_CORS_ORIGINS: &str = "http://localhost,https://localhost,http://127.0.0.1,https://127.0.0.1";

/// Forge Daemon - issue tracker of a self-hosted project hosting site
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind the server to
    #[arg(short, long, env = "FORGE_DAEMON_ADDR", default_value = DEFAULT_ADDR)]
    addr: String,

    /// Directory holding config.json and the store snapshot
    #[arg(short, long, env = "FORGE_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// Comma-separated list of allowed CORS origins.
    /// Use "*" to allow all origins (not recommended for production).
    #[arg(
        long,
        env = "FORGE_CORS_ORIGINS",
        default_value = DEFAULT_CORS_ORIGINS,
        value_delimiter = ','
    )]
    cors_origins: Vec<String>,
}

async fn load_config(data_dir: &std::path::Path) -> anyhow::Result<DaemonConfig> {
    match read_config(data_dir).await? {
        Some(config) => Ok(config),
        None => {
            let config = DaemonConfig::default();
            write_config(data_dir, &config)
                .await
                .context("writing default config")?;
            info!(data_dir = %data_dir.display(), "Wrote default config");
            Ok(config)
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal, stopping server...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let config = load_config(&args.data_dir).await?;

    let snapshot_path = config.snapshot_path(&args.data_dir);
    let store = InMemoryStore::open(&snapshot_path)
        .await
        .with_context(|| format!("opening store snapshot {}", snapshot_path.display()))?;

    let templates = match config.templates_path(&args.data_dir) {
        Some(dir) => {
            info!(dir = %dir.display(), "Loading template overrides");
            TemplateEngine::with_overrides(&dir)?
        }
        None => TemplateEngine::new()?,
    };

    let cors_origins: Vec<String> = args
        .cors_origins
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    info!("CORS origins: {}", cors_origins.join(", "));

    let state = AppState::new(Arc::new(store), templates, config);
    let app = build_router(state).layer(cors_layer(cors_origins));

    let listener = tokio::net::TcpListener::bind(&args.addr)
        .await
        .with_context(|| format!("binding {}", args.addr))?;
    info!("Starting Forge daemon on {}", args.addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Forge daemon stopped");
    Ok(())
}
