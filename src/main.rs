use anyhow::Context;
use bazaar_api::auth::codes::CodeDispatcher;
use bazaar_api::auth::rate_limit::AuthRateLimits;
use bazaar_api::config::AppConfig;
use bazaar_api::db::DatabaseManager;
use bazaar_api::state::AppState;
use bazaar_api::storage::DatabaseStorage;
use bazaar_api::{auth, logging, metrics, server};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "bazaar-api")]
#[command(about = "Marketplace directory REST API")]
#[command(version = "0.1.0")]
struct Cli {
    /// Override the bind host from BIND_ADDR
    #[arg(long)]
    host: Option<String>,
    /// Override the bind port from BIND_ADDR
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    let mut addr: SocketAddr = config
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid bind address: {}", config.bind_addr))?;
    if let Some(host) = cli.host {
        addr.set_ip(
            host.parse()
                .with_context(|| format!("Invalid host: {}", host))?,
        );
    }
    if let Some(port) = cli.port {
        addr.set_port(port);
    }

    let db = DatabaseManager::connect(&config).await?;
    db.run_migrations().await?;
    info!("Database ready");

    let storage = Arc::new(DatabaseStorage::new(Arc::new(db)));
    auth::ensure_admin_exists(storage.as_ref(), &config).await?;

    let metrics_handle = metrics::init_metrics()?;

    let config = Arc::new(config);
    let state = AppState {
        storage,
        code_sender: Arc::new(CodeDispatcher::from_config(&config)),
        rate_limits: Arc::new(AuthRateLimits::default()),
        config,
    };

    server::start_server(state, metrics_handle, addr).await
}
