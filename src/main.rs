use anyhow::Result;
use popcorn::config::AppConfig;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG: &str = "popcorn=info,tower_http=info";

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv();

    // POPCORN_LOG wins over RUST_LOG so the server can be tuned without touching other tools.
    let filter = EnvFilter::try_from_env("POPCORN_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Ok(path) = dotenv {
        debug!("Read .env from {}", path.display());
    }

    let config = AppConfig::from_env()?;
    info!("popcorn {} starting", env!("CARGO_PKG_VERSION"));
    popcorn::app::run_server(config).await
}
