//! Fundigest Server
//!
//! Serves the latest funding digest and accepts edited or freshly
//! researched digests.
//!
//! # Configuration
//!
//! Read from `~/.config/fundigest/config.yaml` (or the path in
//! `FUNDIGEST_CONFIG`), with environment overrides:
//! - `FUNDIGEST_PORT`: Port to listen on (default: 8080)
//! - `FUNDIGEST_DATABASE_PATH`: SQLite database (default: ~/.local/share/fundigest/fundigest.db)
//!
//! # Endpoints
//!
//! - `GET /health`: Health check endpoint
//! - `GET /api/digest`: Latest digest record
//! - `POST /api/digest`, `PUT /api/digest`: Store a digest

use std::net::SocketAddr;
use std::path::PathBuf;

use fundigest::config::Config;
use fundigest::db::{init_db, DigestRepository};
use fundigest::server::{app, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fundigest_server=info,fundigest=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::var("FUNDIGEST_CONFIG").ok().map(PathBuf::from);
    let config = Config::load(config_path)?;

    if let Some(path) = &config.config_file {
        tracing::info!("Config file: {}", path.display());
    }
    tracing::info!(
        "Database: {} ({})",
        config.database_path.value.display(),
        config.database_path.source
    );

    let pool = init_db(&config.database_path.value).await?;
    let state = AppState {
        digests: DigestRepository::new(pool),
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port.value));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
