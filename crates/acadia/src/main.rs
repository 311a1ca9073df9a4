//! Acadia Auth - session service for the Acadia academy management platform

use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use acadia_api::{AppState, create_router};
use acadia_auth::TokenCodec;
use acadia_db::Database;
use config::{Config, LoggingConfig};

/// Acadia Auth - session service for the Acadia platform
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "ACADIA_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "ACADIA_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration
    let config = Config::load(&args.config)?;

    // Initialize logging
    init_logging(&config.logging);

    info!("Starting Acadia Auth v{}", env!("CARGO_PKG_VERSION"));

    if config.auth.jwt_secret == "change-me-in-production" {
        warn!("Running with the default JWT secret; set [auth].jwt_secret before deploying");
    }

    // Install the Prometheus recorder
    let metrics_handle = PrometheusBuilder::new().install_recorder()?;

    // Create the data directory
    if let Some(parent) = Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // Initialize database
    let db_url = format!("sqlite:{}?mode=rwc", config.database.path);
    let db = Database::new(&db_url).await?;

    // Create default admin user if no users exist
    if !db.has_users().await? {
        info!("Creating default admin user");
        let password_hash = acadia_auth::hash_password("admin123")?;
        db.insert_user(acadia_db::NewUser {
            email: "admin@acadia.local".to_string(),
            full_name: "Administrator".to_string(),
            password_hash,
            role: acadia_db::UserRole::Admin,
        })
        .await?;
        info!("Default admin user created (email: admin@acadia.local, password: admin123)");
    }

    // Initialize the token codec
    let tokens = Arc::new(TokenCodec::new(
        &config.auth.jwt_secret,
        config.auth.access_token_ttl_minutes,
        config.auth.refresh_token_ttl_days,
    ));

    // Create application state
    let state = AppState::new(
        db,
        tokens,
        config.auth.secure_cookies,
        config.auth.reset_token_ttl_minutes,
    );

    // Create router
    let app = create_router(state, Some(Arc::new(metrics_handle)))
        .layer(TraceLayer::new_for_http());

    // Determine bind address
    let bind_addr = args.bind.unwrap_or(config.server.bind_address);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port).parse()?;

    info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.clone()));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    info!("Shutdown signal received");
}
