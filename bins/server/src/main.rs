//! Saldra API Server
//!
//! Main entry point for the Saldra ledger service.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use saldra_api::{AppState, create_router};
use saldra_core::ledger::{ProcessorConfig, TransactionProcessor};
use saldra_db::{PostgresLedgerStore, connect};
use saldra_shared::{AppConfig, JwtService, jwt::JwtConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "saldra=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Connect to database
    let db = connect(&config.database.url).await?;
    info!("Connected to database");

    // Create JWT service
    let jwt_service = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        access_token_expiry_secs: config.jwt.access_token_expiry_secs,
        refresh_token_expiry_secs: config.jwt.refresh_token_expiry_secs,
    });

    // Create the posting engine
    let store = PostgresLedgerStore::new(db.clone());
    let ledger = TransactionProcessor::with_config(store, ProcessorConfig::from(&config.ledger));
    info!(
        max_commit_retries = config.ledger.max_commit_retries,
        retry_backoff_ms = config.ledger.retry_backoff_ms,
        "Ledger engine configured"
    );

    // Create application state
    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        ledger: Arc::new(ledger),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
