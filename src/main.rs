//! B2C Admin - user administration API for Azure AD B2C
//!
//! Serves admin-only CRUD endpoints for tenant users, storing each user's
//! application role in a custom extension attribute.

#![deny(clippy::all)]

mod api;
mod b2c;
mod config;
mod error;
mod graph;
mod secure;
mod users;

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use api::{AppState, JwksValidator};
use config::Config;
use error::AppError;
use graph::{ClientCredentials, GraphDirectory};
use users::{B2cSettings, UserProjector};

#[tokio::main]
async fn main() {
    // Load .env file (if present) before anything else
    if let Err(e) = dotenvy::dotenv() {
        // .env file is optional - only log if it's not a "file not found" error
        if !e.to_string().contains("not found") {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    if let Err(e) = run().await {
        eprintln!("{}", e.user_message());
        eprintln!("  {}", e);
        if matches!(e, AppError::Config(_)) {
            eprintln!("\nPlease set the following environment variables:");
            eprintln!("  AZURE_TENANT_ID=<your-b2c-tenant-id>");
            eprintln!("  AZURE_CLIENT_ID=<your-app-registration-client-id>");
            eprintln!("  AZURE_CLIENT_SECRET=<your-client-secret>");
            eprintln!("  B2C_INSTANCE=https://<tenant>.b2clogin.com");
            eprintln!("  B2C_DOMAIN=<tenant>.onmicrosoft.com");
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let config = Config::load().map_err(|e| AppError::Config(format!("{:#}", e)))?;

    init_logging(&config.logging.level);
    info!("Starting B2C Admin v{}", env!("CARGO_PKG_VERSION"));

    let credentials = ClientCredentials::from_config(&config)?;
    let directory = GraphDirectory::new(config.api.graph_base_url.clone(), credentials)?;
    let projector = UserProjector::new(Arc::new(directory), B2cSettings::from(&config.b2c));

    if config.b2c.extension_app_client_id.trim().is_empty() {
        info!("B2C_EXTENSION_APP_CLIENT_ID is not set; creating users will fail");
    }

    let validator = JwksValidator::from_config(&config)?;

    let app = api::router(AppState {
        projector: Arc::new(projector),
        validator: Arc::new(validator),
    });

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    info!("Listening on {}", config.server.bind_address);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize tracing/logging. `RUST_LOG` wins over the configured level.
fn init_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_target(false)
        .with_thread_ids(false)
        .init();
}
