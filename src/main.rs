// SPDX-License-Identifier: MIT

//! Authgate server.
//!
//! Runs the HTTP surface (request authority gate, API-key login, logout)
//! and the TCP identity service endpoint against one shared identity
//! store and session authority.

use authgate::{
    config::Config,
    db::IdentityStore,
    gate::NoopCacheInvalidation,
    session::SessionAuthority,
    AppState,
};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting authgate");

    // Open the identity store; EMPTY_DATABASE discards prior data
    let store = IdentityStore::open(Path::new(&config.database_path), config.empty_database)
        .await
        .expect("Failed to open identity store");

    let sessions = Arc::new(SessionAuthority::new(config.session_ttl()));
    tracing::info!(ttl_secs = config.session_ttl_secs, "Session authority initialized");

    // Build shared state; store handles are constructed exactly once here
    let state = AppState::new(config, store, sessions, Arc::new(NoopCacheInvalidation));

    // Identity service endpoint for provider-adapter callers
    let identity_listener = tokio::net::TcpListener::bind(&state.config.identity_bind).await?;
    tracing::info!(address = %state.config.identity_bind, "Identity endpoint listening");
    tokio::spawn(authgate::endpoint::serve(identity_listener, state.clone()));

    // Build router
    let app = authgate::routes::create_router(state.clone());

    // Start server
    let addr = format!("0.0.0.0:{}", state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("authgate=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
