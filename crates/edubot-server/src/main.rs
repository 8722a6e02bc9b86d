//! # edubot-server
//!
//! HTTP backend for the edubot teaching assistant.
//!
//! This binary provides:
//! - **Accounts**: signup and login with bcrypt-hashed passwords
//! - **Sessions**: short-lived JWT bearer tokens, revocable on logout
//! - **Settings**: per-user expertise level and colour theme
//! - **Chats**: per-user conversations whose history is persisted in SQLite
//!   and answered by a language model (or a canned tutor offline)

mod api;
mod auth;
mod config;
mod error;
mod tutor;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use edubot_store::Database;

use crate::api::AppState;
use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Load .env (if present) and initialize tracing (respects RUST_LOG)
    // -----------------------------------------------------------------------
    let dotenv_loaded = dotenv::dotenv().is_ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,edubot_server=debug,edubot_store=info")),
        )
        .init();

    info!("Starting edubot server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, dotenv_loaded, "Loaded configuration");

    if config.jwt_secret.is_none() {
        warn!("JWT_SECRET is not set: logins will fail until it is configured");
    }

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------
    let db = Database::open_at(&config.database_path)?;
    let http_addr = config.http_addr;
    let app_state = AppState::new(config, db)?;

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Periodic revocation cleanup (every 10 minutes)
    let revocations = app_state.revocations.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(600));
        loop {
            interval.tick().await;
            if let Err(e) = revocations.purge_expired().await {
                warn!(error = %e, "Revocation purge failed");
            }
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
