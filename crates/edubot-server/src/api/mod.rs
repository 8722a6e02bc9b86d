//! HTTP API.
//!
//! Public routes (`/`, `/health`, `/signup`, `/login`) are open; every other
//! route sits behind [`require_session`] and receives the caller's
//! [`Identity`](crate::auth::Identity) as a request extension.

mod account;
mod chats;
mod extract;
#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::{
    http::Method,
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use edubot_shared::protocol::MessageResponse;
use edubot_store::{Database, StoreError};

use crate::auth::{require_session, PasswordHasher, RevocationRegistry, SessionGuard, TokenCodec};
use crate::config::{RevocationBackend, ServerConfig};
use crate::error::ServerError;
use crate::tutor::Tutor;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub tokens: Arc<TokenCodec>,
    pub passwords: PasswordHasher,
    pub revocations: RevocationRegistry,
    pub guard: SessionGuard,
    pub tutor: Arc<Tutor>,
}

impl AppState {
    /// Wire every subsystem from `config` around an open database.
    pub fn new(config: ServerConfig, db: Database) -> Result<Self, ServerError> {
        let tutor = Tutor::from_config(&config)?;
        Ok(Self::with_tutor(config, db, tutor))
    }

    pub fn with_tutor(config: ServerConfig, db: Database, tutor: Tutor) -> Self {
        let db = Arc::new(Mutex::new(db));
        let tokens = Arc::new(TokenCodec::new(
            config.jwt_secret.as_deref(),
            config.token_lifetime,
        ));
        let revocations = match config.revocation_backend {
            RevocationBackend::Memory => RevocationRegistry::in_memory(),
            RevocationBackend::Persistent => RevocationRegistry::persistent(db.clone()),
        };
        let guard = SessionGuard::new(tokens.clone(), revocations.clone(), db.clone());

        Self {
            db,
            tokens,
            passwords: PasswordHasher::new(config.bcrypt_cost),
            revocations,
            guard,
            tutor: Arc::new(tutor),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    let protected = Router::new()
        .route("/logout", post(account::logout))
        .route("/get-user-id", get(account::get_user_id))
        .route("/get-user-settings", get(account::get_user_settings))
        .route("/update-settings", post(account::update_settings))
        .route("/protected-route", get(account::protected_route))
        .route("/api/chats", post(chats::create_chat).get(chats::list_chats))
        .route("/api/chats/:chat_id", delete(chats::delete_chat))
        .route("/send-message", post(chats::send_message))
        .route("/fetch-messages/:chat_id", get(chats::fetch_messages))
        .route_layer(middleware::from_fn_with_state(
            state.guard.clone(),
            require_session,
        ));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/signup", post(account::signup))
        .route("/login", post(account::login))
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn root() -> Json<MessageResponse> {
    Json(MessageResponse::new("Welcome to the edubot API."))
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ─── Error mapping helpers ───

pub(crate) const USER_NOT_FOUND: &str = "User not found.";
pub(crate) const CHAT_NOT_FOUND: &str = "Chat not found or access denied.";

/// Store `NotFound` becomes a 404 carrying `message`; anything else is a
/// server error.
pub(crate) fn not_found_as(message: &'static str) -> impl Fn(StoreError) -> ServerError {
    move |e| match e {
        StoreError::NotFound => ServerError::NotFound(message.to_string()),
        other => ServerError::Store(other),
    }
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
