//! Server configuration loaded from environment variables.
//!
//! All settings except the JWT secret have sensible defaults so the server
//! can start with zero configuration for local development. A `.env` file in
//! the working directory is read by `main` before this runs.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use edubot_shared::constants::{
    DEFAULT_BCRYPT_COST, DEFAULT_HTTP_PORT, DEFAULT_TOKEN_LIFETIME_SECS,
};

/// Where revoked tokens are remembered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationBackend {
    /// Process-local set; forgotten on restart.
    Memory,
    /// `revoked_tokens` table in the main database.
    Persistent,
}

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`, or `PORT` to change only the port.
    /// Default: `0.0.0.0:3001`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: `./edubot.db`
    pub database_path: PathBuf,

    /// HMAC secret for signing bearer tokens.
    /// Env: `JWT_SECRET`
    /// Default: unset (token issuance fails until configured).
    pub jwt_secret: Option<String>,

    /// Lifetime of issued tokens.
    /// Env: `TOKEN_LIFETIME_SECS`
    /// Default: 300 (5 minutes)
    pub token_lifetime: chrono::Duration,

    /// bcrypt work factor, clamped to 4..=31.
    /// Env: `BCRYPT_COST`
    /// Default: 12
    pub bcrypt_cost: u32,

    /// Env: `REVOCATION_STORE` (`memory` or `persistent`)
    /// Default: `persistent`
    pub revocation_backend: RevocationBackend,

    // -- Tutor (language model) settings --

    /// OpenAI-compatible chat completions endpoint.
    /// Env: `LLM_API_URL`
    pub llm_api_url: String,

    /// Env: `LLM_API_KEY`
    /// Default: unset (the canned tutor answers instead).
    pub llm_api_key: Option<String>,

    /// Env: `LLM_MODEL`
    /// Default: `gpt-3.5-turbo`
    pub llm_model: String,

    /// Per-request timeout for the language model.
    /// Env: `LLM_TIMEOUT_SECS`
    /// Default: 30
    pub llm_timeout: Duration,
}

// Secrets are redacted so the config can be logged at startup.
impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("http_addr", &self.http_addr)
            .field("database_path", &self.database_path)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("token_lifetime_secs", &self.token_lifetime.num_seconds())
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("revocation_backend", &self.revocation_backend)
            .field("llm_api_url", &self.llm_api_url)
            .field("llm_api_key", &self.llm_api_key.as_ref().map(|_| "<redacted>"))
            .field("llm_model", &self.llm_model)
            .field("llm_timeout", &self.llm_timeout)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: PathBuf::from("./edubot.db"),
            jwt_secret: None,
            token_lifetime: chrono::Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS),
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            revocation_backend: RevocationBackend::Persistent,
            llm_api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            llm_api_key: None,
            llm_model: "gpt-3.5-turbo".to_string(),
            llm_timeout: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(port) = lookup("PORT") {
            match port.parse::<u16>() {
                Ok(port) => config.http_addr.set_port(port),
                Err(_) => tracing::warn!(value = %port, "Invalid PORT, ignoring"),
            }
        }

        if let Some(path) = lookup("DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Some(secret) = lookup("JWT_SECRET") {
            if !secret.is_empty() {
                config.jwt_secret = Some(secret);
            }
        }

        if let Some(val) = lookup("TOKEN_LIFETIME_SECS") {
            match val.parse::<i64>() {
                Ok(secs) if secs > 0 => config.token_lifetime = chrono::Duration::seconds(secs),
                _ => tracing::warn!(value = %val, "Invalid TOKEN_LIFETIME_SECS, using default"),
            }
        }

        if let Some(val) = lookup("BCRYPT_COST") {
            if let Ok(cost) = val.parse::<u32>() {
                config.bcrypt_cost = cost.clamp(4, 31);
            }
        }

        if let Some(val) = lookup("REVOCATION_STORE") {
            config.revocation_backend = match val.to_ascii_lowercase().as_str() {
                "memory" => RevocationBackend::Memory,
                "persistent" | "sqlite" => RevocationBackend::Persistent,
                _ => {
                    tracing::warn!(value = %val, "Unknown REVOCATION_STORE, using persistent");
                    RevocationBackend::Persistent
                }
            };
        }

        // -- Tutor settings --

        if let Some(url) = lookup("LLM_API_URL") {
            config.llm_api_url = url;
        }

        if let Some(key) = lookup("LLM_API_KEY") {
            if !key.is_empty() {
                config.llm_api_key = Some(key);
            }
        }

        if let Some(model) = lookup("LLM_MODEL") {
            config.llm_model = model;
        }

        if let Some(val) = lookup("LLM_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse::<u64>() {
                config.llm_timeout = Duration::from_secs(secs);
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}
