//! Revoked bearer tokens.
//!
//! Two backends share one interface. The in-memory set is fast but forgets
//! everything on restart and is private to one process. The persistent
//! backend writes a BLAKE3 digest of each token to the `revoked_tokens`
//! table, so revocations survive restarts and are visible to every server
//! sharing the database.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use edubot_shared::constants::KDF_CONTEXT_TOKEN_DIGEST;
use edubot_store::Database;

use crate::error::ServerError;

/// Stable digest of a bearer token, used as the persistent key.
pub fn token_digest(token: &str) -> String {
    hex::encode(blake3::derive_key(KDF_CONTEXT_TOKEN_DIGEST, token.as_bytes()))
}

/// Short, non-reversible label for a token, safe to put in logs.
pub fn token_fingerprint(token: &str) -> String {
    token_digest(token)[..12].to_string()
}

#[derive(Clone)]
pub enum RevocationRegistry {
    /// token -> the token's own expiry
    InMemory(Arc<RwLock<HashMap<String, DateTime<Utc>>>>),
    Persistent(Arc<Mutex<Database>>),
}

impl RevocationRegistry {
    pub fn in_memory() -> Self {
        Self::InMemory(Arc::new(RwLock::new(HashMap::new())))
    }

    pub fn persistent(db: Arc<Mutex<Database>>) -> Self {
        Self::Persistent(db)
    }

    /// Mark `token` revoked. `expires_at` is the token's natural expiry and
    /// only bounds how long the entry is kept.
    pub async fn revoke(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), ServerError> {
        match self {
            Self::InMemory(set) => {
                set.write().await.insert(token.to_string(), expires_at);
            }
            Self::Persistent(db) => {
                db.lock()
                    .await
                    .insert_revoked_token(&token_digest(token), &expires_at)?;
            }
        }
        info!(token = %token_fingerprint(token), "Token revoked");
        Ok(())
    }

    pub async fn is_revoked(&self, token: &str) -> Result<bool, ServerError> {
        match self {
            Self::InMemory(set) => Ok(set.read().await.contains_key(token)),
            Self::Persistent(db) => Ok(db.lock().await.is_token_revoked(&token_digest(token))?),
        }
    }

    /// Evict entries whose token has expired on its own.
    pub async fn purge_expired(&self) -> Result<usize, ServerError> {
        let now = Utc::now();
        let removed = match self {
            Self::InMemory(set) => {
                let mut set = set.write().await;
                let before = set.len();
                set.retain(|_, expires_at| *expires_at >= now);
                before - set.len()
            }
            Self::Persistent(db) => db.lock().await.purge_revoked_tokens(&now)?,
        };
        if removed > 0 {
            debug!(removed, "Purged expired revocations");
        }
        Ok(removed)
    }
}
