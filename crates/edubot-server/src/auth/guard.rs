//! Session guard for protected routes.
//!
//! Every protected call goes through [`SessionGuard::check`]:
//!
//! 1. no bearer token            -> [`SessionFailure::MissingToken`]
//! 2. token in the registry      -> [`SessionFailure::Revoked`]
//! 3. token past its expiry      -> [`SessionFailure::Expired`]
//!    any other decode failure   -> [`SessionFailure::Invalid`]
//! 4. email has no account       -> [`SessionFailure::UnknownIdentity`]
//! 5. otherwise the [`Identity`] is attached to the request.
//!
//! [`require_session`] applies it as axum middleware so handlers only ever
//! see an authenticated [`Identity`] extension.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use edubot_shared::constants::BEARER_SCHEME;
use edubot_store::Database;

use crate::auth::revocation::{token_fingerprint, RevocationRegistry};
use crate::auth::token::{TokenCodec, TokenError};
use crate::error::ServerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionFailure {
    #[error("A token is required for authentication.")]
    MissingToken,

    #[error("Session has been terminated.")]
    Revoked,

    #[error("Session expired.")]
    Expired,

    #[error("Invalid user or session.")]
    Invalid,

    #[error("User not found.")]
    UnknownIdentity,
}

impl SessionFailure {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingToken | Self::Revoked | Self::Invalid => StatusCode::UNAUTHORIZED,
            Self::Expired => StatusCode::FORBIDDEN,
            Self::UnknownIdentity => StatusCode::NOT_FOUND,
        }
    }

    /// Stable machine-readable code sent alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingToken => "missing_token",
            Self::Revoked => "revoked",
            Self::Expired => "expired",
            Self::Invalid => "invalid",
            Self::UnknownIdentity => "unknown_identity",
        }
    }
}

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct Identity {
    pub email: String,
    /// The bearer token the call was made with (needed to revoke it).
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SessionGuard {
    codec: Arc<TokenCodec>,
    revocations: RevocationRegistry,
    db: Arc<Mutex<Database>>,
}

impl SessionGuard {
    pub fn new(
        codec: Arc<TokenCodec>,
        revocations: RevocationRegistry,
        db: Arc<Mutex<Database>>,
    ) -> Self {
        Self {
            codec,
            revocations,
            db,
        }
    }

    /// Admit or reject a call based on its headers.
    ///
    /// Rejections are `ServerError::Session`; any other error means a
    /// backing store failed.
    pub async fn check(&self, headers: &HeaderMap) -> Result<Identity, ServerError> {
        let token = bearer_token(headers).ok_or(SessionFailure::MissingToken)?;

        if self.revocations.is_revoked(token).await? {
            debug!(token = %token_fingerprint(token), "Rejected revoked token");
            return Err(SessionFailure::Revoked.into());
        }

        let decoded = self.codec.decode(token).map_err(|e| match e {
            TokenError::Expired => SessionFailure::Expired,
            TokenError::Malformed | TokenError::Signing(_) => SessionFailure::Invalid,
        })?;

        if !self.db.lock().await.user_exists(&decoded.email)? {
            return Err(SessionFailure::UnknownIdentity.into());
        }

        Ok(Identity {
            email: decoded.email,
            token: token.to_string(),
            expires_at: decoded.expires_at,
        })
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

pub async fn require_session(
    State(guard): State<SessionGuard>,
    mut req: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let identity = guard.check(req.headers()).await?;
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}
