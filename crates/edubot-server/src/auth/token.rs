//! Bearer token codec.
//!
//! Tokens are HS256 JWTs carrying the account email, the issue time, a
//! short expiry and a random `jti`, so no two issued tokens are equal.
//! Decoding distinguishes an expired token from every other verification
//! failure so the session guard can report them separately.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TokenError {
    /// No secret configured, or the JWT library refused to sign.
    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("Token expired")]
    Expired,

    /// Bad signature, corrupt payload, wrong algorithm, missing claim.
    #[error("Malformed token")]
    Malformed,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    email: String,
    jti: String,
    iat: i64,
    exp: i64,
}

/// The verified content of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedToken {
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

pub struct TokenCodec {
    keys: Option<Keys>,
    lifetime: Duration,
    validation: Validation,
}

impl TokenCodec {
    /// Create a codec. With no secret every `issue` fails and every `decode`
    /// reports a malformed token.
    pub fn new(secret: Option<&str>, lifetime: Duration) -> Self {
        let keys = secret.map(|s| Keys {
            encoding: EncodingKey::from_secret(s.as_bytes()),
            decoding: DecodingKey::from_secret(s.as_bytes()),
        });

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            keys,
            lifetime,
            validation,
        }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Mint a token for `email`, valid from now for the configured lifetime.
    pub fn issue(&self, email: &str) -> Result<String, TokenError> {
        self.issue_at(email, Utc::now())
    }

    /// Mint a token as if it had been issued at `issued_at`.
    pub fn issue_at(&self, email: &str, issued_at: DateTime<Utc>) -> Result<String, TokenError> {
        let keys = self
            .keys
            .as_ref()
            .ok_or_else(|| TokenError::Signing("no JWT secret configured".into()))?;

        let claims = Claims {
            email: email.to_string(),
            jti: Uuid::new_v4().simple().to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.lifetime).timestamp(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify `token` and return its claims.
    pub fn decode(&self, token: &str) -> Result<DecodedToken, TokenError> {
        let keys = self.keys.as_ref().ok_or(TokenError::Malformed)?;

        let data = jsonwebtoken::decode::<Claims>(token, &keys.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })?;

        if data.claims.email.is_empty() {
            return Err(TokenError::Malformed);
        }

        let expires_at =
            DateTime::<Utc>::from_timestamp(data.claims.exp, 0).ok_or(TokenError::Malformed)?;

        Ok(DecodedToken {
            email: data.claims.email,
            expires_at,
        })
    }
}
