//! bcrypt password hashing, run on the blocking thread pool.

use crate::error::ServerError;

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub async fn hash(&self, password: &str) -> Result<String, ServerError> {
        let password = password.to_string();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| ServerError::Internal(format!("hashing task failed: {e}")))?
            .map_err(|e| ServerError::Internal(format!("bcrypt hash failed: {e}")))
    }

    /// Returns `Ok(false)` on mismatch; errors only if `hash` is not a
    /// bcrypt hash.
    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool, ServerError> {
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| ServerError::Internal(format!("verify task failed: {e}")))?
            .map_err(|e| ServerError::Internal(format!("bcrypt verify failed: {e}")))
    }
}
