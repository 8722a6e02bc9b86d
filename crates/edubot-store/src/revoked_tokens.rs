//! Persistent registry of revoked bearer tokens.
//!
//! Rows are keyed by a digest of the token computed by the caller; the store
//! never sees the token itself. Each row carries the token's own expiry so
//! that entries can be purged once the token would be rejected anyway.

use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::database::{encode_timestamp, Database};
use crate::error::Result;

impl Database {
    /// Record a revoked token digest. Revoking twice is a no-op.
    pub fn insert_revoked_token(&self, digest: &str, expires_at: &DateTime<Utc>) -> Result<()> {
        self.conn().execute(
            "INSERT OR IGNORE INTO revoked_tokens (digest, expires_at, revoked_at)
             VALUES (?1, ?2, ?3)",
            params![
                digest,
                encode_timestamp(expires_at),
                encode_timestamp(&Utc::now()),
            ],
        )?;
        Ok(())
    }

    /// Whether `digest` has been revoked.
    pub fn is_token_revoked(&self, digest: &str) -> Result<bool> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM revoked_tokens WHERE digest = ?1",
            params![digest],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Drop entries whose token expired before `now`. Returns the number of
    /// rows removed.
    pub fn purge_revoked_tokens(&self, now: &DateTime<Utc>) -> Result<usize> {
        let removed = self.conn().execute(
            "DELETE FROM revoked_tokens WHERE expires_at < ?1",
            params![encode_timestamp(now)],
        )?;
        Ok(removed)
    }
}
