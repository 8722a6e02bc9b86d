use rusqlite::Connection;

const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS revoked_tokens (
    digest     TEXT PRIMARY KEY NOT NULL,     -- hex BLAKE3 digest of the bearer token
    expires_at TEXT NOT NULL,                 -- token's own expiry, RFC-3339
    revoked_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_revoked_tokens_expires ON revoked_tokens(expires_at);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
