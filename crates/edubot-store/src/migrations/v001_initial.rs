//! v001 -- Initial schema creation.
//!
//! Creates the three core tables: `users`, `chats` and `messages`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id              TEXT PRIMARY KEY NOT NULL,    -- UUID v4
    email           TEXT NOT NULL UNIQUE,
    password_hash   TEXT NOT NULL,                -- bcrypt
    expertise_level TEXT NOT NULL DEFAULT 'beginner',
    color_theme     TEXT NOT NULL DEFAULT 'light',
    created_at      TEXT NOT NULL                 -- RFC-3339
);

-- ----------------------------------------------------------------
-- Chats
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS chats (
    id            TEXT PRIMARY KEY NOT NULL,
    name          TEXT NOT NULL,
    owner_email   TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    last_activity TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chats_owner_activity
    ON chats(owner_email, last_activity DESC);

-- ----------------------------------------------------------------
-- Messages (append-only; seq is the append order)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS messages (
    seq          INTEGER PRIMARY KEY AUTOINCREMENT,
    chat_id      TEXT NOT NULL,                  -- FK -> chats(id)
    text         TEXT NOT NULL,
    is_from_user INTEGER NOT NULL,               -- boolean 0/1
    created_at   TEXT NOT NULL,

    FOREIGN KEY (chat_id) REFERENCES chats(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_messages_chat_seq ON messages(chat_id, seq);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
