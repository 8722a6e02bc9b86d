//! CRUD operations for [`Chat`] records.
//!
//! Every read and delete is scoped by the owner's email: a chat that exists
//! but belongs to someone else is indistinguishable from a missing one.

use rusqlite::params;

use crate::database::{decode_timestamp, encode_timestamp, Database};
use crate::error::{not_found, Result};
use crate::models::Chat;

impl Database {
    /// Insert a new chat.
    pub fn create_chat(&self, chat: &Chat) -> Result<()> {
        self.conn().execute(
            "INSERT INTO chats (id, name, owner_email, created_at, last_activity)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                chat.id,
                chat.name,
                chat.owner_email,
                encode_timestamp(&chat.created_at),
                encode_timestamp(&chat.last_activity),
            ],
        )?;
        tracing::debug!(chat_id = %chat.id, "chat created");
        Ok(())
    }

    /// Fetch a chat owned by `owner_email`.
    pub fn get_chat(&self, id: &str, owner_email: &str) -> Result<Chat> {
        self.conn()
            .query_row(
                "SELECT id, name, owner_email, created_at, last_activity
                 FROM chats
                 WHERE id = ?1 AND owner_email = ?2",
                params![id, owner_email],
                row_to_chat,
            )
            .map_err(not_found)
    }

    /// List a user's chats, most recently active first.
    pub fn list_chats_for_owner(&self, owner_email: &str) -> Result<Vec<Chat>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, name, owner_email, created_at, last_activity
             FROM chats
             WHERE owner_email = ?1
             ORDER BY last_activity DESC",
        )?;

        let rows = stmt.query_map(params![owner_email], row_to_chat)?;

        let mut chats = Vec::new();
        for row in rows {
            chats.push(row?);
        }
        Ok(chats)
    }

    /// Delete a chat (and, by cascade, its messages). Returns `true` only if
    /// the chat existed and belonged to `owner_email`.
    pub fn delete_chat(&self, id: &str, owner_email: &str) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM chats WHERE id = ?1 AND owner_email = ?2",
            params![id, owner_email],
        )?;
        Ok(affected > 0)
    }
}

/// Map a `rusqlite::Row` to a [`Chat`].
fn row_to_chat(row: &rusqlite::Row<'_>) -> rusqlite::Result<Chat> {
    let id: String = row.get(0)?;
    let name: String = row.get(1)?;
    let owner_email: String = row.get(2)?;
    let created_str: String = row.get(3)?;
    let activity_str: String = row.get(4)?;

    Ok(Chat {
        id,
        name,
        owner_email,
        created_at: decode_timestamp(&created_str, 3)?,
        last_activity: decode_timestamp(&activity_str, 4)?,
    })
}
