//! The append-only message log.
//!
//! There is no update or per-message delete: history only grows, and the
//! autoincrement `seq` column is the canonical order.

use chrono::{SubsecRound, Utc};
use rusqlite::params;

use crate::database::{decode_timestamp, encode_timestamp, Database};
use crate::error::{Result, StoreError};
use crate::models::Message;

impl Database {
    /// Append a message to a chat owned by `owner_email` and bump the chat's
    /// `last_activity`.
    ///
    /// Fails with [`StoreError::NotFound`] if the chat does not exist or is
    /// owned by someone else; nothing is written in that case.
    pub fn append_message(
        &self,
        chat_id: &str,
        owner_email: &str,
        text: &str,
        is_from_user: bool,
    ) -> Result<Message> {
        // Stored precision is microseconds; keep the returned value equal to
        // what a later read yields.
        let now = Utc::now().trunc_subsecs(6);
        let ts = encode_timestamp(&now);

        let tx = self.conn().unchecked_transaction()?;

        let touched = tx.execute(
            "UPDATE chats SET last_activity = ?1 WHERE id = ?2 AND owner_email = ?3",
            params![ts, chat_id, owner_email],
        )?;
        if touched == 0 {
            return Err(StoreError::NotFound);
        }

        tx.execute(
            "INSERT INTO messages (chat_id, text, is_from_user, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![chat_id, text, is_from_user, ts],
        )?;
        let seq = tx.last_insert_rowid();

        tx.commit()?;

        Ok(Message {
            seq,
            chat_id: chat_id.to_string(),
            text: text.to_string(),
            is_from_user,
            created_at: now,
        })
    }

    /// Full history of a chat in append order.
    ///
    /// Ownership is not checked here; callers resolve the chat with
    /// [`Database::get_chat`] first.
    pub fn get_messages_for_chat(&self, chat_id: &str) -> Result<Vec<Message>> {
        let mut stmt = self.conn().prepare(
            "SELECT seq, chat_id, text, is_from_user, created_at
             FROM messages
             WHERE chat_id = ?1
             ORDER BY seq ASC",
        )?;

        let rows = stmt.query_map(params![chat_id], row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let seq: i64 = row.get(0)?;
    let chat_id: String = row.get(1)?;
    let text: String = row.get(2)?;
    let is_from_user: bool = row.get(3)?;
    let ts_str: String = row.get(4)?;

    Ok(Message {
        seq,
        chat_id,
        text,
        is_from_user,
        created_at: decode_timestamp(&ts_str, 4)?,
    })
}
