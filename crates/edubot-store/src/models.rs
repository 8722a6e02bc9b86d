//! Domain model structs persisted in the SQLite database.

use chrono::{DateTime, SubsecRound, Utc};
use uuid::Uuid;

use edubot_shared::protocol::{ChatSummary, MessageView};
use edubot_shared::UserSettings;

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered account. The email is the identity key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    /// bcrypt hash; the plaintext never reaches the store.
    pub password_hash: String,
    pub settings: UserSettings,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// A conversation owned by one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chat {
    pub id: String,
    pub name: String,
    pub owner_email: String,
    pub created_at: DateTime<Utc>,
    /// Bumped on every append.
    pub last_activity: DateTime<Utc>,
}

impl Chat {
    /// A fresh, empty chat with a random id.
    pub fn new(name: impl Into<String>, owner_email: impl Into<String>) -> Self {
        let now = Utc::now().trunc_subsecs(6);
        Self {
            id: Uuid::new_v4().simple().to_string(),
            name: name.into(),
            owner_email: owner_email.into(),
            created_at: now,
            last_activity: now,
        }
    }

    pub fn summary(&self) -> ChatSummary {
        ChatSummary {
            chat_id: self.id.clone(),
            chat_name: self.name.clone(),
            created_at: self.created_at,
            last_activity: self.last_activity,
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// One entry of a chat's append-only history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Append sequence number, strictly increasing across the table.
    pub seq: i64,
    pub chat_id: String,
    pub text: String,
    pub is_from_user: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn view(&self) -> MessageView {
        MessageView {
            text: self.text.clone(),
            is_from_user: self.is_from_user,
            created_at: self.created_at,
        }
    }
}
