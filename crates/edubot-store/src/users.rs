//! CRUD operations for [`User`] records.

use chrono::{SubsecRound, Utc};
use rusqlite::{params, ErrorCode};
use uuid::Uuid;

use edubot_shared::{ColorTheme, ExpertiseLevel, UserSettings};

use crate::database::{decode_timestamp, encode_timestamp, Database};
use crate::error::{not_found, Result, StoreError};
use crate::models::User;

const USER_COLUMNS: &str = "id, email, password_hash, expertise_level, color_theme, created_at";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Register a new account with default settings.
    ///
    /// Fails with [`StoreError::EmailTaken`] if the email is already in use.
    pub fn create_user(&self, email: &str, password_hash: &str) -> Result<User> {
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            settings: UserSettings::default(),
            created_at: Utc::now().trunc_subsecs(6),
        };

        self.conn()
            .execute(
                "INSERT INTO users (id, email, password_hash, expertise_level, color_theme, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    user.id.to_string(),
                    user.email,
                    user.password_hash,
                    user.settings.expertise_level.as_str(),
                    user.settings.color_theme.as_str(),
                    encode_timestamp(&user.created_at),
                ],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(err, _)
                    if err.code == ErrorCode::ConstraintViolation =>
                {
                    StoreError::EmailTaken
                }
                other => StoreError::Sqlite(other),
            })?;

        tracing::debug!(user_id = %user.id, "user created");
        Ok(user)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a user by email.
    pub fn get_user_by_email(&self, email: &str) -> Result<User> {
        self.conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                params![email],
                row_to_user,
            )
            .map_err(not_found)
    }

    /// Whether an account exists for `email`.
    pub fn user_exists(&self, email: &str) -> Result<bool> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM users WHERE email = ?1",
            params![email],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Replace the settings of the user identified by `email`.
    pub fn update_user_settings(&self, email: &str, settings: &UserSettings) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE users SET expertise_level = ?1, color_theme = ?2 WHERE email = ?3",
            params![
                settings.expertise_level.as_str(),
                settings.color_theme.as_str(),
                email,
            ],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Remove an account. Returns `true` if a row was deleted.
    ///
    /// No HTTP route calls this; it exists for administration and tests.
    pub fn delete_user(&self, email: &str) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM users WHERE email = ?1", params![email])?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn conversion_error(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}

/// Map a `rusqlite::Row` to a [`User`].
fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let id_str: String = row.get(0)?;
    let email: String = row.get(1)?;
    let password_hash: String = row.get(2)?;
    let level_str: String = row.get(3)?;
    let theme_str: String = row.get(4)?;
    let created_str: String = row.get(5)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| conversion_error(0, e))?;
    let expertise_level: ExpertiseLevel = level_str.parse().map_err(|e| conversion_error(3, e))?;
    let color_theme: ColorTheme = theme_str.parse().map_err(|e| conversion_error(4, e))?;
    let created_at = decode_timestamp(&created_str, 5)?;

    Ok(User {
        id,
        email,
        password_hash,
        settings: UserSettings {
            expertise_level,
            color_theme,
        },
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_fetch_user() {
        let db = Database::open_in_memory().unwrap();
        let created = db.create_user("ada@example.com", "$2b$hash").unwrap();

        let fetched = db.get_user_by_email("ada@example.com").unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.password_hash, "$2b$hash");
        assert_eq!(fetched.settings, UserSettings::default());
        assert!(db.user_exists("ada@example.com").unwrap());
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("ada@example.com", "h1").unwrap();

        let err = db.create_user("ada@example.com", "h2").unwrap_err();
        assert!(matches!(err, StoreError::EmailTaken));
    }

    #[test]
    fn unknown_user_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.get_user_by_email("ghost@example.com"),
            Err(StoreError::NotFound)
        ));
        assert!(!db.user_exists("ghost@example.com").unwrap());
    }

    #[test]
    fn settings_update_persists() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("ada@example.com", "h").unwrap();

        let settings = UserSettings {
            expertise_level: ExpertiseLevel::Advanced,
            color_theme: ColorTheme::Dark,
        };
        db.update_user_settings("ada@example.com", &settings).unwrap();

        assert_eq!(db.get_user_by_email("ada@example.com").unwrap().settings, settings);
        assert!(matches!(
            db.update_user_settings("ghost@example.com", &settings),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn delete_user_removes_row() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("ada@example.com", "h").unwrap();
        assert!(db.delete_user("ada@example.com").unwrap());
        assert!(!db.delete_user("ada@example.com").unwrap());
        assert!(!db.user_exists("ada@example.com").unwrap());
    }
}
