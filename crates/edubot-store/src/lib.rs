//! # edubot-store
//!
//! Persistence for the edubot server, backed by SQLite.
//!
//! The crate exposes a synchronous `Database` handle that wraps a
//! `rusqlite::Connection` and provides typed helpers for users, chats, the
//! append-only message log, and the revoked-token registry. Callers that live
//! on an async runtime share it behind a mutex.

pub mod chats;
pub mod database;
pub mod messages;
pub mod migrations;
pub mod models;
pub mod revoked_tokens;
pub mod users;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
