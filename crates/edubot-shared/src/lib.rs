//! # edubot-shared
//!
//! Types shared between the edubot server and its clients: user settings,
//! the JSON request/response bodies of the HTTP API, and a handful of
//! constants both sides agree on.

pub mod constants;
pub mod error;
pub mod protocol;
pub mod types;

pub use error::SettingsError;
pub use types::{ColorTheme, ExpertiseLevel, SettingsPatch, UserSettings};
