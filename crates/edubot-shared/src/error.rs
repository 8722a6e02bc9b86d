use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Unknown expertise level: {0}")]
    UnknownExpertiseLevel(String),

    #[error("Unknown color theme: {0}")]
    UnknownColorTheme(String),
}
