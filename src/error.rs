use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Discord API error: {0}")]
    #[diagnostic(code(calendar_sync::discord_api))]
    DiscordApi(#[from] serenity::Error),

    #[error("Environment error: {0}")]
    #[diagnostic(
        code(calendar_sync::environment),
        help("Set the variable in the process environment or in a .env file")
    )]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(calendar_sync::config))]
    Config(String),

    #[error("Google authentication error: {0}")]
    #[diagnostic(code(calendar_sync::auth))]
    Auth(String),

    #[error("Google Calendar query failed: {0}")]
    #[diagnostic(code(calendar_sync::calendar_query))]
    CalendarQuery(String),

    #[error("Google Calendar insert failed: {0}")]
    #[diagnostic(code(calendar_sync::calendar_insert))]
    CalendarInsert(String),

    #[error("Event sync error: {0}")]
    #[diagnostic(code(calendar_sync::event_sync))]
    EventSync(String),

    #[error(transparent)]
    #[diagnostic(code(calendar_sync::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(calendar_sync::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(calendar_sync::other))]
    Other(String),
}

// Implement From for TOML deserialization errors
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type BotResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create authentication errors
pub fn auth_error(message: &str) -> Error {
    Error::Auth(message.to_string())
}

/// Helper to create calendar listing errors
pub fn calendar_query_error(message: &str) -> Error {
    Error::CalendarQuery(message.to_string())
}

/// Helper to create calendar insertion errors
pub fn calendar_insert_error(message: &str) -> Error {
    Error::CalendarInsert(message.to_string())
}

/// Helper to create event sync actor errors
pub fn event_sync_error(message: &str) -> Error {
    Error::EventSync(message.to_string())
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
