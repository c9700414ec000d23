use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Discord API error: {0}")]
    #[diagnostic(code(calbridge::discord_api))]
    DiscordApi(#[from] serenity::Error),

    #[error("Environment error: {0}")]
    #[diagnostic(code(calbridge::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(calbridge::config))]
    Config(String),

    #[error("Google Calendar API error: {0}")]
    #[diagnostic(code(calbridge::google_calendar))]
    Calendar(String),

    /// An insert collided with an existing calendar event identity.
    /// Recoverable: the change handler converts this into an update.
    #[error("calendar event {event_id} already exists")]
    #[diagnostic(code(calbridge::conflict))]
    Conflict { event_id: String },

    /// Update or delete addressed a calendar event that is not there.
    /// For deletes this is treated as already satisfied; for updates it
    /// is surfaced, since it means a create was missed or the calendar
    /// was edited out from under us.
    #[error("calendar event {event_id} not found")]
    #[diagnostic(code(calbridge::not_found))]
    NotFound { event_id: String },

    #[error("Malformed scheduled event: {0}")]
    #[diagnostic(code(calbridge::transcode))]
    Transcode(String),

    #[error(transparent)]
    #[diagnostic(code(calbridge::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(calbridge::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(calbridge::other))]
    Other(String),
}

impl Error {
    /// Whether this error is an identity conflict on insert
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }

    /// Whether this error is a missing-event lookup
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
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

/// Helper to create Google Calendar errors
pub fn calendar_error(message: &str) -> Error {
    Error::Calendar(message.to_string())
}

/// Helper to create transcoding errors for malformed source events
pub fn transcode_error(message: &str) -> Error {
    Error::Transcode(message.to_string())
}
