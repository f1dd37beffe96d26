//! Error types for the homework bot.
//!
//! This module defines the error hierarchy for every stage of a poll cycle:
//! configuration loading, fetching the status endpoint, validating the
//! response shape, and delivering messages through the bot.

/// A specialized `Result` type for homework bot operations.
pub type Result<T> = std::result::Result<T, BotError>;

/// Errors that can occur while running the homework bot.
///
/// Only the configuration variants are fatal. Everything else is reported
/// to the user as a notification and retried on the next cycle.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// One or more required environment variables are absent or empty.
    #[error("Missing required environment variables: {}\n\nSuggestion: Export them or add them to your .env file", variables.join(", "))]
    ConfigMissing {
        /// Names of the missing variables.
        variables: Vec<String>,
    },

    /// An optional setting is present but cannot be used.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigInvalid {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Poll Cycle Errors
    // ========================================================================
    /// The status endpoint could not be reached or answered with a non-OK status.
    #[error("status API request failed: {cause}")]
    Fetch {
        /// The underlying transport error or HTTP status.
        cause: String,
    },

    /// The response or homework record does not match the documented contract.
    #[error("unexpected API response: {message}")]
    Schema {
        /// What part of the contract was violated.
        message: String,
    },

    // ========================================================================
    // Messaging Errors
    // ========================================================================
    /// The bot API rejected or failed to deliver a message.
    #[error("message was not sent: {message}")]
    MessagingTransport {
        /// Description of the delivery failure.
        message: String,
    },
}

impl BotError {
    /// Creates a new `ConfigMissing` error from the missing variable names.
    #[must_use]
    pub fn config_missing<I, S>(variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::ConfigMissing {
            variables: variables.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a new `ConfigInvalid` error with the given message and suggestion.
    #[must_use]
    pub fn config_invalid(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `Fetch` error.
    #[must_use]
    pub fn fetch(cause: impl std::fmt::Display) -> Self {
        Self::Fetch {
            cause: cause.to_string(),
        }
    }

    /// Creates a new `Schema` error.
    #[must_use]
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    /// Creates a new `MessagingTransport` error.
    #[must_use]
    pub fn messaging(message: impl std::fmt::Display) -> Self {
        Self::MessagingTransport {
            message: message.to_string(),
        }
    }

    /// Returns `true` if this error must stop the process at startup.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::ConfigMissing { .. } | Self::ConfigInvalid { .. })
    }

    /// Returns `true` if the poll loop reports this error and retries.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Schema { .. })
    }
}
