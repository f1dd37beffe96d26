//! Configuration for the homework bot.
//!
//! Credentials and the chat target come from the process environment.
//! Endpoints and timing have defaults that can be overridden the same way.

use std::time::Duration;

use crate::error::{BotError, Result};

/// Environment variable holding the status API OAuth token.
pub const PRACTICUM_TOKEN_VAR: &str = "PRACTICUM_TOKEN";
/// Environment variable holding the Telegram bot token.
pub const TELEGRAM_TOKEN_VAR: &str = "TELEGRAM_TOKEN";
/// Environment variable holding the chat that receives notifications.
pub const TELEGRAM_CHAT_ID_VAR: &str = "TELEGRAM_CHAT_ID";

const ENDPOINT_VAR: &str = "PRACTICUM_ENDPOINT";
const TELEGRAM_API_URL_VAR: &str = "TELEGRAM_API_URL";
const RETRY_PERIOD_VAR: &str = "RETRY_PERIOD_SECS";
const REQUEST_TIMEOUT_VAR: &str = "REQUEST_TIMEOUT_SECS";

/// Default homework status endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";

/// Default Telegram Bot API base URL.
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Default pause between poll cycles in seconds.
pub const DEFAULT_RETRY_PERIOD_SECS: u64 = 600;

/// Default timeout for a status API request in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 3;

/// Runtime configuration for the homework bot.
#[derive(Clone)]
pub struct Config {
    /// OAuth token for the status API.
    pub practicum_token: String,

    /// Telegram bot token.
    pub telegram_token: String,

    /// Chat that receives notifications.
    pub telegram_chat_id: String,

    /// Homework status endpoint URL.
    pub endpoint: String,

    /// Telegram Bot API base URL.
    pub telegram_api_url: String,

    /// Pause between poll cycles in seconds.
    pub retry_period_secs: u64,

    /// Status API request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("practicum_token", &"<redacted>")
            .field("telegram_token", &"<redacted>")
            .field("telegram_chat_id", &self.telegram_chat_id)
            .field("endpoint", &self.endpoint)
            .field("telegram_api_url", &self.telegram_api_url)
            .field("retry_period_secs", &self.retry_period_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Config {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `BotError::ConfigMissing` if any credential or the chat target
    /// is absent or empty, and `BotError::ConfigInvalid` if an optional
    /// timing value is not a positive integer.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// Every missing required variable is collected before failing, so the
    /// error names all of them at once.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let practicum_token = non_empty(PRACTICUM_TOKEN_VAR);
        let telegram_token = non_empty(TELEGRAM_TOKEN_VAR);
        let telegram_chat_id = non_empty(TELEGRAM_CHAT_ID_VAR);

        let (Some(practicum_token), Some(telegram_token), Some(telegram_chat_id)) =
            (&practicum_token, &telegram_token, &telegram_chat_id)
        else {
            let missing = [
                (PRACTICUM_TOKEN_VAR, practicum_token.is_none()),
                (TELEGRAM_TOKEN_VAR, telegram_token.is_none()),
                (TELEGRAM_CHAT_ID_VAR, telegram_chat_id.is_none()),
            ]
            .into_iter()
            .filter_map(|(name, absent)| absent.then_some(name));
            return Err(BotError::config_missing(missing));
        };

        let config = Self {
            practicum_token: practicum_token.clone(),
            telegram_token: telegram_token.clone(),
            telegram_chat_id: telegram_chat_id.clone(),
            endpoint: non_empty(ENDPOINT_VAR).unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            telegram_api_url: non_empty(TELEGRAM_API_URL_VAR)
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string()),
            retry_period_secs: parse_secs(
                RETRY_PERIOD_VAR,
                non_empty(RETRY_PERIOD_VAR),
                DEFAULT_RETRY_PERIOD_SECS,
            )?,
            request_timeout_secs: parse_secs(
                REQUEST_TIMEOUT_VAR,
                non_empty(REQUEST_TIMEOUT_VAR),
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// Checks that:
    /// - `retry_period_secs` is greater than 0
    /// - `request_timeout_secs` is greater than 0
    /// - `endpoint` and `telegram_api_url` are not empty
    pub fn validate(&self) -> Result<()> {
        if self.retry_period_secs == 0 {
            return Err(BotError::config_invalid(
                "retry period must be greater than 0",
                format!("Set {RETRY_PERIOD_VAR} or --retry-period to at least 1 second"),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(BotError::config_invalid(
                "request timeout must be greater than 0",
                format!("Set {REQUEST_TIMEOUT_VAR} to at least 1 second"),
            ));
        }

        if self.endpoint.trim().is_empty() || self.telegram_api_url.trim().is_empty() {
            return Err(BotError::config_invalid(
                "endpoint URLs must not be empty",
                format!("Unset {ENDPOINT_VAR} and {TELEGRAM_API_URL_VAR} to use the defaults"),
            ));
        }

        Ok(())
    }

    /// Pause between poll cycles.
    #[must_use]
    pub const fn retry_period(&self) -> Duration {
        Duration::from_secs(self.retry_period_secs)
    }

    /// Timeout applied to each status API request.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_secs(name: &str, raw: Option<String>, default: u64) -> Result<u64> {
    raw.map_or(Ok(default), |value| {
        value.trim().parse::<u64>().map_err(|e| {
            BotError::config_invalid(
                format!("{name} must be a whole number of seconds, got '{value}': {e}"),
                format!("Set {name} to a positive integer or unset it to use {default}"),
            )
        })
    })
}
