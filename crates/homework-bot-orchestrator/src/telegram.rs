//! Telegram Bot API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{BotError, Result};
use crate::notifier::MessageSender;

/// Timeout for a single `sendMessage` call.
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Request body for `sendMessage`.
#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Envelope every Bot API method answers with.
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends messages through the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramBot {
    client: Client,
    api_url: String,
    token: String,
}

impl TelegramBot {
    /// Creates a bot client talking to `api_url` (normally `https://api.telegram.org`).
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(|e| {
                BotError::config_invalid(
                    format!("cannot build HTTP client: {e}"),
                    "Check the system TLS configuration",
                )
            })?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_url, self.token)
    }
}

#[async_trait]
impl MessageSender for TelegramBot {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&SendMessageRequest { chat_id, text })
            .send()
            .await
            // Strip the URL: it embeds the bot token.
            .map_err(|e| BotError::messaging(e.without_url()))?;

        let status = response.status();
        let envelope = response.json::<ApiEnvelope>().await.ok();

        match envelope {
            Some(ApiEnvelope { ok: true, .. }) if status.is_success() => Ok(()),
            Some(ApiEnvelope {
                description: Some(description),
                ..
            }) => Err(BotError::messaging(format!("{status}: {description}"))),
            _ => Err(BotError::messaging(format!("Bot API answered {status}"))),
        }
    }
}
