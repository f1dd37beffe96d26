//! Duplicate-suppressing message delivery.
//!
//! The [`Notifier`] remembers the last text it delivered and refuses to send
//! the same text twice in a row. Delivery failures are logged and swallowed;
//! they never reach the poll loop.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::Result;

/// A bot client able to deliver text to a chat.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Sends `text` to `chat_id`.
    ///
    /// # Errors
    ///
    /// Returns `BotError::MessagingTransport` if the message was not delivered.
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<()>;
}

#[async_trait]
impl<T: MessageSender + ?Sized> MessageSender for Arc<T> {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
        (**self).send_message(chat_id, text).await
    }
}

/// What happened to a notification candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyOutcome {
    /// The text was delivered and is now the last sent text.
    Sent,
    /// The text equals the last sent text; nothing was sent.
    Suppressed,
    /// The bot client failed; the last sent text is unchanged.
    Failed,
}

impl NotifyOutcome {
    /// Returns `true` if the user has seen this text, now or earlier.
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        matches!(self, Self::Sent | Self::Suppressed)
    }
}

/// Sends notifications to a single chat, suppressing immediate repeats.
pub struct Notifier<S> {
    sender: S,
    chat_id: String,
    last_sent: Option<String>,
}

impl<S: MessageSender> Notifier<S> {
    /// Creates a notifier with no message sent yet.
    pub fn new(sender: S, chat_id: impl Into<String>) -> Self {
        Self {
            sender,
            chat_id: chat_id.into(),
            last_sent: None,
        }
    }

    /// Delivers `text` unless it is identical to the last delivered text.
    ///
    /// Only the single most recent text is remembered: sending A, B, A
    /// results in three deliveries.
    pub async fn notify(&mut self, text: &str) -> NotifyOutcome {
        if self.last_sent.as_deref() == Some(text) {
            return NotifyOutcome::Suppressed;
        }

        match self.sender.send_message(&self.chat_id, text).await {
            Ok(()) => {
                self.last_sent = Some(text.to_string());
                debug!(chat_id = %self.chat_id, text, "Message sent");
                NotifyOutcome::Sent
            }
            Err(e) => {
                error!(chat_id = %self.chat_id, error = %e, "Message not sent");
                NotifyOutcome::Failed
            }
        }
    }

    /// The most recently delivered text, if any.
    pub fn last_sent(&self) -> Option<&str> {
        self.last_sent.as_deref()
    }

    /// The chat that receives notifications.
    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    /// The underlying bot client.
    pub fn sender(&self) -> &S {
        &self.sender
    }
}
