//! Homework Bot Orchestrator
//!
//! Polls the homework review status API, turns the newest status into a
//! message, and relays it through a Telegram bot without repeating itself.

pub mod api;
pub mod config;
pub mod error;
pub mod notifier;
pub mod poller;
pub mod response;
pub mod status;
pub mod telegram;

pub use api::{PracticumClient, StatusApi};
pub use config::Config;
pub use error::{BotError, Result};
pub use notifier::{MessageSender, Notifier, NotifyOutcome};
pub use poller::{failure_message, CycleOutcome, PollState, Poller, FAILURE_PREFIX};
pub use response::validate_response;
pub use status::{interpret, newest_homework, parse_status, HomeworkStatus};
pub use telegram::TelegramBot;
