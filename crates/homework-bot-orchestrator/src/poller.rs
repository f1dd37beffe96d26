//! The poll loop.
//!
//! Each cycle fetches the status endpoint, validates the response,
//! interprets the newest homework and notifies the user. Any failure along
//! the way becomes a notification of its own, subject to the same duplicate
//! suppression. The loop then sleeps for the retry period and starts over.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::api::StatusApi;
use crate::error::{BotError, Result};
use crate::notifier::{MessageSender, Notifier, NotifyOutcome};
use crate::response::{current_date, homework_count, validate_response};
use crate::status::interpret;

/// Prefix of every error notification.
pub const FAILURE_PREFIX: &str = "Program failure: ";

/// Formats the notification text for a failed cycle.
///
/// # Examples
///
/// ```
/// use homework_bot_orchestrator::{failure_message, BotError};
///
/// let text = failure_message(&BotError::schema("response is not a mapping"));
/// assert_eq!(text, "Program failure: unexpected API response: response is not a mapping");
/// ```
#[must_use]
pub fn failure_message(err: &BotError) -> String {
    format!("{FAILURE_PREFIX}{err}")
}

// ============================================================================
// PollState
// ============================================================================

/// Progress of the poll loop.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PollState {
    /// Lower bound (unix seconds) for the next fetch.
    pub cursor: i64,

    /// Number of completed cycles.
    pub cycles: u64,

    /// When the last cycle finished.
    pub last_cycle_at: Option<DateTime<Utc>>,
}

impl PollState {
    /// Creates a state that fetches everything on the first cycle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn finish_cycle(&mut self) {
        self.cycles += 1;
        self.last_cycle_at = Some(Utc::now());
    }
}

// ============================================================================
// CycleOutcome
// ============================================================================

/// Result of a single poll cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CycleOutcome {
    /// The response held no homeworks; nothing was sent.
    NoUpdate,
    /// A status message was produced and handed to the notifier.
    Notified {
        /// The status message.
        text: String,
        /// What the notifier did with it.
        outcome: NotifyOutcome,
    },
    /// The cycle failed and the error was handed to the notifier.
    Failed {
        /// The error notification.
        text: String,
        /// What the notifier did with it.
        outcome: NotifyOutcome,
    },
}

/// A status message ready to send, with the cursor it unlocks.
struct StatusUpdate {
    text: String,
    current_date: i64,
}

// ============================================================================
// Poller
// ============================================================================

/// Drives fetch, validation, interpretation and notification.
pub struct Poller<A, S> {
    api: A,
    notifier: Notifier<S>,
    state: PollState,
    retry_period: Duration,
}

impl<A: StatusApi, S: MessageSender> Poller<A, S> {
    /// Creates a poller starting from cursor 0.
    pub fn new(api: A, notifier: Notifier<S>, retry_period: Duration) -> Self {
        Self {
            api,
            notifier,
            state: PollState::new(),
            retry_period,
        }
    }

    /// Current loop progress.
    pub const fn state(&self) -> &PollState {
        &self.state
    }

    /// The notifier, with its duplicate-suppression state.
    pub const fn notifier(&self) -> &Notifier<S> {
        &self.notifier
    }

    /// Runs one cycle without sleeping.
    ///
    /// The cursor moves to the response's `current_date` only once the
    /// newest homework was interpreted and its message was sent or was
    /// already the last message sent. A failed interpretation or delivery
    /// leaves the cursor in place so the same homework is fetched again.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let outcome = match self.check_for_update().await {
            Ok(None) => CycleOutcome::NoUpdate,
            Ok(Some(update)) => {
                let outcome = self.notifier.notify(&update.text).await;
                if outcome.is_delivered() {
                    debug!(
                        from = self.state.cursor,
                        to = update.current_date,
                        "Advancing poll cursor"
                    );
                    self.state.cursor = update.current_date;
                }
                CycleOutcome::Notified {
                    text: update.text,
                    outcome,
                }
            }
            Err(e) => {
                let text = failure_message(&e);
                error!(error = %e, "{text}");
                let outcome = self.notifier.notify(&text).await;
                CycleOutcome::Failed { text, outcome }
            }
        };

        self.state.finish_cycle();
        outcome
    }

    /// Runs cycles forever, sleeping for the retry period after each one.
    ///
    /// Returns once `shutdown` completes; a cycle in progress is allowed to
    /// finish first.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!(
            retry_period_secs = self.retry_period.as_secs(),
            "Poll loop started"
        );

        loop {
            let outcome = self.run_cycle().await;
            debug!(cycle = self.state.cycles, ?outcome, "Cycle finished");

            tokio::select! {
                () = &mut shutdown => {
                    info!(cycles = self.state.cycles, "Shutting down poll loop");
                    break;
                }
                () = sleep(self.retry_period) => {}
            }
        }
    }

    async fn check_for_update(&self) -> Result<Option<StatusUpdate>> {
        let response: Value = self.api.fetch_statuses(self.state.cursor).await?;
        validate_response(&response)?;

        if homework_count(&response) == 0 {
            info!(cursor = self.state.cursor, "No review status update yet");
            return Ok(None);
        }

        let current_date = current_date(&response)?;
        let Some(text) = interpret(&response)? else {
            return Ok(None);
        };
        Ok(Some(StatusUpdate { text, current_date }))
    }
}
