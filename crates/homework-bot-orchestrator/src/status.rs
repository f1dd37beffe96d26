//! Review status interpretation.
//!
//! Turns the newest homework record of a response into the text the user
//! receives. Only the first record matters: the API returns newest first.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{BotError, Result};
use crate::response::homeworks;

// ============================================================================
// HomeworkStatus
// ============================================================================

/// Review status of a homework submission.
///
/// Each status carries a fixed verdict phrase shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HomeworkStatus {
    /// The reviewer accepted the work.
    Approved,
    /// The work is under review.
    Reviewing,
    /// The reviewer left remarks to address.
    Rejected,
}

impl HomeworkStatus {
    /// Every known status, in the order the API documents them.
    pub const ALL: [Self; 3] = [Self::Approved, Self::Reviewing, Self::Rejected];

    /// Returns the wire code of this status.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Reviewing => "reviewing",
            Self::Rejected => "rejected",
        }
    }

    /// Returns the verdict phrase shown to the user.
    ///
    /// # Examples
    ///
    /// ```
    /// use homework_bot_orchestrator::HomeworkStatus;
    ///
    /// assert_eq!(
    ///     HomeworkStatus::Reviewing.verdict(),
    ///     "Работа взята на проверку ревьюером."
    /// );
    /// ```
    #[must_use]
    pub const fn verdict(&self) -> &'static str {
        match self {
            Self::Approved => "Работа проверена: ревьюеру всё понравилось. Ура!",
            Self::Reviewing => "Работа взята на проверку ревьюером.",
            Self::Rejected => "Работа проверена: у ревьюера есть замечания.",
        }
    }
}

impl std::fmt::Display for HomeworkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for HomeworkStatus {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.code() == s)
            .ok_or_else(|| BotError::schema(format!("unknown status code '{s}'")))
    }
}

// ============================================================================
// Interpretation
// ============================================================================

/// Returns the newest homework record, or `None` if there is nothing new.
pub fn newest_homework(response: &Value) -> Option<&Value> {
    homeworks(response).first()
}

/// Builds the notification text for a single homework record.
///
/// # Errors
///
/// Returns `BotError::Schema` if the record lacks `homework_name` or
/// `status`, or if the status is not one of the known codes.
///
/// # Examples
///
/// ```
/// use homework_bot_orchestrator::parse_status;
/// use serde_json::json;
///
/// let text = parse_status(&json!({"homework_name": "hw1", "status": "rejected"})).unwrap();
/// assert_eq!(
///     text,
///     "Changed review status for \"hw1\". Работа проверена: у ревьюера есть замечания."
/// );
/// ```
pub fn parse_status(homework: &Value) -> Result<String> {
    let (Some(name), Some(code)) = (
        homework.get("homework_name").and_then(Value::as_str),
        homework.get("status").and_then(Value::as_str),
    ) else {
        return Err(BotError::schema(
            "homework record is missing homework_name/status",
        ));
    };
    info!(homework = name, "Homework record matches the documented shape");

    let status: HomeworkStatus = code.parse()?;
    debug!(homework = name, %status, "Received review status");

    Ok(format!(
        "Changed review status for \"{name}\". {}",
        status.verdict()
    ))
}

/// Interprets a validated response.
///
/// Returns `Ok(None)` when `homeworks` is empty and the notification text
/// for the newest record otherwise.
pub fn interpret(response: &Value) -> Result<Option<String>> {
    newest_homework(response).map(parse_status).transpose()
}
