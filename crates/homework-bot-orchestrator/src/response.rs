//! Shape checks for the status API response.
//!
//! The endpoint documents a body of the form
//! `{"homeworks": [...], "current_date": <unix seconds>}`. Every check here
//! maps a violation to `BotError::Schema` so the poll loop can report it.

use serde_json::Value;
use tracing::info;

use crate::error::{BotError, Result};

/// Key holding the list of homework records, newest first.
pub const HOMEWORKS_KEY: &str = "homeworks";

/// Key holding the server time of the response.
pub const CURRENT_DATE_KEY: &str = "current_date";

/// Confirms the decoded response matches the documented contract.
///
/// This is a pure gate: the response is not transformed.
///
/// # Errors
///
/// Returns `BotError::Schema` if the response is not a JSON object, lacks
/// `homeworks` or `current_date`, or if `homeworks` is not an array.
///
/// # Examples
///
/// ```
/// use homework_bot_orchestrator::response::validate_response;
/// use serde_json::json;
///
/// assert!(validate_response(&json!({"homeworks": [], "current_date": 0})).is_ok());
/// assert!(validate_response(&json!([])).is_err());
/// ```
pub fn validate_response(response: &Value) -> Result<()> {
    let Some(body) = response.as_object() else {
        return Err(BotError::schema("response is not a mapping"));
    };

    if !body.contains_key(HOMEWORKS_KEY) || !body.contains_key(CURRENT_DATE_KEY) {
        return Err(BotError::schema(format!(
            "response is missing required key '{HOMEWORKS_KEY}' or '{CURRENT_DATE_KEY}'"
        )));
    }

    if !body[HOMEWORKS_KEY].is_array() {
        return Err(BotError::schema(format!(
            "'{HOMEWORKS_KEY}' is not a sequence"
        )));
    }

    info!("Status API response matches the documented shape");
    Ok(())
}

/// Returns the homework records of a validated response.
///
/// Yields an empty slice when the response was never validated.
pub fn homeworks(response: &Value) -> &[Value] {
    response
        .get(HOMEWORKS_KEY)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Counts the homework records in a validated response.
pub fn homework_count(response: &Value) -> usize {
    homeworks(response).len()
}

/// Extracts the server time used as the next poll cursor.
///
/// # Errors
///
/// Returns `BotError::Schema` if `current_date` is missing or not an integer.
pub fn current_date(response: &Value) -> Result<i64> {
    response
        .get(CURRENT_DATE_KEY)
        .and_then(Value::as_i64)
        .ok_or_else(|| BotError::schema(format!("'{CURRENT_DATE_KEY}' is not an integer")))
}
