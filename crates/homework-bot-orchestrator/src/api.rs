//! Client for the homework status endpoint.
//!
//! The endpoint is queried with `from_date=<cursor>` and an OAuth token and
//! answers with every homework updated since the cursor, newest first.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client, StatusCode};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{BotError, Result};

/// Source of homework status responses.
#[async_trait]
pub trait StatusApi: Send + Sync {
    /// Fetches every status update at or after `from_date` (unix seconds).
    ///
    /// Returns the decoded body without checking its shape.
    ///
    /// # Errors
    ///
    /// Returns `BotError::Fetch` on transport failure, a non-OK status, or
    /// a body that is not JSON.
    async fn fetch_statuses(&self, from_date: i64) -> Result<Value>;
}

/// HTTP client for the Practicum homework status endpoint.
#[derive(Clone)]
pub struct PracticumClient {
    client: Client,
    endpoint: String,
    token: String,
}

impl PracticumClient {
    /// Creates a client that gives up on a request after `timeout`.
    pub fn new(
        endpoint: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            BotError::config_invalid(
                format!("cannot build HTTP client: {e}"),
                "Check the system TLS configuration",
            )
        })?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token: token.into(),
        })
    }

    /// The endpoint this client queries.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl StatusApi for PracticumClient {
    async fn fetch_statuses(&self, from_date: i64) -> Result<Value> {
        info!(endpoint = %self.endpoint, from_date, "Requesting homework statuses");

        let response = self
            .client
            .get(&self.endpoint)
            .header(AUTHORIZATION, format!("OAuth {}", self.token))
            .query(&[("from_date", from_date)])
            .send()
            .await
            .map_err(|e| BotError::fetch(format!("cannot reach the status API: {e}")))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(BotError::fetch(format!("HTTP status {status}")));
        }
        debug!(%status, "Status API answered");

        response
            .json::<Value>()
            .await
            .map_err(|e| BotError::fetch(format!("response body is not JSON: {e}")))
    }
}

#[async_trait]
impl<T: StatusApi + ?Sized> StatusApi for std::sync::Arc<T> {
    async fn fetch_statuses(&self, from_date: i64) -> Result<Value> {
        (**self).fetch_statuses(from_date).await
    }
}
