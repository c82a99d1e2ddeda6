//! Battery status endpoint client

use crate::WidgetError;
use serde_json::Value;
use std::time::Duration;

/// Fetches raw status payloads from the monitor endpoint
#[derive(Debug, Clone)]
pub struct StatusClient {
    endpoint: String,
    client: reqwest::Client,
}

impl StatusClient {
    /// Create a client for `endpoint` with a per-request timeout
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, WidgetError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(format!("batmon-widget/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch the current payload
    ///
    /// Non-2xx responses and bodies that are not JSON are errors; the shape
    /// of the JSON is not checked here.
    pub async fn fetch(&self) -> Result<Value, WidgetError> {
        tracing::debug!("Polling battery status at {}", self.endpoint);

        let response = self.client.get(&self.endpoint).send().await?;

        if !response.status().is_success() {
            return Err(WidgetError::Status(response.status()));
        }

        let body = response.text().await?;
        let payload = serde_json::from_str(&body)?;
        Ok(payload)
    }
}
