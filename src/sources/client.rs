//! Shared HTTP client for all source adapters.

use crate::config::Config;
use crate::error::{PuckError, Result};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("puckcast/", env!("CARGO_PKG_VERSION"));

/// Default timeout for JSON endpoints.
const JSON_TIMEOUT: Duration = Duration::from_secs(30);

/// Large CSV downloads get a longer leash.
const CSV_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP client with bounded retry and polite pacing.
pub struct SourceClient {
    client: reqwest::Client,
    max_retries: u32,
}

impl SourceClient {
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(JSON_TIMEOUT)
            .build()
            .expect("failed to build http client");
        Self {
            client,
            max_retries: config.max_retries.max(1),
        }
    }

    /// GET a JSON document, retrying transient failures with backoff.
    pub async fn get_json(&self, url: &str) -> Result<Value> {
        let body = self.get_with_retry(url, JSON_TIMEOUT).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// GET a JSON document with query parameters.
    pub async fn get_json_with_params(&self, url: &str, params: &[(&str, &str)]) -> Result<Value> {
        let mut last_error = None;
        for attempt in 1..=self.max_retries {
            debug!(url, attempt, "source_request");
            let result = self
                .client
                .get(url)
                .query(params)
                .timeout(JSON_TIMEOUT)
                .send()
                .await
                .and_then(|r| r.error_for_status());
            match result {
                Ok(response) => return Ok(response.json().await?),
                Err(e) => {
                    warn!(url, attempt, error = %e, "source_request_failed");
                    last_error = Some(e);
                }
            }
            if attempt < self.max_retries {
                tokio::time::sleep(Duration::from_millis(500 * attempt as u64)).await;
            }
        }
        Err(PuckError::Http(last_error.expect("at least one attempt")))
    }

    /// GET a large text body (CSV feeds), with the longer timeout.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        self.get_with_retry(url, CSV_TIMEOUT).await
    }

    async fn get_with_retry(&self, url: &str, timeout: Duration) -> Result<String> {
        let mut last_error = None;
        for attempt in 1..=self.max_retries {
            debug!(url, attempt, "source_request");
            let result = self
                .client
                .get(url)
                .timeout(timeout)
                .send()
                .await
                .and_then(|r| r.error_for_status());
            match result {
                Ok(response) => return Ok(response.text().await?),
                Err(e) => {
                    warn!(url, attempt, error = %e, "source_request_failed");
                    last_error = Some(e);
                }
            }
            if attempt < self.max_retries {
                tokio::time::sleep(Duration::from_millis(500 * attempt as u64)).await;
            }
        }
        Err(PuckError::Http(last_error.expect("at least one attempt")))
    }
}
