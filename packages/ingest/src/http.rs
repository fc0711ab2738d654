//! HTTP retrieval of remote cadastral documents.

use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;

use crate::config::HttpConfig;
use crate::error::{IngestError, Result};

/// User agent string identifying this tool.
const USER_AGENT: &str = concat!("cadastre-ingest/", env!("CARGO_PKG_VERSION"));

/// Base delay for exponential backoff (milliseconds).
const RETRY_BASE_DELAY_MS: u64 = 500;

/// Create an HTTP client with the configured timeout and user agent.
pub fn create_client(config: &HttpConfig) -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Whether `location` should be retrieved over HTTP.
#[must_use]
pub fn is_remote(location: &str) -> bool {
    let lower = location.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Delay before retry `attempt` (1-based): 500ms, 1000ms, 2000ms, ...
fn backoff_delay(attempt: u32) -> Duration {
    let shift = attempt.saturating_sub(1).min(16);
    Duration::from_millis(RETRY_BASE_DELAY_MS << shift)
}

/// Download content from a URL with retry logic.
///
/// Network errors and 5xx responses are retried with exponential backoff up
/// to `config.max_retries` attempts in total. 4xx responses fail at once.
/// Bodies larger than `config.max_response_size` are rejected.
pub fn download_bytes(client: &Client, url: &str, config: &HttpConfig) -> Result<Vec<u8>> {
    let attempts = config.max_retries.max(1);
    let mut last_error: Option<String> = None;

    for attempt in 0..attempts {
        if attempt > 0 {
            let delay = backoff_delay(attempt);
            tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "Retrying after delay");
            thread::sleep(delay);
        }

        match client.get(url).send() {
            Ok(response) => {
                let status = response.status();

                if status.is_server_error() {
                    tracing::warn!(
                        status = %status,
                        attempt = attempt + 1,
                        max_retries = attempts,
                        "Server error, will retry"
                    );
                    last_error = Some(format!("Server error: {status}"));
                    continue;
                }

                // Client errors won't succeed on retry
                let response = response.error_for_status()?;

                if let Some(length) = response.content_length() {
                    check_size(length, config.max_response_size)?;
                }
                let bytes = response.bytes()?;
                check_size(bytes.len() as u64, config.max_response_size)?;

                tracing::info!(url, bytes = bytes.len(), "Downloaded document");
                return Ok(bytes.to_vec());
            }
            Err(e) => {
                if e.is_connect() || e.is_timeout() {
                    tracing::warn!(
                        error = %e,
                        attempt = attempt + 1,
                        max_retries = attempts,
                        "Connection error, will retry"
                    );
                    last_error = Some(e.to_string());
                    continue;
                }
                return Err(IngestError::Http(e));
            }
        }
    }

    Err(IngestError::RetriesExhausted {
        attempts,
        message: last_error.unwrap_or_else(|| "Unknown error".to_string()),
    })
}

fn check_size(actual: u64, limit: u64) -> Result<()> {
    if actual > limit {
        return Err(IngestError::ResponseTooLarge { actual, limit });
    }
    Ok(())
}
