//! Rate-limited HTTP fetcher
//!
//! This module handles all outbound HTTP requests of the pipeline:
//! - Building the HTTP client with a proper user agent and timeouts
//! - JSON API calls, preceded by a fixed delay
//! - Binary image downloads, preceded by a (shorter) fixed delay
//! - Error classification for log lines
//!
//! Failures never surface as errors: every call returns a sentinel (`None` /
//! `false`) and the caller treats the unit as not completed.

use crate::config::Config;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The mirror configuration (user agent and timeouts)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.header_value())
        .timeout(Duration::from_secs(config.rate_limit.timeout_secs))
        .connect_timeout(Duration::from_secs(config.rate_limit.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Describes a transport error for log lines
fn describe_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else if e.is_decode() {
        format!("Invalid response body: {}", e)
    } else {
        e.to_string()
    }
}

/// Sibling path a download is streamed into before being renamed into place
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// HTTP fetcher with a fixed, non-adaptive delay before every request
#[derive(Debug, Clone)]
pub struct RateLimitedFetcher {
    client: Client,
    request_delay: Duration,
    image_delay: Duration,
}

impl RateLimitedFetcher {
    /// Creates a fetcher from the mirror configuration
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(
            build_http_client(config)?,
            Duration::from_millis(config.rate_limit.request_delay_ms),
            Duration::from_millis(config.rate_limit.image_delay_ms),
        ))
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client, request_delay: Duration, image_delay: Duration) -> Self {
        Self {
            client,
            request_delay,
            image_delay,
        }
    }

    /// Fetches a JSON document
    ///
    /// Sleeps the request delay, then issues `GET url?params`.
    ///
    /// # Returns
    ///
    /// * `Some(Value)` - HTTP 200 with a parseable JSON body
    /// * `None` - Non-200 status, transport error, timeout or invalid JSON
    pub async fn fetch_json(&self, url: &str, params: &[(&str, &str)]) -> Option<Value> {
        tokio::time::sleep(self.request_delay).await;

        let response = match self.client.get(url).query(params).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Request to {} failed: {}", url, describe_error(&e));
                return None;
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            tracing::error!("HTTP {} for {} {:?}", status.as_u16(), url, params);
            return None;
        }

        match response.json::<Value>().await {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Failed to read JSON from {}: {}", url, describe_error(&e));
                None
            }
        }
    }

    /// Downloads a binary resource to `path`
    ///
    /// If `path` already exists this returns `true` immediately, without a
    /// delay or any network traffic. Otherwise sleeps the image delay, fetches
    /// the resource and writes it through a `.part` file renamed into place,
    /// so an interrupted download never leaves a file that looks complete.
    ///
    /// # Returns
    ///
    /// * `true` - The file exists at `path`
    /// * `false` - Non-200 status, transport error or local write failure
    pub async fn fetch_binary_to_path(&self, url: &str, path: &Path) -> bool {
        if path.exists() {
            tracing::debug!("{} already exists, skipping download", path.display());
            return true;
        }

        tokio::time::sleep(self.image_delay).await;

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Download of {} failed: {}", url, describe_error(&e));
                return false;
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!("Could not download {}: HTTP {}", url, status.as_u16());
            return false;
        }

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("Download of {} failed: {}", url, describe_error(&e));
                return false;
            }
        };

        let part = partial_path(path);
        if let Err(e) = tokio::fs::write(&part, &bytes).await {
            tracing::error!("Failed to write {}: {}", part.display(), e);
            return false;
        }
        if let Err(e) = tokio::fs::rename(&part, path).await {
            tracing::error!("Failed to move {} into place: {}", path.display(), e);
            let _ = tokio::fs::remove_file(&part).await;
            return false;
        }

        true
    }
}
