//! HTTP client for the local action queue
//!
//! The queue exposes three endpoints:
//! - `GET get_action_mapping`: pending actions
//! - `GET add_camera_change`: pending camera changes
//! - `POST delete_action_mapping?action_id=&delete_all=`: mark consumed
//!
//! Audio referenced by an action is downloaded from its own URL.

pub mod busy;
pub mod types;

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;

use crate::config::NetworkConfig;
use crate::{Error, Result};

pub use busy::{BusyFlag, BusyGuard};
pub use types::{ActionBatch, ActionRecord, ApiEnvelope};

/// Client for the action queue endpoints
#[derive(Debug, Clone)]
pub struct ActionClient {
    client: reqwest::Client,
    get_url: String,
    delete_url: String,
    change_camera_url: String,
    timeout: Duration,
}

impl ActionClient {
    /// Create a client for the configured endpoints
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: &NetworkConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            get_url: config.get_url.clone(),
            delete_url: config.delete_url.clone(),
            change_camera_url: config.change_camera_url.clone(),
            timeout: config.timeout,
        })
    }

    /// Fetch the raw body of the pending actions endpoint
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, timeout or non-2xx status
    pub async fn fetch_actions(&self) -> Result<String> {
        self.get_text(&self.get_url).await
    }

    /// Fetch the raw body of the pending camera changes endpoint
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, timeout or non-2xx status
    pub async fn fetch_camera_changes(&self) -> Result<String> {
        self.get_text(&self.change_camera_url).await
    }

    /// Mark an action as consumed on the server
    ///
    /// Sent as a form POST with the id and flag in the query string.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, timeout or non-2xx status
    pub async fn delete_action(&self, id: i64, delete_all: bool) -> Result<()> {
        let url = url::Url::parse_with_params(
            &self.delete_url,
            &[
                ("action_id", id.to_string()),
                ("delete_all", delete_all.to_string()),
            ],
        )?;

        self.client
            .post(url)
            .timeout(self.timeout)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(String::new())
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    /// Download an audio payload
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, timeout or non-2xx status
    pub async fn fetch_audio(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.text().await?)
    }
}

/// Decode a queue response body
///
/// # Errors
///
/// Returns `Error::Decode` if the body is not a valid envelope
pub fn decode_envelope(body: &str) -> Result<ApiEnvelope> {
    serde_json::from_str(body).map_err(|e| Error::Decode(e.to_string()))
}
