use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::info;

use crate::error::{Result, TrafficError};

/// Sends the merged payload to the collection endpoint.
#[derive(Clone)]
pub struct UploadClient {
    client: Client,
    url: String,
    key: String,
}

impl UploadClient {
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: Client::builder().build()?,
            url: url.into(),
            key: key.into(),
        })
    }

    pub async fn put(&self, payload: &Value) -> Result<StatusCode> {
        let response = self
            .client
            .put(&self.url)
            .header("X-Api-Key", &self.key)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        info!(url = %self.url, %status, "Upload response");
        if !status.is_success() {
            return Err(TrafficError::Status {
                endpoint: self.url.clone(),
                status,
            });
        }
        Ok(status)
    }
}
