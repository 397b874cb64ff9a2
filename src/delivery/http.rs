//! HTTP delivery: `POST <base>/add` with the payload as the body.

use super::DeliveryClient;
use crate::error::{DeliveryError, Error, Result};
use crate::model::{Acknowledgment, TaskResult};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Delivery client backed by a pooled `reqwest::Client`.
///
/// The pool lives exactly as long as this value. Build one per run and let
/// it drop when the run ends; connections are released on every exit path.
#[derive(Debug, Clone)]
pub struct HttpDeliveryClient {
    client: Client,
    endpoint: String,
}

impl HttpDeliveryClient {
    /// Build a client for the accumulator at `base_url` (e.g. `http://127.0.0.1:8080`).
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/add", base_url.trim_end_matches('/')),
        })
    }

    /// Full URL results are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl DeliveryClient for HttpDeliveryClient {
    async fn submit(&self, result: &TaskResult) -> std::result::Result<Acknowledgment, DeliveryError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(result.payload.clone())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(DeliveryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let ack = serde_json::from_str(&body)?;
        debug!(index = result.sequence_index, "delivery acknowledged");
        Ok(Acknowledgment(ack))
    }
}
