//! Mesh bridge client: `POST /send-message` with `{to, message}`.

use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error("mesh bridge request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("mesh bridge api error: {0}")]
    Api(String),
}

/// Outbound side of the radio mesh.
#[async_trait]
pub trait MeshTransport: Send + Sync {
    async fn forward(&self, device_id: &str, message: &str) -> Result<(), MeshError>;
}

#[derive(Debug, Serialize)]
struct ForwardRequest<'a> {
    to: &'a str,
    message: &'a str,
}

#[derive(Clone)]
pub struct MeshBridgeClient {
    base_url: String,
    client: reqwest::Client,
}

impl MeshBridgeClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl MeshTransport for MeshBridgeClient {
    async fn forward(&self, device_id: &str, message: &str) -> Result<(), MeshError> {
        let url = format!("{}/send-message", self.base_url);
        let res = self
            .client
            .post(&url)
            .json(&ForwardRequest {
                to: device_id,
                message,
            })
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(MeshError::Api(format!("{} {}", status, body)));
        }
        Ok(())
    }
}
