//! Chat gateway (WhatsApp bot) client: `POST /send-message` and the `GET /` readiness probe.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Suffix the chat gateway expects on individual chat ids.
const CHAT_ID_SUFFIX: &str = "@c.us";

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("chat gateway request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("chat gateway api error: {0}")]
    Api(String),
}

/// Outbound side of the chat network.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send `message` to `phone`. Returns the id the gateway assigned, if it reported one.
    async fn send(&self, phone: &str, message: &str) -> Result<Option<String>, ChatError>;
    /// Succeeds when the gateway reports itself ready.
    async fn probe(&self) -> Result<(), ChatError>;
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    number: &'a str,
    message: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct SendResponse {
    #[serde(default)]
    id: Option<String>,
}

/// Chat id for a bare phone number (`56912345678` -> `56912345678@c.us`).
pub fn chat_id_for(phone: &str) -> String {
    if phone.contains(CHAT_ID_SUFFIX) {
        phone.to_string()
    } else {
        format!("{}{}", phone, CHAT_ID_SUFFIX)
    }
}

/// HTTP client for the chat gateway.
#[derive(Clone)]
pub struct ChatGatewayClient {
    base_url: String,
    probe_timeout: Duration,
    client: reqwest::Client,
}

impl ChatGatewayClient {
    pub fn new(base_url: impl Into<String>, probe_timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            probe_timeout,
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ChatTransport for ChatGatewayClient {
    async fn send(&self, phone: &str, message: &str) -> Result<Option<String>, ChatError> {
        let url = format!("{}/send-message", self.base_url);
        let number = chat_id_for(phone);
        let res = self
            .client
            .post(&url)
            .json(&SendRequest {
                number: &number,
                message,
            })
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(ChatError::Api(format!("{} {}", status, body)));
        }
        // The send already happened; an unreadable body only loses the correlation.
        let data: SendResponse = res.json().await.unwrap_or_default();
        Ok(data.id.filter(|id| !id.is_empty()))
    }

    async fn probe(&self) -> Result<(), ChatError> {
        let url = format!("{}/", self.base_url);
        let res = self
            .client
            .get(&url)
            .timeout(self.probe_timeout)
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(ChatError::Api(format!("readiness probe returned {}", res.status())));
        }
        Ok(())
    }
}
