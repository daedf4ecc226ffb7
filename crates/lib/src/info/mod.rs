//! Informational lookups answered directly to the mesh: weather (`!clima`) and the latest
//! earthquake in a region (`!sismo`).

mod quake;
mod weather;

use async_trait::async_trait;

pub use quake::latest_matching_entry;

#[derive(Debug, thiserror::Error)]
pub enum InfoError {
    #[error("info request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("info api error: {0}")]
    Api(String),
    #[error("invalid info url: {0}")]
    Url(String),
    #[error("unreadable feed: {0}")]
    Feed(String),
}

/// Source of informational replies.
#[async_trait]
pub trait InfoSource: Send + Sync {
    /// Short weather report for `location`.
    async fn weather(&self, location: &str) -> Result<String, InfoError>;
    /// Title of the most recent feed entry mentioning `region`, if any.
    async fn latest_quake(&self, region: &str) -> Result<Option<String>, InfoError>;
}

/// HTTP-backed info source (wttr.in and an Atom earthquake feed).
#[derive(Clone)]
pub struct HttpInfoSource {
    weather_base_url: String,
    quake_feed_url: String,
    client: reqwest::Client,
}

impl HttpInfoSource {
    pub fn new(weather_base_url: impl Into<String>, quake_feed_url: impl Into<String>) -> Self {
        Self {
            weather_base_url: weather_base_url.into().trim_end_matches('/').to_string(),
            quake_feed_url: quake_feed_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl InfoSource for HttpInfoSource {
    async fn weather(&self, location: &str) -> Result<String, InfoError> {
        let url = weather::report_url(&self.weather_base_url, location)?;
        let res = self.client.get(url).send().await?;
        if !res.status().is_success() {
            return Err(InfoError::Api(res.status().to_string()));
        }
        Ok(res.text().await?.trim().to_string())
    }

    async fn latest_quake(&self, region: &str) -> Result<Option<String>, InfoError> {
        let res = self.client.get(&self.quake_feed_url).send().await?;
        if !res.status().is_success() {
            return Err(InfoError::Api(res.status().to_string()));
        }
        let xml = res.text().await?;
        latest_matching_entry(&xml, region)
    }
}
