//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.mesh-relay/config.json`) and environment.
//! Every field has a default so an empty `{}` file (or no file at all) runs the relay
//! against the usual container hostnames.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Chat gateway (WhatsApp bot) endpoint.
    #[serde(default)]
    pub chat: ChatConfig,

    /// Mesh bridge endpoint.
    #[serde(default)]
    pub mesh: MeshConfig,

    /// Rate limit and store bounds.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Startup wait for the chat gateway.
    #[serde(default)]
    pub readiness: ReadinessConfig,

    /// Informational commands (`!clima`, `!sismo`).
    #[serde(default)]
    pub info: InfoConfig,
}

/// Bind address and port for the relay's own HTTP surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port (default 8080).
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "0.0.0.0").
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    8080
}

fn default_gateway_bind() -> String {
    "0.0.0.0".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatConfig {
    /// Base URL of the chat gateway. Overridden by MESH_RELAY_CHAT_URL env.
    #[serde(default = "default_chat_base_url")]
    pub base_url: String,

    /// Per-request timeout for the readiness probe, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_chat_base_url() -> String {
    "http://whatsapp-bot:3000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: default_chat_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshConfig {
    /// Base URL of the mesh bridge. Overridden by MESH_RELAY_MESH_URL env.
    #[serde(default = "default_mesh_base_url")]
    pub base_url: String,
}

fn default_mesh_base_url() -> String {
    "http://meshtastic-bridge:8080".to_string()
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            base_url: default_mesh_base_url(),
        }
    }
}

/// Per-device rate limit and upper bounds on the in-memory stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitsConfig {
    #[serde(default = "default_max_messages_per_window")]
    pub max_messages_per_window: u32,

    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Once more devices than this are tracked, expired windows are pruned.
    #[serde(default = "default_max_tracked_devices")]
    pub max_tracked_devices: usize,

    /// Oldest correlations are evicted beyond this many entries.
    #[serde(default = "default_max_correlations")]
    pub max_correlations: usize,
}

fn default_max_messages_per_window() -> u32 {
    10
}

fn default_window_secs() -> u64 {
    60
}

fn default_max_tracked_devices() -> usize {
    4096
}

fn default_max_correlations() -> usize {
    10_000
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_messages_per_window: default_max_messages_per_window(),
            window_secs: default_window_secs(),
            max_tracked_devices: default_max_tracked_devices(),
            max_correlations: default_max_correlations(),
        }
    }
}

impl LimitsConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// How long to wait for the chat gateway at startup. `maxAttempts` absent means forever.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessConfig {
    #[serde(default = "default_readiness_interval_secs")]
    pub interval_secs: u64,

    #[serde(default)]
    pub max_attempts: Option<u32>,
}

fn default_readiness_interval_secs() -> u64 {
    3
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_readiness_interval_secs(),
            max_attempts: None,
        }
    }
}

/// Sources for `!clima` and `!sismo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoConfig {
    #[serde(default = "default_weather_base_url")]
    pub weather_base_url: String,

    /// Location used when `!clima` has no argument.
    #[serde(default = "default_location")]
    pub default_location: String,

    /// Atom feed of recent earthquakes.
    #[serde(default = "default_quake_feed_url")]
    pub quake_feed_url: String,

    /// Entries whose title contains this keyword are reported.
    #[serde(default = "default_quake_region")]
    pub quake_region: String,
}

fn default_weather_base_url() -> String {
    "https://wttr.in".to_string()
}

fn default_location() -> String {
    "Santiago".to_string()
}

fn default_quake_feed_url() -> String {
    "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/2.5_day.atom".to_string()
}

fn default_quake_region() -> String {
    "Chile".to_string()
}

impl Default for InfoConfig {
    fn default() -> Self {
        Self {
            weather_base_url: default_weather_base_url(),
            default_location: default_location(),
            quake_feed_url: default_quake_feed_url(),
            quake_region: default_quake_region(),
        }
    }
}

fn env_override(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

/// Resolve the chat gateway base URL: env MESH_RELAY_CHAT_URL overrides config. Trailing slashes are dropped.
pub fn resolve_chat_base_url(config: &Config) -> String {
    env_override("MESH_RELAY_CHAT_URL")
        .unwrap_or_else(|| config.chat.base_url.trim().to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Resolve the mesh bridge base URL: env MESH_RELAY_MESH_URL overrides config. Trailing slashes are dropped.
pub fn resolve_mesh_base_url(config: &Config) -> String {
    env_override("MESH_RELAY_MESH_URL")
        .unwrap_or_else(|| config.mesh.base_url.trim().to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("MESH_RELAY_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".mesh-relay").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path, the default path, or MESH_RELAY_CONFIG_PATH. Missing file => default config.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
