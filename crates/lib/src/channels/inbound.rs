//! Wire payloads posted to the relay by the chat gateway and the mesh bridge.

use serde::{Deserialize, Serialize};

/// A prior chat message that an inbound reply quotes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotedMessage {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub body: String,
}

/// Chat message forwarded by the chat gateway (`POST /receive-message`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundChatMessage {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quoted: Option<QuotedMessage>,
}

impl InboundChatMessage {
    /// Id of the quoted message, when the reply quotes one with a non-empty id.
    pub fn quoted_id(&self) -> Option<&str> {
        self.quoted
            .as_ref()
            .map(|q| q.id.as_str())
            .filter(|id| !id.is_empty())
    }
}

/// Command text relayed from a mesh device (`POST /send-message`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMeshMessage {
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub timestamp: i64,
}
