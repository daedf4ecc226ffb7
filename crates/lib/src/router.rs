//! Message routing between the mesh bridge and the chat gateway.
//!
//! Outbound (mesh -> chat): rate limit, interpret the command, send through the chat gateway
//! and remember which device asked for the send. Inbound (chat -> mesh): a reply quoting a
//! remembered message is forwarded to that device. No lock is held across a network call;
//! the stores only lock inside `allow`, `record` and `lookup`.

use std::sync::Arc;

use crate::channels::{
    ChatError, ChatTransport, InboundChatMessage, InboundMeshMessage, MeshTransport,
};
use crate::command::{CommandError, CommandInterpreter, InfoKind, Intent, HELP_TEXT};
use crate::correlation::ReplyCorrelator;
use crate::info::{InfoError, InfoSource};
use crate::ratelimit::RateLimit;

pub const PONG: &str = "pong";
pub const SENT_ACK: &str = "✅ WhatsApp message sent!";
pub const RECEIVED_ACK: &str = "✅ Command received!";
pub const WEATHER_UNAVAILABLE: &str = "No se pudo obtener el clima.";
pub const QUAKE_UNAVAILABLE: &str = "No se pudo obtener información de sismos.";
pub const QUAKE_UNREADABLE: &str = "No se pudo leer la información de sismos.";

/// Why an outbound request was refused. Display text is what the mesh user sees.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("❌ Rate limit exceeded. Please wait before sending more messages.")]
    RateLimited,
    #[error(transparent)]
    Malformed(#[from] CommandError),
    #[error("❌ Could not send WhatsApp message.")]
    SendFailed(#[source] ChatError),
}

/// What happened to an inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundOutcome {
    /// Not a reply to anything.
    NoQuote,
    /// Quoted id unknown to this process.
    Unroutable,
    Forwarded { device_id: String },
    /// Device resolved but the bridge call failed; logged only.
    ForwardFailed { device_id: String },
}

/// Routes events between the two transports. Cheap to share behind an `Arc`.
pub struct MessageRouter {
    interpreter: CommandInterpreter,
    limiter: Arc<dyn RateLimit>,
    correlator: Arc<dyn ReplyCorrelator>,
    chat: Arc<dyn ChatTransport>,
    mesh: Arc<dyn MeshTransport>,
    info: Arc<dyn InfoSource>,
}

impl MessageRouter {
    pub fn new(
        interpreter: CommandInterpreter,
        limiter: Arc<dyn RateLimit>,
        correlator: Arc<dyn ReplyCorrelator>,
        chat: Arc<dyn ChatTransport>,
        mesh: Arc<dyn MeshTransport>,
        info: Arc<dyn InfoSource>,
    ) -> Self {
        Self {
            interpreter,
            limiter,
            correlator,
            chat,
            mesh,
            info,
        }
    }

    /// Handle a command from a mesh device. Returns the text reply for the device.
    pub async fn handle_outbound(&self, msg: &InboundMeshMessage) -> Result<String, RouteError> {
        if !self.limiter.allow(&msg.from) {
            log::info!("rate limit exceeded for device {}", msg.from);
            return Err(RouteError::RateLimited);
        }
        log::info!("mesh message from {}: {}", msg.from, msg.message);

        let intent = self.interpreter.interpret(&msg.message).map_err(|e| {
            log::debug!("malformed command from {}: {}", msg.from, e);
            RouteError::from(e)
        })?;
        match intent {
            Intent::SendToChat { phone, body } => self.send_to_chat(&msg.from, &phone, &body).await,
            Intent::Ping => Ok(PONG.to_string()),
            Intent::Help => Ok(HELP_TEXT.to_string()),
            Intent::InfoQuery { kind, argument } => Ok(self.info_reply(kind, &argument).await),
            Intent::Unrecognized { raw } => {
                log::debug!("unrecognized command from {}: {:?}", msg.from, raw);
                Ok(RECEIVED_ACK.to_string())
            }
        }
    }

    async fn send_to_chat(&self, device_id: &str, phone: &str, body: &str) -> Result<String, RouteError> {
        let message_id = match self.chat.send(phone, body).await {
            Ok(id) => id,
            Err(e) => {
                log::warn!("failed to forward message to chat gateway: {}", e);
                return Err(RouteError::SendFailed(e));
            }
        };
        match message_id {
            Some(id) => {
                self.correlator.record(&id, device_id);
                log::info!("mapped chat message {} to device {}", id, device_id);
            }
            None => {
                log::info!("chat gateway returned no message id; replies to this send cannot be routed");
            }
        }
        Ok(SENT_ACK.to_string())
    }

    async fn info_reply(&self, kind: InfoKind, argument: &str) -> String {
        match kind {
            InfoKind::Weather => match self.info.weather(argument).await {
                Ok(report) => report,
                Err(e) => {
                    log::warn!("weather lookup for {:?} failed: {}", argument, e);
                    WEATHER_UNAVAILABLE.to_string()
                }
            },
            InfoKind::Earthquake => match self.info.latest_quake(argument).await {
                Ok(Some(title)) => format!("Último sismo en {}:\n{}", argument, title),
                Ok(None) => format!("No hay sismos recientes en {}.", argument),
                Err(InfoError::Feed(e)) => {
                    log::warn!("earthquake feed unreadable: {}", e);
                    QUAKE_UNREADABLE.to_string()
                }
                Err(e) => {
                    log::warn!("earthquake feed lookup failed: {}", e);
                    QUAKE_UNAVAILABLE.to_string()
                }
            },
        }
    }

    /// Handle a message from the chat gateway. Never fails: the chat side is always acknowledged.
    pub async fn handle_inbound(&self, msg: &InboundChatMessage) -> InboundOutcome {
        log::info!("chat message from {}: {}", msg.from, msg.body);
        let Some(quoted_id) = msg.quoted_id() else {
            return InboundOutcome::NoQuote;
        };
        let Some(device_id) = self.correlator.lookup(quoted_id) else {
            log::debug!("no device mapped for quoted message {}", quoted_id);
            return InboundOutcome::Unroutable;
        };
        match self.mesh.forward(&device_id, &msg.body).await {
            Ok(()) => {
                log::info!("forwarded chat reply to mesh device {}", device_id);
                InboundOutcome::Forwarded { device_id }
            }
            Err(e) => {
                log::warn!("forward to mesh device {} failed: {}", device_id, e);
                InboundOutcome::ForwardFailed { device_id }
            }
        }
    }
}
