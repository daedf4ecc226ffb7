//! Transports to the two external endpoints.
//!
//! The chat gateway sends messages into the chat network and reports an id per send; the
//! mesh bridge relays text to radio devices. Both are reached over HTTP; the traits are the
//! seam the router is written against.

mod chat;
mod inbound;
mod mesh;

pub use chat::{chat_id_for, ChatError, ChatGatewayClient, ChatTransport};
pub use inbound::{InboundChatMessage, InboundMeshMessage, QuotedMessage};
pub use mesh::{MeshBridgeClient, MeshError, MeshTransport};
