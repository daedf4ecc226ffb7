//! Gateway: HTTP surface of the relay.
//!
//! `POST /send-message` takes commands from the mesh bridge, `POST /receive-message` takes
//! chat messages from the chat gateway, `GET /health` and `GET /` are probes.

mod server;

pub use server::{app, build_router, run_gateway, status_for, GatewayState};
