//! Gateway HTTP server.

use crate::channels::{
    ChatGatewayClient, ChatTransport, InboundChatMessage, InboundMeshMessage, MeshBridgeClient,
};
use crate::command::CommandInterpreter;
use crate::config::{self, Config};
use crate::correlation::ReplyTable;
use crate::info::HttpInfoSource;
use crate::ratelimit::FixedWindowLimiter;
use crate::readiness::{wait_until_ready, RetryPolicy};
use crate::router::{MessageRouter, RouteError};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Shared state for the HTTP handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    pub router: Arc<MessageRouter>,
}

/// HTTP status for a refused outbound request.
pub fn status_for(err: &RouteError) -> StatusCode {
    match err {
        RouteError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        RouteError::Malformed(_) => StatusCode::BAD_REQUEST,
        RouteError::SendFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Wire the router to the HTTP transports and bounded in-memory stores described by `config`.
pub fn build_router(config: &Config) -> MessageRouter {
    let limits = &config.limits;
    let chat = ChatGatewayClient::new(
        config::resolve_chat_base_url(config),
        Duration::from_secs(config.chat.request_timeout_secs),
    );
    MessageRouter::new(
        CommandInterpreter::new(&config.info.default_location, &config.info.quake_region),
        Arc::new(FixedWindowLimiter::new(
            limits.max_messages_per_window,
            limits.window(),
            limits.max_tracked_devices,
        )),
        Arc::new(ReplyTable::new(limits.max_correlations)),
        Arc::new(chat),
        Arc::new(MeshBridgeClient::new(config::resolve_mesh_base_url(config))),
        Arc::new(HttpInfoSource::new(
            &config.info.weather_base_url,
            &config.info.quake_feed_url,
        )),
    )
}

/// Routes served by the gateway.
pub fn app(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(health_json))
        .route("/health", get(health))
        .route("/send-message", post(send_message))
        .route("/receive-message", post(receive_message))
        .with_state(state)
}

/// Run the gateway: wait for the chat gateway, then serve on config.gateway.bind:config.gateway.port.
/// Blocks until shutdown (e.g. Ctrl+C).
pub async fn run_gateway(config: Config) -> Result<()> {
    let chat_url = config::resolve_chat_base_url(&config);
    let probe_client = ChatGatewayClient::new(
        chat_url.clone(),
        Duration::from_secs(config.chat.request_timeout_secs),
    );
    log::info!("waiting for chat gateway at {} to be ready", chat_url);
    let probe_client = &probe_client;
    wait_until_ready("chat gateway", RetryPolicy::from(&config.readiness), move || {
        probe_client.probe()
    })
    .await?;

    let state = GatewayState {
        router: Arc::new(build_router(&config)),
        config: Arc::new(config.clone()),
    };

    let bind_addr = format!("{}:{}", config.gateway.bind.trim(), config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                log::warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// POST /send-message — command from a mesh device; replies with text for the device.
async fn send_message(State(state): State<GatewayState>, body: Bytes) -> Response {
    let msg: InboundMeshMessage = match serde_json::from_slice(&body) {
        Ok(m) => m,
        Err(e) => {
            log::warn!("send-message: malformed body: {}", e);
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };
    match state.router.handle_outbound(&msg).await {
        Ok(reply) => (StatusCode::OK, reply).into_response(),
        Err(e) => (status_for(&e), e.to_string()).into_response(),
    }
}

/// POST /receive-message — message from the chat gateway; always acknowledged with an empty 200.
async fn receive_message(State(state): State<GatewayState>, body: Bytes) -> StatusCode {
    let msg: InboundChatMessage = match serde_json::from_slice(&body) {
        Ok(m) => m,
        Err(e) => {
            log::warn!("receive-message: malformed body: {}", e);
            return StatusCode::BAD_REQUEST;
        }
    };
    state.router.handle_inbound(&msg).await;
    StatusCode::OK
}

async fn health() -> &'static str {
    "OK"
}

/// GET / returns health JSON (for probes).
async fn health_json(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.config.gateway.port,
    }))
}
