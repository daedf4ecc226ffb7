//! Integration test: fake chat gateway and mesh bridge on free ports, the relay gateway in
//! between, driven over HTTP. The server tasks are left running when the test ends.

use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use lib::config::Config;
use lib::gateway;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Calls = Arc<Mutex<Vec<Value>>>;

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    listener.local_addr().expect("local_addr").port()
}

async fn spawn_app(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake upstream");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}", addr)
}

async fn fake_chat_send(State(calls): State<Calls>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body.get("message").and_then(|v| v.as_str()) == Some("fail") {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to send message" })),
        );
    }
    let mut g = calls.lock().unwrap();
    g.push(body);
    let id = format!("true_{}", g.len());
    (StatusCode::OK, Json(json!({ "status": "Message sent", "id": id })))
}

async fn fake_mesh_send(State(calls): State<Calls>, Json(body): Json<Value>) -> StatusCode {
    calls.lock().unwrap().push(body);
    StatusCode::OK
}

async fn start_relay(chat_calls: Calls, mesh_calls: Calls) -> String {
    // env overrides would take precedence over the fake upstreams configured below
    std::env::remove_var("MESH_RELAY_CHAT_URL");
    std::env::remove_var("MESH_RELAY_MESH_URL");
    let chat_url = spawn_app(
        Router::new()
            .route("/", get(|| async { "OK" }))
            .route("/send-message", post(fake_chat_send))
            .with_state(chat_calls),
    )
    .await;
    let mesh_url = spawn_app(
        Router::new()
            .route("/send-message", post(fake_mesh_send))
            .with_state(mesh_calls),
    )
    .await;

    let port = free_port();
    let mut config = Config::default();
    config.gateway.bind = "127.0.0.1".to_string();
    config.gateway.port = port;
    config.chat.base_url = chat_url;
    config.mesh.base_url = mesh_url;
    config.limits.max_messages_per_window = 3;
    config.readiness.interval_secs = 1;
    config.readiness.max_attempts = Some(5);
    tokio::spawn(async move {
        let _ = gateway::run_gateway(config).await;
    });

    let base = format!("http://127.0.0.1:{}", port);
    let client = reqwest::Client::new();
    for _ in 0..100 {
        if let Ok(resp) = client.get(format!("{}/health", base)).send().await {
            if resp.status().is_success() {
                assert_eq!(resp.text().await.unwrap(), "OK");
                return base;
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("relay at {} did not become healthy within 5s", base);
}

async fn post_mesh(client: &reqwest::Client, base: &str, from: &str, message: &str) -> (u16, String) {
    let resp = client
        .post(format!("{}/send-message", base))
        .json(&json!({ "from": from, "message": message, "timestamp": 1717000000 }))
        .send()
        .await
        .expect("post send-message");
    let status = resp.status().as_u16();
    (status, resp.text().await.unwrap_or_default())
}

#[tokio::test]
async fn send_and_reply_round_trip() {
    let chat_calls: Calls = Arc::default();
    let mesh_calls: Calls = Arc::default();
    let base = start_relay(chat_calls.clone(), mesh_calls.clone()).await;
    let client = reqwest::Client::new();

    let (status, text) = post_mesh(&client, &base, "!a1b2c3d4", "!wsp +56912345678 hola mundo").await;
    assert_eq!(status, 200);
    assert_eq!(text, "✅ WhatsApp message sent!");
    assert_eq!(
        chat_calls.lock().unwrap().as_slice(),
        &[json!({ "number": "56912345678@c.us", "message": "hola mundo" })]
    );

    let resp = client
        .post(format!("{}/receive-message", base))
        .json(&json!({
            "from": "56912345678@c.us",
            "body": "recibido, cambio",
            "timestamp": 1717000100,
            "id": "false_56912345678@c.us_9",
            "quoted": { "id": "true_1", "from": "me", "body": "hola mundo" }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(resp.text().await.unwrap(), "");
    assert_eq!(
        mesh_calls.lock().unwrap().as_slice(),
        &[json!({ "to": "!a1b2c3d4", "message": "recibido, cambio" })]
    );

    let resp = client
        .post(format!("{}/receive-message", base))
        .json(&json!({
            "from": "56912345678@c.us",
            "body": "otra cosa",
            "id": "x",
            "quoted": { "id": "true_999", "from": "me", "body": "?" }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(mesh_calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn errors_map_to_status_codes() {
    let chat_calls: Calls = Arc::default();
    let mesh_calls: Calls = Arc::default();
    let base = start_relay(chat_calls.clone(), mesh_calls).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/send-message", base))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    let resp = client
        .post(format!("{}/receive-message", base))
        .header("content-type", "application/json")
        .body("[1,2")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    let (status, text) = post_mesh(&client, &base, "!malformed", "!wsp 56912345678").await;
    assert_eq!(status, 400);
    assert_eq!(text, "Invalid !wsp command. Format: !wsp <phone> <message>");

    let (status, text) = post_mesh(&client, &base, "!failing", "!wsp 56912345678 fail").await;
    assert_eq!(status, 500);
    assert_eq!(text, "❌ Could not send WhatsApp message.");
    assert!(chat_calls.lock().unwrap().is_empty());

    for _ in 0..3 {
        let (status, text) = post_mesh(&client, &base, "!chatty", "!ping").await;
        assert_eq!(status, 200);
        assert_eq!(text, "pong");
    }
    let (status, text) = post_mesh(&client, &base, "!chatty", "!ping").await;
    assert_eq!(status, 429);
    assert_eq!(
        text,
        "❌ Rate limit exceeded. Please wait before sending more messages."
    );

    let (status, text) = post_mesh(&client, &base, "!quiet", "just chatting").await;
    assert_eq!(status, 200);
    assert_eq!(text, "✅ Command received!");

    let resp = client.get(format!("{}/", base)).send().await.unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json.get("runtime").and_then(|v| v.as_str()), Some("running"));
}
