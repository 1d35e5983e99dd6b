//! Integration tests for the broadcast hub.
//!
//! Drives a real in-process hub over WebSocket and verifies:
//! 1. Every `SendMorse` is broadcast to all clients, the sender included.
//! 2. Each inbound send produces exactly one broadcast per client.
//! 3. The ciphertext is forwarded unchanged.
//! 4. Oversized payloads are rejected to the sender only.
//! 5. A client disconnecting does not affect the others.

use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use morsechat_proto::relay::{self, RelayMessage};
use morsechat_relay::hub::{self, HubState};
use tokio_tungstenite::tungstenite;

type Ws = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn start_hub(state: Arc<HubState>) -> std::net::SocketAddr {
    let (addr, _handle) = hub::start_server_with_state("127.0.0.1:0", state)
        .await
        .unwrap();
    addr
}

/// Connect a client and consume its `Welcome`, returning the assigned id.
async fn connect(addr: std::net::SocketAddr) -> (Ws, u64) {
    let url = format!("ws://{addr}/ws");
    let (mut ws, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
    match recv(&mut ws).await {
        RelayMessage::Welcome { connection_id, .. } => (ws, connection_id),
        other => panic!("expected Welcome, got {other:?}"),
    }
}

async fn send(ws: &mut Ws, msg: &RelayMessage) {
    let bytes = relay::encode(msg).unwrap();
    ws.send(tungstenite::Message::Binary(bytes.into()))
        .await
        .unwrap();
}

async fn recv(ws: &mut Ws) -> RelayMessage {
    let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("recv timed out")
        .unwrap()
        .unwrap();
    relay::decode(&msg.into_data()).unwrap()
}

/// Asserts nothing else arrives within a short window.
async fn assert_silent(ws: &mut Ws) {
    let extra = tokio::time::timeout(Duration::from_millis(200), ws.next()).await;
    assert!(extra.is_err(), "unexpected extra frame: {extra:?}");
}

fn send_morse(ciphertext: &str) -> RelayMessage {
    RelayMessage::SendMorse {
        ciphertext: ciphertext.to_string(),
    }
}

fn receive_message(ciphertext: &str) -> RelayMessage {
    RelayMessage::ReceiveMessage {
        ciphertext: ciphertext.to_string(),
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[tokio::test]
async fn welcome_reports_peer_count() {
    let addr = start_hub(Arc::new(HubState::new())).await;

    let url = format!("ws://{addr}/ws");
    let (mut first, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
    assert!(matches!(recv(&mut first).await, RelayMessage::Welcome { peers: 1, .. }));

    let (mut second, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
    assert!(matches!(recv(&mut second).await, RelayMessage::Welcome { peers: 2, .. }));
}

#[tokio::test]
async fn connection_ids_differ() {
    let addr = start_hub(Arc::new(HubState::new())).await;
    let (_a, id_a) = connect(addr).await;
    let (_b, id_b) = connect(addr).await;
    assert_ne!(id_a, id_b);
}

#[tokio::test]
async fn broadcast_reaches_sender_and_peer() {
    let addr = start_hub(Arc::new(HubState::new())).await;
    let (mut alice, _) = connect(addr).await;
    let (mut bob, _) = connect(addr).await;

    send(&mut alice, &send_morse("opaque-ciphertext")).await;

    assert_eq!(recv(&mut alice).await, receive_message("opaque-ciphertext"));
    assert_eq!(recv(&mut bob).await, receive_message("opaque-ciphertext"));
}

#[tokio::test]
async fn exactly_one_broadcast_per_send() {
    let addr = start_hub(Arc::new(HubState::new())).await;
    let (mut alice, _) = connect(addr).await;
    let (mut bob, _) = connect(addr).await;

    send(&mut alice, &send_morse("once")).await;

    assert_eq!(recv(&mut alice).await, receive_message("once"));
    assert_eq!(recv(&mut bob).await, receive_message("once"));
    assert_silent(&mut alice).await;
    assert_silent(&mut bob).await;
}

#[tokio::test]
async fn per_connection_order_is_fifo() {
    let addr = start_hub(Arc::new(HubState::new())).await;
    let (mut alice, _) = connect(addr).await;
    let (mut bob, _) = connect(addr).await;

    for i in 0..20 {
        send(&mut alice, &send_morse(&format!("msg-{i}"))).await;
    }
    for i in 0..20 {
        assert_eq!(recv(&mut bob).await, receive_message(&format!("msg-{i}")));
    }
}

#[tokio::test]
async fn three_clients_all_see_each_message() {
    let addr = start_hub(Arc::new(HubState::new())).await;
    let (mut a, _) = connect(addr).await;
    let (mut b, _) = connect(addr).await;
    let (mut c, _) = connect(addr).await;

    send(&mut c, &send_morse("from-c")).await;

    for ws in [&mut a, &mut b, &mut c] {
        assert_eq!(recv(ws).await, receive_message("from-c"));
    }
}

#[tokio::test]
async fn oversized_payload_rejected_to_sender_only() {
    let addr = start_hub(Arc::new(HubState::with_config(16))).await;
    let (mut alice, _) = connect(addr).await;
    let (mut bob, _) = connect(addr).await;

    send(&mut alice, &send_morse(&"x".repeat(17))).await;

    match recv(&mut alice).await {
        RelayMessage::Error { reason } => {
            assert!(reason.contains("payload too large"), "got: {reason}");
        }
        other => panic!("expected Error, got {other:?}"),
    }
    assert_silent(&mut bob).await;
}

#[tokio::test]
async fn disconnect_does_not_affect_others() {
    let state = Arc::new(HubState::new());
    let addr = start_hub(Arc::clone(&state)).await;
    let (mut alice, _) = connect(addr).await;
    let (mut bob, _) = connect(addr).await;
    let (carol, _) = connect(addr).await;

    drop(carol);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while state.connection_count().await > 2 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(state.connection_count().await, 2);

    send(&mut bob, &send_morse("still-here")).await;
    assert_eq!(recv(&mut alice).await, receive_message("still-here"));
    assert_eq!(recv(&mut bob).await, receive_message("still-here"));
}

#[tokio::test]
async fn close_all_connections_closes_clients() {
    let state = Arc::new(HubState::new());
    let addr = start_hub(Arc::clone(&state)).await;
    let (mut alice, _) = connect(addr).await;

    state.close_all_connections().await;

    let frame = tokio::time::timeout(Duration::from_secs(5), alice.next())
        .await
        .expect("close timed out");
    match frame {
        Some(Ok(tungstenite::Message::Close(_))) | None | Some(Err(_)) => {}
        other => panic!("expected close, got {other:?}"),
    }
}

#[tokio::test]
async fn health_endpoint_responds_ok() {
    let addr = start_hub(Arc::new(HubState::new())).await;

    let body = tokio::task::spawn_blocking(move || {
        let mut stream = std::net::TcpStream::connect(addr).unwrap();
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        response
    })
    .await
    .unwrap();

    assert!(body.starts_with("HTTP/1.1 200"), "got: {body}");
    assert!(body.ends_with("ok"), "got: {body}");
}
