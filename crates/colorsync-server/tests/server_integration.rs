//! Integration tests for the broadcast server over real sockets.
//!
//! Each test binds `127.0.0.1:0`, runs [`serve`] in the background with short
//! keepalive timings, and talks to it with a plain tokio-tungstenite client.

use std::net::SocketAddr;
use std::sync::{atomic::AtomicBool, Arc};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{
    connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};

use colorsync_server::domain::ServerConfig;
use colorsync_server::infrastructure::serve;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

async fn start_server(ping_interval: Duration, pong_wait: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let config = ServerConfig {
        bind_addr: addr,
        ping_interval,
        pong_wait,
    };
    tokio::spawn(serve(listener, config, Arc::new(AtomicBool::new(true))));
    addr
}

async fn start_default_server() -> SocketAddr {
    start_server(Duration::from_secs(9), Duration::from_secs(10)).await
}

async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = connect_async(format!("ws://{addr}/ws/v1/websocket"))
        .await
        .expect("handshake must succeed");
    ws
}

async fn send(ws: &mut Client, frame: Value) {
    ws.send(Message::Text(frame.to_string())).await.unwrap();
}

/// Next text frame as JSON, skipping pings.
async fn next_json(ws: &mut Client) -> Value {
    tokio::time::timeout(WAIT, async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return serde_json::from_str(&text).unwrap(),
                Some(Ok(_)) => continue,
                other => panic!("expected a text frame, got {other:?}"),
            }
        }
    })
    .await
    .expect("timed out waiting for a frame")
}

/// Reads until the server ends the session.
async fn expect_session_end(ws: &mut Client) {
    tokio::time::timeout(WAIT, async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await
    .expect("server did not close the session");
}

// ── Message handling ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_init_connection_is_acknowledged() {
    // Arrange
    let addr = start_default_server().await;
    let mut ws = connect(addr).await;

    // Act
    send(
        &mut ws,
        json!({"Authorization": "3f2b8c1e-0000-4000-8000-000000000001", "action": "INIT_CONNECTION"}),
    )
    .await;

    // Assert
    assert_eq!(next_json(&mut ws).await, json!({"action": "MESSAGE", "payload": "OK"}));
}

#[tokio::test]
async fn test_set_color_is_broadcast_to_every_client() {
    // Arrange
    let addr = start_default_server().await;
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;
    // Round-trip an INIT on both so both sessions are registered.
    for ws in [&mut alice, &mut bob] {
        send(ws, json!({"Authorization": "t", "action": "INIT_CONNECTION"})).await;
        next_json(ws).await;
    }

    // Act
    send(
        &mut alice,
        json!({"Authorization": "t2", "action": "SET_COLOR", "payload": "#ff0000"}),
    )
    .await;

    // Assert: the sender gets its own broadcast back.
    let expected = json!({"action": "NEW_COLOR", "payload": "#ff0000"});
    assert_eq!(next_json(&mut alice).await, expected);
    assert_eq!(next_json(&mut bob).await, expected);
}

#[tokio::test]
async fn test_unknown_action_gets_error_404() {
    let addr = start_default_server().await;
    let mut ws = connect(addr).await;

    send(&mut ws, json!({"Authorization": "t", "action": "DELETE_EVERYTHING"})).await;

    assert_eq!(
        next_json(&mut ws).await,
        json!({"action": "ERROR", "payload": {"appDomain": "WS", "errorCode": 404}})
    );
}

#[tokio::test]
async fn test_frames_without_token_or_action_keep_the_session() {
    // Arrange
    let addr = start_default_server().await;
    let mut ws = connect(addr).await;

    // Act / Assert: no action is an unknown action...
    send(&mut ws, json!({"Authorization": "t", "payload": "#123456"})).await;
    assert_eq!(
        next_json(&mut ws).await,
        json!({"action": "ERROR", "payload": {"appDomain": "WS", "errorCode": 404}})
    );

    // ...and a missing token does not stop a broadcast.
    send(&mut ws, json!({"action": "SET_COLOR", "payload": "#123456"})).await;
    assert_eq!(
        next_json(&mut ws).await,
        json!({"action": "NEW_COLOR", "payload": "#123456"})
    );
}

#[tokio::test]
async fn test_malformed_frame_ends_session() {
    let addr = start_default_server().await;
    let mut ws = connect(addr).await;

    ws.send(Message::Text("{not json".to_string())).await.unwrap();

    expect_session_end(&mut ws).await;
}

#[tokio::test]
async fn test_other_path_is_rejected() {
    // Arrange
    let addr = start_default_server().await;

    // Act
    let result = connect_async(format!("ws://{addr}/somewhere/else")).await;

    // Assert
    match result {
        Err(tokio_tungstenite::tungstenite::Error::Http(response)) => {
            assert_eq!(response.status().as_u16(), 404);
        }
        other => panic!("expected an HTTP 404 rejection, got {:?}", other.map(|_| ())),
    }
}

// ── Keepalive ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_client_without_pongs_is_dropped() {
    // Arrange
    let addr = start_server(Duration::from_millis(50), Duration::from_millis(150)).await;
    let mut ws = connect(addr).await;

    // Act: do not read, so no pong is ever sent.
    tokio::time::sleep(Duration::from_millis(400)).await;

    // Assert
    expect_session_end(&mut ws).await;
}

#[tokio::test]
async fn test_client_that_answers_pings_stays_connected() {
    // Arrange
    let addr = start_server(Duration::from_millis(50), Duration::from_millis(150)).await;
    let ws = connect(addr).await;
    let (mut tx, mut rx) = ws.split();

    // Act: keep reading (which answers pings) well past pong_wait.
    let reading = tokio::time::timeout(Duration::from_millis(600), async {
        while let Some(frame) = rx.next().await {
            if matches!(frame, Ok(Message::Close(_)) | Err(_)) {
                return false;
            }
        }
        false
    })
    .await;

    // Assert: the read loop was still running when the timeout hit.
    assert!(reading.is_err(), "session ended despite answering pings");

    tx.send(Message::Text(
        json!({"Authorization": "t", "action": "SET_COLOR", "payload": "#00ff00"}).to_string(),
    ))
    .await
    .unwrap();
    let echoed = tokio::time::timeout(WAIT, async {
        loop {
            match rx.next().await {
                Some(Ok(Message::Text(text))) => return serde_json::from_str::<Value>(&text).unwrap(),
                Some(Ok(_)) => continue,
                other => panic!("expected a text frame, got {other:?}"),
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(echoed, json!({"action": "NEW_COLOR", "payload": "#00ff00"}));
}
