//! End-to-end test of the notification channel over a real WebSocket
//! server, including a mid-session server drop and reconnect.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::any;
use axum::Router;
use flow_notify::{ChannelStatus, NotificationChannel, ReconnectPolicy, WsTransport};
use flow_types::{ContentId, EventPayload};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Clone)]
struct WsState {
    connections: Arc<AtomicUsize>,
}

async fn ws_handler(State(state): State<WsState>, ws: WebSocketUpgrade) -> Response {
    let n = state.connections.fetch_add(1, Ordering::SeqCst);
    ws.on_upgrade(move |socket| handle_socket(socket, n))
}

async fn handle_socket(mut socket: WebSocket, connection: usize) {
    if connection == 0 {
        // First connection: one event, then an abrupt drop.
        let frame = json!({
            "kind": "newPost",
            "post": {
                "content_id": 10,
                "user_id": "author",
                "username": "Author",
                "title": "First",
                "content": "Body",
                "created_at": "2026-01-01T00:00:00Z",
                "likes": 0
            }
        });
        let _ = socket.send(Message::Text(frame.to_string().into())).await;
        drop(socket);
    } else {
        // Reconnected: deliver another event, then stay open until the
        // client goes away.
        let frame = json!({ "kind": "likeUpdate", "content_id": 10, "likes": 4 });
        let _ = socket.send(Message::Text(frame.to_string().into())).await;
        while socket.recv().await.is_some() {}
    }
}

async fn spawn_ws_server() -> (SocketAddr, Arc<AtomicUsize>) {
    let connections = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/ws", any(ws_handler))
        .with_state(WsState {
            connections: connections.clone(),
        });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, connections)
}

#[tokio::test]
async fn survives_a_server_drop_and_keeps_delivering() {
    let (addr, connections) = spawn_ws_server().await;

    let policy = ReconnectPolicy {
        base_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(100),
        max_retries: 5,
    };
    let channel = NotificationChannel::open(WsTransport::new(format!("ws://{}/ws", addr)), policy);
    let mut events = channel.subscribe();

    let first = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("first event should arrive")
        .unwrap();
    assert!(matches!(
        first.payload,
        EventPayload::NewPost { ref post } if post.content_id == ContentId(10)
    ));

    // The server dropped the socket after the first event; the channel
    // must reconnect on its own and keep delivering.
    let second = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("event after reconnect should arrive")
        .unwrap();
    assert!(matches!(
        second.payload,
        EventPayload::LikeUpdate { content_id: ContentId(10), likes: 4 }
    ));
    assert_eq!(connections.load(Ordering::SeqCst), 2);

    channel.shutdown().await;
    assert_eq!(
        channel.state().status,
        ChannelStatus::Closed { unavailable: false }
    );
}

async fn silent_ws(State(released): State<Arc<AtomicBool>>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |mut socket: WebSocket| async move {
        // Sends nothing; reads until the client side goes away.
        while socket.recv().await.is_some() {}
        released.store(true, Ordering::SeqCst);
    })
}

#[tokio::test]
async fn shutdown_closes_the_connection_server_side() {
    let released = Arc::new(AtomicBool::new(false));
    let app = Router::new()
        .route("/ws", any(silent_ws))
        .with_state(released.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let channel = NotificationChannel::open(
        WsTransport::new(format!("ws://{}/ws", addr)),
        ReconnectPolicy::default(),
    );
    let mut state = channel.watch_state();
    tokio::time::timeout(
        Duration::from_secs(5),
        state.wait_for(|s| s.status == ChannelStatus::Open),
    )
    .await
    .expect("channel should open")
    .unwrap();

    channel.shutdown().await;

    // Even against a server that never sends a frame, shutdown must close
    // the underlying socket, not just stop reading from it.
    for _ in 0..200 {
        if released.load(Ordering::SeqCst) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("server still sees the websocket open after channel shutdown");
}

#[tokio::test]
async fn unreachable_endpoint_exhausts_retries() {
    // A bound-then-dropped listener leaves a port nothing is listening on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let policy = ReconnectPolicy {
        base_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
        max_retries: 3,
    };
    let channel = NotificationChannel::open(WsTransport::new(format!("ws://{}/ws", addr)), policy);

    let mut state = channel.watch_state();
    let closed = tokio::time::timeout(
        Duration::from_secs(5),
        state.wait_for(|s| matches!(s.status, ChannelStatus::Closed { .. })),
    )
    .await
    .expect("channel should give up within the retry budget")
    .unwrap()
    .clone();

    assert_eq!(closed.status, ChannelStatus::Closed { unavailable: true });
    assert_eq!(closed.retry_count, 3);
}
