use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;

use genie_console::models::entity::EntityKind;
use genie_console::realtime::hub::RealtimeHub;
use genie_console::realtime::room::Room;
use genie_console::workers::realtime::{self, Options};

use crate::support::StaticSession;

const TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
struct ServerState {
    seen: mpsc::UnboundedSender<String>,
    connections: Arc<AtomicUsize>,
    drop_first: bool,
}

async fn realtime_ws(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<ServerState>,
) -> Response {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let _ = state.seen.send(format!("connect {}", auth));
    let attempt = state.connections.fetch_add(1, Ordering::SeqCst);
    let hang_up = state.drop_first && attempt == 0;

    ws.on_upgrade(move |socket| async move {
        if !hang_up {
            serve_socket(socket, state.seen).await;
        }
    })
}

/// Records every text frame and answers each join with an update event
async fn serve_socket(mut socket: WebSocket, seen: mpsc::UnboundedSender<String>) {
    while let Some(Ok(message)) = socket.recv().await {
        let WsMessage::Text(text) = message else {
            continue;
        };
        let _ = seen.send(text.as_str().to_string());

        let frame: Value = serde_json::from_str(text.as_str()).unwrap_or_default();
        if frame["type"] == "join" {
            let room = frame["room"].as_str().unwrap_or_default().to_string();
            let id = room.split(':').nth(1).unwrap_or_default().to_string();
            let event = json!({
                "type": "event",
                "room": room,
                "event": "campaign_updated",
                "data": {"id": id, "status": "paused"}
            });
            if socket.send(WsMessage::Text(event.to_string().into())).await.is_err() {
                break;
            }
        }
    }
}

async fn start_server(drop_first: bool) -> (String, mpsc::UnboundedReceiver<String>) {
    let (seen, seen_rx) = mpsc::unbounded_channel();
    let state = ServerState {
        seen,
        connections: Arc::new(AtomicUsize::new(0)),
        drop_first,
    };
    let app = Router::new()
        .route("/api/realtime/ws", get(realtime_ws))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/api", addr), seen_rx)
}

async fn next_seen(seen: &mut mpsc::UnboundedReceiver<String>) -> String {
    timeout(TIMEOUT, seen.recv())
        .await
        .expect("server saw nothing")
        .expect("server channel closed")
}

async fn next_frame(seen: &mut mpsc::UnboundedReceiver<String>) -> Value {
    serde_json::from_str(&next_seen(seen).await).unwrap()
}

fn options() -> Options {
    Options {
        reconnect_delay: Duration::from_millis(50),
        heartbeat_interval: Duration::from_secs(60),
    }
}

#[tokio::test]
async fn test_worker_joins_rooms_and_delivers_events() {
    let (base_url, mut seen) = start_server(false).await;
    let (hub, outbound) = RealtimeHub::new();
    let mut events = hub.subscribe();
    let first = hub.join(Room::new(EntityKind::Campaign, "1"));

    let session = StaticSession::new(json!({"sub": 1, "role": "admin"}));
    let expected_auth = format!("connect Bearer {}", session.token.expose());
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let worker = tokio::spawn({
        let hub = hub.clone();
        async move {
            realtime::run(
                &options(),
                hub,
                outbound,
                session,
                base_url,
                Box::pin(async move {
                    let _ = stop_rx.await;
                }),
            )
            .await
        }
    });

    assert_eq!(next_seen(&mut seen).await, expected_auth);
    assert_eq!(
        next_frame(&mut seen).await,
        json!({"type": "join", "room": "campaign:1"})
    );

    let event = timeout(TIMEOUT, events.recv()).await.unwrap().unwrap();
    assert_eq!(event.room, Room::new(EntityKind::Campaign, "1"));
    assert_eq!(event.id, "1");
    assert_eq!(event.name, "campaign_updated");
    assert_eq!(event.payload["status"], "paused");

    // Rooms joined while connected go out at once, and leave on drop
    let second = hub.join(Room::new(EntityKind::Campaign, "2"));
    assert_eq!(
        next_frame(&mut seen).await,
        json!({"type": "join", "room": "campaign:2"})
    );
    let event = timeout(TIMEOUT, events.recv()).await.unwrap().unwrap();
    assert_eq!(event.id, "2");

    drop(second);
    assert_eq!(
        next_frame(&mut seen).await,
        json!({"type": "leave", "room": "campaign:2"})
    );

    stop_tx.send(()).unwrap();
    timeout(TIMEOUT, worker).await.unwrap().unwrap();
    drop(first);
}

#[tokio::test]
async fn test_worker_rejoins_after_reconnect() {
    let (base_url, mut seen) = start_server(true).await;
    let (hub, outbound) = RealtimeHub::new();
    let _lead = hub.join(Room::new(EntityKind::Lead, "9"));

    let session = StaticSession::new(json!({"sub": 1, "role": "admin"}));
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let worker = tokio::spawn({
        let hub = hub.clone();
        async move {
            realtime::run(
                &options(),
                hub,
                outbound,
                session,
                base_url,
                Box::pin(async move {
                    let _ = stop_rx.await;
                }),
            )
            .await
        }
    });

    assert!(next_seen(&mut seen).await.starts_with("connect Bearer "));
    assert!(next_seen(&mut seen).await.starts_with("connect Bearer "));
    assert_eq!(
        next_frame(&mut seen).await,
        json!({"type": "join", "room": "lead:9"})
    );

    stop_tx.send(()).unwrap();
    timeout(TIMEOUT, worker).await.unwrap().unwrap();
}
