//! WebSocket worker for the real-time channel

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use http::header::AUTHORIZATION;
use http::HeaderValue;
use openapi_client::models::RealtimeFrame;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tracing::{debug, error, info, warn};

use crate::authn::session::SessionManagerExt;
use crate::errors::ConsoleError;
use crate::realtime::hub::RealtimeHub;
use crate::utils::websocket_url;

const REALTIME_PATH: &str = "realtime/ws";

/// Realtime worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Reconnect delay on failure
    pub reconnect_delay: Duration,

    /// Heartbeat interval
    pub heartbeat_interval: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_secs(5),
            heartbeat_interval: Duration::from_secs(30),
        }
    }
}

enum Disconnect {
    Shutdown,
    Lost,
}

/// Run the realtime worker until shutdown.
///
/// Frames queued while disconnected are discarded; after every (re)connect
/// the worker joins each room that still has a live guard.
pub async fn run(
    options: &Options,
    hub: RealtimeHub,
    mut outbound: mpsc::UnboundedReceiver<RealtimeFrame>,
    session: Arc<dyn SessionManagerExt>,
    backend_url: String,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) {
    info!("Realtime worker starting...");

    let socket_url = match websocket_url(&backend_url, REALTIME_PATH) {
        Ok(url) => url,
        Err(e) => {
            error!("Failed to build realtime URL: {}", e);
            return;
        }
    };

    loop {
        let token = match session.get_token().await {
            Ok(token) => token,
            Err(e) => {
                error!("Failed to get session token: {}", e);
                if wait_or_shutdown(options.reconnect_delay, &mut shutdown_signal).await {
                    return;
                }
                continue;
            }
        };

        let request = match build_request(socket_url.as_str(), token.expose()) {
            Ok(request) => request,
            Err(e) => {
                error!("Failed to build realtime request: {}", e);
                return;
            }
        };

        info!("Connecting to realtime channel: {}", socket_url);
        let connection = tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Realtime worker shutting down...");
                return;
            }
            connection = connect_async(request) => connection,
        };

        match connection {
            Ok((ws_stream, _)) => {
                info!("Connected to realtime channel");
                let result = serve(options, &hub, &mut outbound, ws_stream, &mut shutdown_signal).await;
                if let Disconnect::Shutdown = result {
                    return;
                }
            }
            Err(e) => {
                error!(
                    "Failed to connect to realtime channel: {}. Retrying in {:?}...",
                    e, options.reconnect_delay
                );
            }
        }

        if wait_or_shutdown(options.reconnect_delay, &mut shutdown_signal).await {
            return;
        }
    }
}

fn build_request(
    url: &str,
    token: &str,
) -> Result<tokio_tungstenite::tungstenite::handshake::client::Request, ConsoleError> {
    let mut request = url
        .into_client_request()
        .map_err(|e| ConsoleError::RealtimeError(e.to_string()))?;
    let bearer = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|e| ConsoleError::RealtimeError(e.to_string()))?;
    request.headers_mut().insert(AUTHORIZATION, bearer);
    Ok(request)
}

async fn serve<S>(
    options: &Options,
    hub: &RealtimeHub,
    outbound: &mut mpsc::UnboundedReceiver<RealtimeFrame>,
    mut ws_stream: S,
    shutdown_signal: &mut Pin<Box<dyn Future<Output = ()> + Send>>,
) -> Disconnect
where
    S: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
        + futures::Sink<Message, Error = tokio_tungstenite::tungstenite::Error>
        + Unpin,
{
    // Stale join/leave frames are superseded by the re-join below
    while outbound.try_recv().is_ok() {}

    for room in hub.live_rooms() {
        let frame = RealtimeFrame::Join {
            room: room.to_string(),
        };
        if let Err(e) = send_frame(&mut ws_stream, &frame).await {
            warn!("Failed to re-join {}: {}", room, e);
            return Disconnect::Lost;
        }
    }

    let mut heartbeat_tick = tokio::time::interval(options.heartbeat_interval);
    heartbeat_tick.tick().await;

    loop {
        tokio::select! {
            _ = &mut *shutdown_signal => {
                info!("Realtime worker shutting down connection...");
                let _ = ws_stream.close().await;
                return Disconnect::Shutdown;
            }
            _ = heartbeat_tick.tick() => {
                if let Err(e) = send_frame(&mut ws_stream, &RealtimeFrame::Ping).await {
                    warn!("Failed to send heartbeat: {}", e);
                    return Disconnect::Lost;
                }
            }
            frame = outbound.recv() => {
                let Some(frame) = frame else {
                    debug!("Realtime hub dropped, closing connection");
                    let _ = ws_stream.close().await;
                    return Disconnect::Shutdown;
                };
                if let Err(e) = send_frame(&mut ws_stream, &frame).await {
                    warn!("Failed to send realtime frame: {}", e);
                    return Disconnect::Lost;
                }
            }
            msg = ws_stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => hub.handle_text(&text),
                    Some(Ok(Message::Close(_))) | None => {
                        warn!("Realtime channel closed by server");
                        return Disconnect::Lost;
                    }
                    Some(Err(e)) => {
                        error!("Realtime WebSocket error: {}", e);
                        return Disconnect::Lost;
                    }
                    _ => {}
                }
            }
        }
    }
}

async fn send_frame<S>(ws_stream: &mut S, frame: &RealtimeFrame) -> Result<(), ConsoleError>
where
    S: futures::Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    let text = serde_json::to_string(frame)?;
    ws_stream
        .send(Message::Text(text.into()))
        .await
        .map_err(|e| ConsoleError::RealtimeError(e.to_string()))
}

/// Sleep for `delay`; true when shutdown fired first
async fn wait_or_shutdown(
    delay: Duration,
    shutdown_signal: &mut Pin<Box<dyn Future<Output = ()> + Send>>,
) -> bool {
    tokio::select! {
        _ = &mut *shutdown_signal => {
            info!("Realtime worker shutting down...");
            true
        }
        _ = tokio::time::sleep(delay) => false,
    }
}
