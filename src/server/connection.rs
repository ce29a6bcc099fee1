//! Per-connection WebSocket handling
//!
//! Each upgraded socket is split in two: a writer task draining the
//! connection's registry queue into the sink, and a read loop feeding the
//! router. Teardown (deregister + count broadcast) runs unconditionally when
//! the read loop exits, whatever the reason.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{ConnectInfo, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::registry::{ConnectionEntry, ConnectionHandle, ConnectionId, RelayFrame, SharedState};
use crate::relay::Relay;

use super::AppState;

/// How long teardown waits for queued frames to flush
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// WebSocket upgrade handler
///
/// GET /
pub(super) async fn ws_handler(
    State(state): State<AppState>,
    ConnectInfo(peer_addr): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> Response {
    // Check connection limit
    let permit = match state.connection_semaphore {
        Some(ref sem) => match Arc::clone(sem).try_acquire_owned() {
            Ok(permit) => Some(permit),
            Err(_) => {
                state.relay.stats().record_rejected();
                tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                return (StatusCode::SERVICE_UNAVAILABLE, "connection limit reached").into_response();
            }
        },
        None => None,
    };

    let relay = Arc::clone(&state.relay);
    let id = relay.next_connection_id();

    ws.max_message_size(state.config.max_message_size)
        .on_failed_upgrade(move |e| {
            tracing::warn!(conn_id = %id, peer = %peer_addr, error = %e, "WebSocket upgrade failed");
        })
        .on_upgrade(move |socket| async move {
            let _permit = permit;
            Connection::new(id, peer_addr, relay).run(socket).await;
        })
}

/// A single client connection
pub struct Connection {
    id: ConnectionId,
    peer_addr: SocketAddr,
    relay: Arc<Relay>,
}

impl Connection {
    pub fn new(id: ConnectionId, peer_addr: SocketAddr, relay: Arc<Relay>) -> Self {
        Self { id, peer_addr, relay }
    }

    /// Drive the connection until the socket closes or errors
    pub async fn run(self, socket: WebSocket) {
        let (entry, handle) = ConnectionEntry::new(self.id, self.peer_addr, self.relay.registry().config());
        let ConnectionHandle { id, rx, state } = handle;

        let (sink, mut stream) = socket.split();
        let mut writer = tokio::spawn(write_loop(id, sink, rx, Arc::clone(&state)));

        if self.relay.lifecycle().open(entry).await.is_some() {
            match self.read_loop(&mut stream).await {
                Ok(()) => tracing::debug!(conn_id = %id, "Read loop finished"),
                Err(e) => tracing::warn!(conn_id = %id, error = %e, "WebSocket error"),
            }
        }

        state.mark_closing();
        self.relay.lifecycle().close(id).await;

        // Registry entry (and its sender) is gone, so the writer drains and exits
        if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer).await.is_err() {
            writer.abort();
        }

        tracing::debug!(conn_id = %id, peer = %self.peer_addr, "Connection closed");
    }

    async fn read_loop(&self, stream: &mut SplitStream<WebSocket>) -> Result<(), axum::Error> {
        let router = self.relay.router();

        while let Some(message) = stream.next().await {
            match message? {
                Message::Text(text) => {
                    router.route(self.id, RelayFrame::Text(text)).await;
                }
                Message::Binary(data) => {
                    router.route(self.id, RelayFrame::Binary(data)).await;
                }
                // Pings are answered by axum
                Message::Ping(_) | Message::Pong(_) => {}
                Message::Close(frame) => {
                    match frame {
                        Some(frame) => tracing::debug!(
                            conn_id = %self.id,
                            code = frame.code,
                            reason = %frame.reason.as_str(),
                            "Close frame received"
                        ),
                        None => tracing::debug!(conn_id = %self.id, "Close frame received"),
                    }
                    break;
                }
            }
        }

        Ok(())
    }
}

async fn write_loop(
    id: ConnectionId,
    mut sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<RelayFrame>,
    state: Arc<SharedState>,
) {
    while let Some(frame) = rx.recv().await {
        if let Err(e) = sink.send(frame.into()).await {
            state.mark_closing();
            tracing::debug!(conn_id = %id, error = %e, "Write failed, closing");
            return;
        }
    }

    let _ = sink.close().await;
}
