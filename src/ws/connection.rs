//! Per-connection WebSocket loop.
//!
//! Runs the read/write loop for a single client: inbound frames go to the
//! [`EventRelay`], outbound events arrive on the session's channel and are
//! written to the socket. Inbound handling is sequential per connection;
//! separate connections run as independent tasks.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::relay::EventRelay;
use crate::session::SessionId;

/// Runs the read/write loop for a single WebSocket connection.
///
/// Registers the session on entry (greeting and presence notifications are
/// emitted by the relay) and unregisters it when the socket closes, the
/// client goes away, or a send fails.
pub async fn run_connection(socket: WebSocket, relay: Arc<EventRelay>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut out_rx) = mpsc::unbounded_channel();

    let session_id = SessionId::new();
    relay.session_opened(session_id, tx).await;

    loop {
        tokio::select! {
            // Incoming frame from the client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        relay.handle_message(session_id, &text).await;
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
            // Outbound event routed to this session
            event = out_rx.recv() => {
                let Some(event) = event else { break };
                let json = serde_json::to_string(&event).unwrap_or_default();
                if ws_tx.send(Message::text(json)).await.is_err() {
                    break;
                }
            }
        }
    }

    relay.session_closed(&session_id).await;
    tracing::debug!(session_id = %session_id, "ws connection closed");
}
