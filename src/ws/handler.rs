//! WebSocket upgrade handler
//!
//! Each socket is one participant: CONNECTING until the arena has been told
//! about it, ACTIVE while frames flow, DISCONNECTED once the stream ends.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::broadcast::OUTBOUND_QUEUE_CAPACITY;
use crate::game::ArenaHandle;
use crate::util::rate_limit::ConnectionRateLimiter;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    // The transport assigns the connection id
    let participant_id = Uuid::new_v4();
    info!(participant_id = %participant_id, "New WebSocket connection");

    let (mut ws_sink, ws_stream) = socket.split();
    let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);

    let handshake = ServerMsg::Connect { id: participant_id };
    if let Err(e) = send_msg(&mut ws_sink, &handshake).await {
        warn!(participant_id = %participant_id, error = %e, "Failed to send handshake");
        return;
    }

    if !state.arena.connect(participant_id, outbound_tx).await {
        error!(participant_id = %participant_id, "Arena unavailable, dropping connection");
        return;
    }

    let rate_limiter = ConnectionRateLimiter::new(state.config.arena.input_rate_limit);
    run_session(
        participant_id,
        &state.arena,
        rate_limiter,
        ws_sink,
        ws_stream,
        outbound_rx,
    )
    .await;

    // Cleanup on disconnect
    state.arena.disconnect(participant_id).await;

    info!(participant_id = %participant_id, "WebSocket connection closed");
}

/// Run the WebSocket session with read/write split
async fn run_session(
    participant_id: Uuid,
    arena: &ArenaHandle,
    rate_limiter: ConnectionRateLimiter,
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut ws_stream: SplitStream<WebSocket>,
    mut outbound_rx: mpsc::Receiver<Arc<ServerMsg>>,
) {
    // Spawn writer task: arena events -> WebSocket
    let writer_handle = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                debug!(participant_id = %participant_id, error = %e, "WebSocket send failed");
                break;
            }
        }
        debug!(participant_id = %participant_id, "Outbound queue closed");
    });

    // Reader loop: WebSocket -> arena
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_input() {
                    warn!(participant_id = %participant_id, "Rate limited input message");
                    continue;
                }

                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(client_msg) => {
                        if !arena.input(participant_id, client_msg).await {
                            debug!(participant_id = %participant_id, "Arena closed");
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(participant_id = %participant_id, error = %e, "Failed to parse client message");
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(participant_id = %participant_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(participant_id = %participant_id, "Client initiated close");
                break;
            }
            Err(e) => {
                warn!(participant_id = %participant_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    writer_handle.abort();
}

/// WebSocket write failures
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("socket closed: {0}")]
    Socket(#[from] axum::Error),
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), SendError> {
    let json = serde_json::to_string(msg)?;
    sink.send(Message::Text(json)).await?;
    Ok(())
}
