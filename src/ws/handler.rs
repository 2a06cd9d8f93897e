//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::relay::RelayHub;
use crate::ws::protocol::{ClientEvent, ConnectionId, Outbound, ProtocolError};

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = Uuid::new_v4();
    debug!(connection_id = %connection_id, "WebSocket upgraded");

    let (ws_sink, ws_stream) = socket.split();

    let outbound_rx = state.hub.connect(connection_id);

    run_session(connection_id, &state.hub, ws_sink, ws_stream, outbound_rx).await;

    state.hub.disconnect(connection_id);

    info!(connection_id = %connection_id, "WebSocket connection closed");
}

/// Run the WebSocket session with read/write split
async fn run_session(
    connection_id: ConnectionId,
    hub: &RelayHub,
    mut ws_sink: futures::stream::SplitSink<WebSocket, Message>,
    mut ws_stream: futures::stream::SplitStream<WebSocket>,
    mut outbound_rx: mpsc::UnboundedReceiver<Outbound>,
) {
    // Spawn writer task: outbound queue -> WebSocket
    let writer_handle = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                debug!(connection_id = %connection_id, error = %e, "WebSocket send failed");
                return;
            }
        }
        // Hub dropped this peer (shutdown), close politely
        let _ = ws_sink.close().await;
    });

    // Reader loop: WebSocket -> relay hub
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => match ClientEvent::decode(&text) {
                Ok(event) => {
                    debug!(connection_id = %connection_id, event = event.name(), "Relaying event");
                    hub.dispatch(connection_id, event);
                }
                Err(e) => {
                    warn!(connection_id = %connection_id, error = %e, "Failed to parse client message");
                }
            },
            Ok(Message::Binary(_)) => {
                warn!(connection_id = %connection_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) => {
                debug!(connection_id = %connection_id, "Received ping");
            }
            Ok(Message::Pong(_)) => {
                debug!(connection_id = %connection_id, "Received pong");
            }
            Ok(Message::Close(_)) => {
                info!(connection_id = %connection_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    writer_handle.abort();
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &Outbound,
) -> Result<(), SendError> {
    let json = msg.to_json()?;
    sink.send(Message::Text(json)).await?;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
enum SendError {
    #[error(transparent)]
    Encode(#[from] ProtocolError),

    #[error(transparent)]
    Socket(#[from] axum::Error),
}
