//! WebSocket endpoint carrying the frame stream

use crate::services::protocol::StreamProtocol;
use crate::state::AppState;
use crate::types::ServerMessage;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

const OUTBOUND_BUFFER: usize = 32;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let _guard = state.stats.connect();
    tracing::info!("🔌 Client connected ({} total)", state.stats.connected_clients());

    let (sink, mut receiver) = socket.split();
    let (tx, rx) = mpsc::channel::<Message>(OUTBOUND_BUFFER);

    let writer = tokio::spawn(async move {
        if let Err(e) = ReceiverStream::new(rx).map(Ok::<_, axum::Error>).forward(sink).await {
            tracing::debug!("[STREAM] Writer stopped: {}", e);
        }
    });

    let mut protocol = StreamProtocol::new(state.clone());
    if send(&tx, &ServerMessage::connected()).await {
        while let Some(message) = receiver.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    let reply = protocol.handle_text(text.as_str()).await;
                    if !send(&tx, &reply).await {
                        break;
                    }
                }
                Ok(Message::Binary(_)) => {
                    if !send(&tx, &ServerMessage::error("Binary messages are not supported")).await {
                        break;
                    }
                }
                Ok(Message::Close(_)) => {
                    tracing::debug!("[STREAM] Client sent close");
                    break;
                }
                // pings are answered by the socket itself
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("[STREAM] WebSocket error: {}", e);
                    break;
                }
            }
        }
    }

    protocol.disconnect();
    drop(tx);
    let _ = writer.await;
    tracing::info!("👋 Client disconnected");
}

/// Queue a message for the writer; false once the client is gone
async fn send(tx: &mpsc::Sender<Message>, message: &ServerMessage) -> bool {
    tx.send(Message::Text(message.to_json().into())).await.is_ok()
}
