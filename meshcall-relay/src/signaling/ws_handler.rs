use crate::room::RoomRegistry;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use meshcall_core::{ParticipantId, RelayFrame, RoomId};
use tokio::sync::mpsc;
use tracing::{info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path((room_id, user_id)): Path<(String, String)>,
    State(registry): State<RoomRegistry>,
) -> impl IntoResponse {
    let room_id = RoomId::from(room_id);
    let user_id = ParticipantId::from(user_id);

    ws.on_upgrade(move |socket| handle_socket(socket, room_id, user_id, registry))
}

async fn handle_socket(
    socket: WebSocket,
    room_id: RoomId,
    user_id: ParticipantId,
    registry: RoomRegistry,
) {
    info!("New WebSocket connection: {} in room {}", user_id, room_id);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let connection = registry.join(&room_id, &user_id, tx);

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if sender.send(msg).await.is_err() || closing {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let registry = registry.clone();
        let room_id = room_id.clone();
        let user_id = user_id.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match RelayFrame::decode(&text) {
                        Ok(frame) => registry.relay(&room_id, &user_id, connection, frame.message),
                        Err(e) => warn!("Invalid relay frame from {}: {}", user_id, e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    registry.leave(&room_id, &user_id, connection);
    info!("WebSocket disconnected: {} from room {}", user_id, room_id);
}
