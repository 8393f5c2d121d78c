use crate::error::RelayLinkError;
use crate::relay::relay_link::{RelayChannel, RelayCommand, RelayConnector};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use meshcall_core::{ParticipantId, RelayFrame, RoomId};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

/// Relay over WebSocket at `{base_url}/ws/{room_id}/{self_id}`, each id
/// percent-encoded as one path segment.
#[derive(Debug, Clone)]
pub struct WsRelayConnector {
    base_url: String,
}

impl WsRelayConnector {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn room_url(&self, room_id: &RoomId, self_id: &ParticipantId) -> String {
        format!(
            "{}/ws/{}/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(room_id.as_str()),
            urlencoding::encode(self_id.as_str())
        )
    }
}

#[async_trait]
impl RelayConnector for WsRelayConnector {
    async fn connect(
        &self,
        room_id: &RoomId,
        self_id: &ParticipantId,
    ) -> Result<RelayChannel, RelayLinkError> {
        let url = self.room_url(room_id, self_id);
        let (socket, _) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| RelayLinkError::Connect(e.to_string()))?;
        info!("WebSocket connected: {}", url);

        let (mut sender, mut receiver) = socket.split();
        let (outbound, mut commands) = mpsc::unbounded_channel::<RelayCommand>();
        let (frames, inbound) = mpsc::unbounded_channel::<RelayFrame>();

        tokio::spawn(async move {
            while let Some(command) = commands.recv().await {
                match command {
                    RelayCommand::Send(frame) => {
                        let json = match frame.encode() {
                            Ok(json) => json,
                            Err(e) => {
                                error!("Failed to serialize relay frame: {}", e);
                                continue;
                            }
                        };
                        if let Err(e) = sender.send(Message::Text(json.into())).await {
                            warn!("Relay write failed: {}", e);
                            break;
                        }
                    }
                    RelayCommand::Close => {
                        let _ = sender.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
            debug!("Relay writer finished");
        });

        tokio::spawn(async move {
            while let Some(msg) = receiver.next().await {
                match msg {
                    Ok(Message::Text(text)) => match RelayFrame::decode(text.as_str()) {
                        Ok(frame) => {
                            if frames.send(frame).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Invalid relay frame: {}", e),
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Relay read failed: {}", e);
                        break;
                    }
                }
            }
            info!("WebSocket disconnected");
        });

        Ok(RelayChannel { outbound, inbound })
    }
}
