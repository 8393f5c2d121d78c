use futures::{SinkExt, StreamExt};
use meshcall_core::{ParticipantId, RelayFrame, RelayMessage};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// Timeout for a single expected frame (ms).
pub const FRAME_TIMEOUT_MS: u64 = 3000;

/// Window in which no frame is expected (ms).
pub const QUIET_MS: u64 = 200;

/// Raw websocket participant speaking the relay wire format.
pub struct TestWsClient {
    pub id: ParticipantId,
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestWsClient {
    pub async fn connect(addr: SocketAddr, room: &str, id: &str) -> Self {
        let url = format!("ws://{}/ws/{}/{}", addr, room, id);
        let (socket, _) = connect_async(url.as_str())
            .await
            .expect("Failed to connect to relay");
        Self {
            id: ParticipantId::from(id),
            socket,
        }
    }

    pub async fn send(&mut self, message: RelayMessage) {
        let frame = RelayFrame::new(self.id.clone(), message);
        self.send_frame(&frame).await;
    }

    pub async fn send_frame(&mut self, frame: &RelayFrame) {
        let json = frame.encode().expect("Failed to encode frame");
        self.send_text(json).await;
    }

    pub async fn send_text(&mut self, text: String) {
        self.socket
            .send(Message::Text(text.into()))
            .await
            .expect("Failed to send");
    }

    pub async fn recv(&mut self) -> RelayFrame {
        self.try_recv(FRAME_TIMEOUT_MS)
            .await
            .unwrap_or_else(|| panic!("{} received no frame", self.id))
    }

    async fn try_recv(&mut self, timeout_ms: u64) -> Option<RelayFrame> {
        let deadline = Duration::from_millis(timeout_ms);
        loop {
            let next = tokio::time::timeout(deadline, self.socket.next()).await.ok()??;
            match next {
                Ok(Message::Text(text)) => {
                    return Some(RelayFrame::decode(text.as_str()).expect("Relay sent invalid frame"));
                }
                Ok(Message::Close(_)) | Err(_) => return None,
                Ok(_) => continue,
            }
        }
    }

    /// Asserts nothing arrives for a short while.
    pub async fn expect_quiet(&mut self) {
        if let Some(frame) = self.try_recv(QUIET_MS).await {
            panic!("{} got unexpected frame {:?}", self.id, frame);
        }
    }

    /// Waits until the relay closes this connection.
    pub async fn expect_closed(&mut self) {
        let deadline = Duration::from_millis(FRAME_TIMEOUT_MS);
        let closed = tokio::time::timeout(deadline, async {
            loop {
                match self.socket.next().await {
                    None | Some(Err(_)) | Some(Ok(Message::Close(_))) => return,
                    Some(Ok(_)) => continue,
                }
            }
        })
        .await;
        assert!(closed.is_ok(), "{} was not closed by the relay", self.id);
    }

    pub async fn close(mut self) {
        let _ = self.socket.close(None).await;
    }
}
