use crate::error::{RelayLinkError, TransmitError};
use crate::relay::signaling_output::SignalingOutput;
use async_trait::async_trait;
use meshcall_core::{
    IceCandidate, ParticipantId, RelayFrame, RelayMessage, RoomId, SessionDescription,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub enum RelayCommand {
    Send(RelayFrame),
    Close,
}

/// One opened duplex connection to the relay.
///
/// `inbound` ends when the underlying connection is lost.
pub struct RelayChannel {
    pub outbound: mpsc::UnboundedSender<RelayCommand>,
    pub inbound: mpsc::UnboundedReceiver<RelayFrame>,
}

/// Opens the room-scoped relay connection. Resolves once it is open.
#[async_trait]
pub trait RelayConnector: Send + Sync {
    async fn connect(
        &self,
        room_id: &RoomId,
        self_id: &ParticipantId,
    ) -> Result<RelayChannel, RelayLinkError>;
}

/// Outbound half of the relay connection, stamped with the local identity.
///
/// Delivery is at most once; nothing is queued or retried.
#[derive(Clone)]
pub struct RelayLink {
    self_id: ParticipantId,
    outbound: mpsc::UnboundedSender<RelayCommand>,
    closed: Arc<AtomicBool>,
}

impl RelayLink {
    pub async fn connect(
        connector: &dyn RelayConnector,
        room_id: &RoomId,
        self_id: &ParticipantId,
    ) -> Result<(Self, mpsc::UnboundedReceiver<RelayFrame>), RelayLinkError> {
        let channel = connector.connect(room_id, self_id).await?;
        info!("Relay link open for {} in room {}", self_id, room_id);

        let link = Self {
            self_id: self_id.clone(),
            outbound: channel.outbound,
            closed: Arc::new(AtomicBool::new(false)),
        };
        Ok((link, channel.inbound))
    }

    pub fn self_id(&self) -> &ParticipantId {
        &self.self_id
    }

    pub fn is_open(&self) -> bool {
        !self.closed.load(Ordering::Relaxed) && !self.outbound.is_closed()
    }

    pub fn send(&self, message: RelayMessage) -> Result<(), TransmitError> {
        let kind = message.kind();
        if !self.is_open() {
            warn!("Dropping {} message: relay link is not open", kind);
            return Err(TransmitError::LinkClosed(kind));
        }

        let frame = RelayFrame::new(self.self_id.clone(), message);
        if self.outbound.send(RelayCommand::Send(frame)).is_err() {
            warn!("Dropping {} message: relay link went away", kind);
            return Err(TransmitError::LinkClosed(kind));
        }
        debug!("Sent {} frame", kind);
        Ok(())
    }

    /// Drops frames the relay echoed back from this participant.
    pub fn accept(&self, frame: RelayFrame) -> Option<RelayFrame> {
        if frame.from_user_id.as_ref() == Some(&self.self_id) {
            debug!("Ignoring self-originated {} frame", frame.message.kind());
            return None;
        }
        Some(frame)
    }

    pub fn close(&self) {
        if self.closed.swap(true, Ordering::Relaxed) {
            return;
        }
        let _ = self.outbound.send(RelayCommand::Close);
        info!("Relay link closed for {}", self.self_id);
    }
}

#[async_trait]
impl SignalingOutput for RelayLink {
    async fn send_offer(&self, peer_id: ParticipantId, offer: SessionDescription) {
        let _ = self.send(RelayMessage::Offer {
            offer,
            to_user_id: peer_id,
        });
    }

    async fn send_answer(&self, peer_id: ParticipantId, answer: SessionDescription) {
        let _ = self.send(RelayMessage::Answer {
            answer,
            to_user_id: peer_id,
        });
    }

    async fn send_ice(&self, peer_id: ParticipantId, candidate: IceCandidate) {
        let _ = self.send(RelayMessage::IceCandidate {
            candidate,
            to_user_id: peer_id,
        });
    }
}
