use crate::chat::ChatMessage;
use crate::error::CaptureError;
use crate::media::LocalMediaSummary;
use crate::membership::Participant;
use crate::peer::{NegotiationState, PeerLinkSnapshot, RemoteStream};
use meshcall_core::ParticipantId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayStatus {
    Connecting,
    Connected,
    /// The relay connection dropped. Only a fresh session recovers.
    Lost,
    Closed,
}

/// Everything the presentation layer needs to follow a session.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Status(RelayStatus),
    CaptureWarning(CaptureError),
    LocalMediaChanged(LocalMediaSummary),
    ParticipantJoined(Participant),
    ParticipantLeft(ParticipantId),
    ParticipantUnreachable { id: ParticipantId, reason: String },
    NegotiationChanged {
        id: ParticipantId,
        state: NegotiationState,
    },
    RemoteStream {
        id: ParticipantId,
        stream: RemoteStream,
    },
    RemoteStreamRemoved(ParticipantId),
    Chat(ChatMessage),
    ChatCleared,
}

#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub participants: Vec<Participant>,
    pub links: Vec<PeerLinkSnapshot>,
    pub local_media: LocalMediaSummary,
    pub chat: Vec<ChatMessage>,
    pub relay: RelayStatus,
}

impl SessionSnapshot {
    pub fn participant_ids(&self) -> Vec<ParticipantId> {
        self.participants.iter().map(|p| p.id.clone()).collect()
    }

    pub fn link(&self, id: &ParticipantId) -> Option<&PeerLinkSnapshot> {
        self.links.iter().find(|l| l.remote_id == *id)
    }
}
