use crate::model::participant::ParticipantId;
use crate::model::signaling::{IceCandidate, SessionDescription};
use serde::{Deserialize, Serialize};

/// Messages carried by the relay channel, discriminated by their `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RelayMessage {
    #[serde(rename = "user_joined")]
    UserJoined {
        user_id: ParticipantId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_name: Option<String>,
    },

    #[serde(rename = "user_left")]
    UserLeft { user_id: ParticipantId },

    /// Sent by the relay to a newly connected client only.
    #[serde(rename = "existing_users")]
    ExistingUsers { users: Vec<ParticipantId> },

    #[serde(rename = "offer")]
    Offer {
        offer: SessionDescription,
        to_user_id: ParticipantId,
    },

    #[serde(rename = "answer")]
    Answer {
        answer: SessionDescription,
        to_user_id: ParticipantId,
    },

    #[serde(rename = "ice-candidate")]
    IceCandidate {
        candidate: IceCandidate,
        to_user_id: ParticipantId,
    },

    #[serde(rename = "chat_message")]
    ChatMessage {
        message: String,
        timestamp: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_name: Option<String>,
    },
}

impl RelayMessage {
    /// Recipient of a directed negotiation message; `None` means broadcast.
    pub fn target(&self) -> Option<&ParticipantId> {
        match self {
            RelayMessage::Offer { to_user_id, .. }
            | RelayMessage::Answer { to_user_id, .. }
            | RelayMessage::IceCandidate { to_user_id, .. } => Some(to_user_id),
            RelayMessage::UserJoined { .. }
            | RelayMessage::UserLeft { .. }
            | RelayMessage::ExistingUsers { .. }
            | RelayMessage::ChatMessage { .. } => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RelayMessage::UserJoined { .. } => "user_joined",
            RelayMessage::UserLeft { .. } => "user_left",
            RelayMessage::ExistingUsers { .. } => "existing_users",
            RelayMessage::Offer { .. } => "offer",
            RelayMessage::Answer { .. } => "answer",
            RelayMessage::IceCandidate { .. } => "ice-candidate",
            RelayMessage::ChatMessage { .. } => "chat_message",
        }
    }
}

/// A relay message together with the sender stamp (`from_user_id`).
///
/// The stamp is absent only on frames originated by the relay itself
/// (for example the `existing_users` roster).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_user_id: Option<ParticipantId>,
    #[serde(flatten)]
    pub message: RelayMessage,
}

impl RelayFrame {
    pub fn new(from: ParticipantId, message: RelayMessage) -> Self {
        Self {
            from_user_id: Some(from),
            message,
        }
    }

    pub fn from_relay(message: RelayMessage) -> Self {
        Self {
            from_user_id: None,
            message,
        }
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn decode(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
