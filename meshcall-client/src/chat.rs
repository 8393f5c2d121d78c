use meshcall_core::utils::now_millis;
use meshcall_core::{ParticipantId, RelayMessage};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOrigin {
    Local,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: Uuid,
    pub sender_id: ParticipantId,
    pub sender_name: String,
    pub text: String,
    /// Sender's clock, milliseconds since the unix epoch.
    pub timestamp: u64,
    pub origin: MessageOrigin,
}

/// Chat log in receipt order. Nothing here is persisted.
pub struct ChatRelay {
    self_id: ParticipantId,
    self_name: String,
    messages: Vec<ChatMessage>,
}

impl ChatRelay {
    pub fn new(self_id: ParticipantId, self_name: String) -> Self {
        Self {
            self_id,
            self_name,
            messages: Vec::new(),
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Records a local message and builds the frame to transmit.
    /// Blank text yields `None`.
    pub fn compose(&mut self, text: &str) -> Option<(RelayMessage, ChatMessage)> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let timestamp = now_millis();
        let message = ChatMessage {
            id: Uuid::new_v4(),
            sender_id: self.self_id.clone(),
            sender_name: self.self_name.clone(),
            text: text.to_owned(),
            timestamp,
            origin: MessageOrigin::Local,
        };
        self.messages.push(message.clone());

        let frame = RelayMessage::ChatMessage {
            message: text.to_owned(),
            timestamp,
            user_name: Some(self.self_name.clone()),
        };
        Some((frame, message))
    }

    pub fn receive(
        &mut self,
        from: ParticipantId,
        text: String,
        timestamp: u64,
        user_name: Option<String>,
    ) -> ChatMessage {
        let sender_name = user_name.unwrap_or_else(|| format!("Participant {}", from));
        let message = ChatMessage {
            id: Uuid::new_v4(),
            sender_id: from,
            sender_name,
            text,
            timestamp,
            origin: MessageOrigin::Remote,
        };
        self.messages.push(message.clone());
        message
    }

    /// Local reset only; remote participants keep their history.
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
