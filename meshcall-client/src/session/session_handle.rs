use crate::chat::ChatMessage;
use crate::config::MediaConstraints;
use crate::error::SessionClosed;
use crate::session::session_command::SessionCommand;
use crate::session::session_event::SessionSnapshot;
use meshcall_core::ParticipantId;
use tokio::sync::{mpsc, oneshot};

/// Cloneable command side of a running [`RoomSession`](super::RoomSession).
#[derive(Clone)]
pub struct SessionHandle {
    self_id: ParticipantId,
    commands: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub(crate) fn new(self_id: ParticipantId, commands: mpsc::Sender<SessionCommand>) -> Self {
        Self { self_id, commands }
    }

    pub fn self_id(&self) -> &ParticipantId {
        &self.self_id
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, SessionClosed> {
        let (tx, rx) = oneshot::channel();
        self.commands.send(make(tx)).await.map_err(|_| SessionClosed)?;
        rx.await.map_err(|_| SessionClosed)
    }

    pub async fn toggle_audio(&self) -> Result<bool, SessionClosed> {
        self.request(|reply| SessionCommand::ToggleAudio { reply })
            .await
    }

    pub async fn toggle_video(&self) -> Result<bool, SessionClosed> {
        self.request(|reply| SessionCommand::ToggleVideo { reply })
            .await
    }

    /// Starts a device restart and returns its generation. The new media is
    /// announced later through `SessionEvent::LocalMediaChanged`.
    pub async fn restart_capture(
        &self,
        constraints: Option<MediaConstraints>,
    ) -> Result<u64, SessionClosed> {
        self.request(|reply| SessionCommand::RestartCapture { constraints, reply })
            .await
    }

    pub async fn send_chat(&self, text: impl Into<String>) -> Result<Option<ChatMessage>, SessionClosed> {
        let text = text.into();
        self.request(|reply| SessionCommand::SendChat { text, reply })
            .await
    }

    pub async fn clear_chat(&self) -> Result<(), SessionClosed> {
        self.commands
            .send(SessionCommand::ClearChat)
            .await
            .map_err(|_| SessionClosed)
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionClosed> {
        self.request(|reply| SessionCommand::Snapshot { reply }).await
    }

    pub async fn leave(&self) -> Result<(), SessionClosed> {
        self.request(|done| SessionCommand::Leave { done }).await
    }
}
