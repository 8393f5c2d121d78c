use crate::chat::ChatMessage;
use crate::config::MediaConstraints;
use crate::session::session_event::SessionSnapshot;
use tokio::sync::oneshot;

/// Команды, поступающие в сессию от слоя отображения.
#[derive(Debug)]
pub enum SessionCommand {
    /// Включить/выключить микрофон. Ответ: итоговое состояние.
    ToggleAudio { reply: oneshot::Sender<bool> },

    /// Включить/выключить камеру. Ответ: итоговое состояние.
    ToggleVideo { reply: oneshot::Sender<bool> },

    /// Перезапуск устройств захвата. Ответ: поколение нового захвата.
    RestartCapture {
        constraints: Option<MediaConstraints>,
        reply: oneshot::Sender<u64>,
    },

    /// Сообщение в чат. Ответ: локальная запись или `None` для пустого текста.
    SendChat {
        text: String,
        reply: oneshot::Sender<Option<ChatMessage>>,
    },

    /// Очистить локальную историю чата.
    ClearChat,

    Snapshot { reply: oneshot::Sender<SessionSnapshot> },

    /// Покинуть комнату.
    Leave { done: oneshot::Sender<()> },
}
