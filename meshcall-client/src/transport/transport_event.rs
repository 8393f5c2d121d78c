use crate::peer::RemoteTrack;
use meshcall_core::{IceCandidate, ParticipantId};
use std::fmt;

/// One transport instance toward a participant. A link that replaces an
/// earlier one for the same participant gets a higher `epoch`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinkId {
    pub remote_id: ParticipantId,
    pub epoch: u64,
}

impl LinkId {
    pub fn new(remote_id: ParticipantId, epoch: u64) -> Self {
        Self { remote_id, epoch }
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.remote_id, self.epoch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// События, которые транспорт генерирует для главного цикла сессии.
#[derive(Debug)]
pub enum LinkEvent {
    /// Сгенерирован локальный ICE-кандидат, его нужно отправить участнику.
    CandidateGenerated(LinkId, IceCandidate),

    /// Пришёл медиа-трек от удалённого участника.
    RemoteTrack(LinkId, RemoteTrack),

    /// Изменилось состояние соединения с участником.
    StateChanged(LinkId, TransportState),
}

impl LinkEvent {
    /// Transport that produced the event.
    pub fn link(&self) -> &LinkId {
        match self {
            LinkEvent::CandidateGenerated(link, _)
            | LinkEvent::RemoteTrack(link, _)
            | LinkEvent::StateChanged(link, _) => link,
        }
    }
}
