use async_trait::async_trait;
use meshcall_core::{IceCandidate, ParticipantId, SessionDescription};

/// Канал, через который таблица PeerLink отправляет согласование
/// конкретному участнику (SDP Offer/Answer, ICE).
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Отправить SDP Offer конкретному участнику.
    async fn send_offer(&self, peer_id: ParticipantId, offer: SessionDescription);

    /// Отправить SDP Answer конкретному участнику.
    async fn send_answer(&self, peer_id: ParticipantId, answer: SessionDescription);

    /// Отправить локального ICE кандидата конкретному участнику.
    async fn send_ice(&self, peer_id: ParticipantId, candidate: IceCandidate);
}
