use crate::media::LocalTrack;
use crate::transport::transport_event::{LinkEvent, LinkId};
use anyhow::Result;
use async_trait::async_trait;
use meshcall_core::{IceCandidate, SessionDescription};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// Outgoing tracks were swapped in place.
    Replaced,
    /// The new track set needs a fresh offer/answer round.
    RenegotiationNeeded,
}

/// Connection resources of one PeerLink.
///
/// `create_offer` and `create_answer` also install the produced description
/// as the local one.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn attach_tracks(&self, tracks: &[LocalTrack]) -> Result<()>;

    async fn replace_tracks(&self, tracks: &[LocalTrack]) -> Result<ReplaceOutcome>;

    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Builds transports; each reports its events on `events`, tagged with
/// `link` so that events of a replaced transport can be told apart.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn create(
        &self,
        link: LinkId,
        events: mpsc::Sender<LinkEvent>,
    ) -> Result<Box<dyn PeerTransport>>;
}
