use crate::error::NegotiationError;
use crate::media::LocalMedia;
use crate::peer::remote_stream::{RemoteStream, RemoteTrack};
use crate::transport::{LinkId, PeerTransport, ReplaceOutcome};
use meshcall_core::{IceCandidate, ParticipantId, SessionDescription};
use std::collections::VecDeque;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Idle,
    Offering,
    Answering,
    Negotiated,
    Closed,
}

/// Negotiation state machine and connection resources for one remote
/// participant.
pub struct PeerLink {
    remote_id: ParticipantId,
    epoch: u64,
    state: NegotiationState,
    pending_candidates: VecDeque<IceCandidate>,
    remote_description_applied: bool,
    local_tracks_attached: bool,
    attached_generation: Option<u64>,
    remote_stream: Option<RemoteStream>,
    transport: Box<dyn PeerTransport>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerLinkSnapshot {
    pub remote_id: ParticipantId,
    pub state: NegotiationState,
    pub pending_candidates: usize,
    pub local_tracks_attached: bool,
    pub has_remote_stream: bool,
}

impl PeerLink {
    pub(crate) fn new(link: LinkId, transport: Box<dyn PeerTransport>) -> Self {
        Self {
            remote_id: link.remote_id,
            epoch: link.epoch,
            state: NegotiationState::Idle,
            pending_candidates: VecDeque::new(),
            remote_description_applied: false,
            local_tracks_attached: false,
            attached_generation: None,
            remote_stream: None,
            transport,
        }
    }

    pub fn remote_id(&self) -> &ParticipantId {
        &self.remote_id
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn pending_candidates(&self) -> usize {
        self.pending_candidates.len()
    }

    pub fn local_tracks_attached(&self) -> bool {
        self.local_tracks_attached
    }

    pub fn remote_stream(&self) -> Option<&RemoteStream> {
        self.remote_stream.as_ref()
    }

    pub fn snapshot(&self) -> PeerLinkSnapshot {
        PeerLinkSnapshot {
            remote_id: self.remote_id.clone(),
            state: self.state,
            pending_candidates: self.pending_candidates.len(),
            local_tracks_attached: self.local_tracks_attached,
            has_remote_stream: self.remote_stream.as_ref().is_some_and(|s| !s.is_empty()),
        }
    }

    pub(crate) async fn attach(&mut self, local: &LocalMedia) -> Result<(), NegotiationError> {
        if self.local_tracks_attached {
            return Ok(());
        }
        self.transport
            .attach_tracks(local.tracks())
            .await
            .map_err(|e| NegotiationError::Attach(format!("{:#}", e)))?;
        self.local_tracks_attached = true;
        // A placeholder attached mid-restart must still be replaced later
        self.attached_generation = (!local.is_pending()).then_some(local.generation());
        Ok(())
    }

    pub(crate) async fn offer(&mut self) -> Result<SessionDescription, NegotiationError> {
        let offer = self
            .transport
            .create_offer()
            .await
            .map_err(|e| NegotiationError::Description(format!("{:#}", e)))?;
        self.state = NegotiationState::Offering;
        Ok(offer)
    }

    pub(crate) async fn accept_offer(
        &mut self,
        offer: SessionDescription,
    ) -> Result<SessionDescription, NegotiationError> {
        self.state = NegotiationState::Answering;
        self.apply_remote(offer).await?;
        let answer = self
            .transport
            .create_answer()
            .await
            .map_err(|e| NegotiationError::Description(format!("{:#}", e)))?;
        self.state = NegotiationState::Negotiated;
        Ok(answer)
    }

    pub(crate) async fn accept_answer(
        &mut self,
        answer: SessionDescription,
    ) -> Result<(), NegotiationError> {
        self.apply_remote(answer).await?;
        self.state = NegotiationState::Negotiated;
        Ok(())
    }

    /// Applies `candidate` now, or queues it until a remote description is
    /// in place. Returns `true` when queued.
    pub(crate) async fn add_remote_candidate(
        &mut self,
        candidate: IceCandidate,
    ) -> Result<bool, NegotiationError> {
        if !self.remote_description_applied {
            self.pending_candidates.push_back(candidate);
            debug!(
                "Buffered candidate from {} ({} pending)",
                self.remote_id,
                self.pending_candidates.len()
            );
            return Ok(true);
        }
        self.apply_candidate(candidate).await?;
        Ok(false)
    }

    async fn apply_remote(&mut self, description: SessionDescription) -> Result<(), NegotiationError> {
        self.transport
            .set_remote_description(description)
            .await
            .map_err(|e| NegotiationError::MalformedDescription(format!("{:#}", e)))?;
        self.remote_description_applied = true;

        while let Some(candidate) = self.pending_candidates.pop_front() {
            self.apply_candidate(candidate).await?;
        }
        Ok(())
    }

    async fn apply_candidate(&self, candidate: IceCandidate) -> Result<(), NegotiationError> {
        self.transport
            .add_ice_candidate(candidate)
            .await
            .map_err(|e| NegotiationError::MalformedCandidate(format!("{:#}", e)))
    }

    /// Swaps outgoing tracks for `local`'s. Returns a fresh offer when the
    /// transport cannot replace in place.
    pub(crate) async fn replace_tracks(
        &mut self,
        local: &LocalMedia,
    ) -> Result<Option<SessionDescription>, NegotiationError> {
        if self.attached_generation == Some(local.generation()) {
            return Ok(None);
        }
        if !self.local_tracks_attached {
            return self.attach(local).await.map(|_| None);
        }

        let outcome = self
            .transport
            .replace_tracks(local.tracks())
            .await
            .map_err(|e| NegotiationError::Attach(format!("{:#}", e)))?;
        self.attached_generation = Some(local.generation());

        match outcome {
            ReplaceOutcome::Replaced => Ok(None),
            ReplaceOutcome::RenegotiationNeeded => self.offer().await.map(Some),
        }
    }

    pub(crate) fn add_remote_track(&mut self, track: RemoteTrack) -> &RemoteStream {
        let stream = self.remote_stream.get_or_insert_with(RemoteStream::default);
        stream.insert(track);
        stream
    }

    pub(crate) async fn close(mut self) {
        self.state = NegotiationState::Closed;
        self.pending_candidates.clear();
        if let Err(e) = self.transport.close().await {
            warn!("Failed to close transport for {}: {:#}", self.remote_id, e);
        }
    }
}
