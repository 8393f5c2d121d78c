use crate::error::NegotiationError;
use crate::media::LocalMedia;
use crate::peer::peer_link::{NegotiationState, PeerLink, PeerLinkSnapshot};
use crate::peer::remote_stream::{RemoteStream, RemoteTrack};
use crate::relay::SignalingOutput;
use crate::transport::{LinkEvent, LinkId, TransportFactory};
use meshcall_core::{IceCandidate, ParticipantId, SessionDescription};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Owns every PeerLink, at most one per remote participant.
///
/// Every failing operation closes and removes the affected link before the
/// error is returned; other links are never touched.
pub struct PeerLinkTable {
    self_id: ParticipantId,
    links: HashMap<ParticipantId, PeerLink>,
    next_epoch: u64,
    transports: Arc<dyn TransportFactory>,
    signaling: Arc<dyn SignalingOutput>,
    link_events: mpsc::Sender<LinkEvent>,
}

impl PeerLinkTable {
    pub fn new(
        self_id: ParticipantId,
        transports: Arc<dyn TransportFactory>,
        signaling: Arc<dyn SignalingOutput>,
        link_events: mpsc::Sender<LinkEvent>,
    ) -> Self {
        Self {
            self_id,
            links: HashMap::new(),
            next_epoch: 0,
            transports,
            signaling,
            link_events,
        }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn contains(&self, remote_id: &ParticipantId) -> bool {
        self.links.contains_key(remote_id)
    }

    pub fn state(&self, remote_id: &ParticipantId) -> Option<NegotiationState> {
        self.links.get(remote_id).map(PeerLink::state)
    }

    /// Whether `link` is the transport currently in the table. Events of
    /// closed or replaced transports fail this check.
    pub fn is_current(&self, link: &LinkId) -> bool {
        self.links
            .get(&link.remote_id)
            .is_some_and(|l| l.epoch() == link.epoch)
    }

    pub fn get(&self, remote_id: &ParticipantId) -> Option<&PeerLink> {
        self.links.get(remote_id)
    }

    pub fn remote_stream(&self, remote_id: &ParticipantId) -> Option<&RemoteStream> {
        self.links.get(remote_id).and_then(PeerLink::remote_stream)
    }

    pub fn snapshot(&self) -> Vec<PeerLinkSnapshot> {
        let mut links: Vec<_> = self.links.values().map(PeerLink::snapshot).collect();
        links.sort_by(|a, b| a.remote_id.cmp(&b.remote_id));
        links
    }

    async fn create_link(&mut self, remote_id: &ParticipantId) -> Result<(), NegotiationError> {
        self.next_epoch += 1;
        let link = LinkId::new(remote_id.clone(), self.next_epoch);
        let transport = self
            .transports
            .create(link.clone(), self.link_events.clone())
            .await
            .map_err(|e| NegotiationError::Transport(format!("{:#}", e)))?;
        info!("PeerLink created: {}", link);
        self.links
            .insert(remote_id.clone(), PeerLink::new(link, transport));
        Ok(())
    }

    /// Creates a link toward `remote_id` and sends it an offer. No-op when a
    /// link already exists.
    pub async fn initiate(
        &mut self,
        remote_id: &ParticipantId,
        local: &LocalMedia,
    ) -> Result<Option<NegotiationState>, NegotiationError> {
        if self.links.contains_key(remote_id) {
            debug!("PeerLink for {} already exists, not initiating", remote_id);
            return Ok(None);
        }
        self.create_link(remote_id).await?;

        let result = match self.links.get_mut(remote_id) {
            Some(link) => match link.attach(local).await {
                Ok(()) => link.offer().await,
                Err(e) => Err(e),
            },
            None => return Ok(None),
        };

        match result {
            Ok(offer) => {
                info!("Sending offer to {}", remote_id);
                self.signaling.send_offer(remote_id.clone(), offer).await;
                Ok(Some(NegotiationState::Offering))
            }
            Err(e) => Err(self.fail(remote_id, e).await),
        }
    }

    /// Answers an offer, creating the link on demand.
    ///
    /// When both sides offered at once, the lexically lower id keeps its own
    /// offer and ignores the incoming one (`Ok(None)`).
    pub async fn handle_offer(
        &mut self,
        from: &ParticipantId,
        offer: SessionDescription,
        local: &LocalMedia,
    ) -> Result<Option<NegotiationState>, NegotiationError> {
        if self.state(from) == Some(NegotiationState::Offering) {
            if self.self_id < *from {
                info!("Offer collision with {}, keeping ours", from);
                return Ok(None);
            }
            info!("Offer collision with {}, answering theirs", from);
            self.close(from).await;
        }

        if !self.links.contains_key(from) {
            self.create_link(from).await?;
        }

        let result = match self.links.get_mut(from) {
            Some(link) => match link.attach(local).await {
                Ok(()) => link.accept_offer(offer).await,
                Err(e) => Err(e),
            },
            None => return Ok(None),
        };

        match result {
            Ok(answer) => {
                info!("Sending answer to {}", from);
                self.signaling.send_answer(from.clone(), answer).await;
                Ok(Some(NegotiationState::Negotiated))
            }
            Err(e) => Err(self.fail(from, e).await),
        }
    }

    pub async fn handle_answer(
        &mut self,
        from: &ParticipantId,
        answer: SessionDescription,
    ) -> Result<Option<NegotiationState>, NegotiationError> {
        let Some(link) = self.links.get_mut(from) else {
            debug!("Dropping answer from {}: no PeerLink", from);
            return Ok(None);
        };
        if link.state() != NegotiationState::Offering {
            warn!(
                "Ignoring answer from {} in state {:?}",
                from,
                link.state()
            );
            return Ok(None);
        }

        match link.accept_answer(answer).await {
            Ok(()) => {
                info!("Negotiated with {}", from);
                Ok(Some(NegotiationState::Negotiated))
            }
            Err(e) => Err(self.fail(from, e).await),
        }
    }

    pub async fn handle_remote_candidate(
        &mut self,
        from: &ParticipantId,
        candidate: IceCandidate,
    ) -> Result<(), NegotiationError> {
        let Some(link) = self.links.get_mut(from) else {
            debug!("Dropping candidate from {}: no PeerLink", from);
            return Ok(());
        };
        match link.add_remote_candidate(candidate).await {
            Ok(_) => Ok(()),
            Err(e) => Err(self.fail(from, e).await),
        }
    }

    /// Forwards a locally gathered candidate as soon as it is produced.
    pub async fn send_local_candidate(&self, link: &LinkId, candidate: IceCandidate) {
        if !self.is_current(link) {
            debug!("Dropping local candidate of stale link {}", link);
            return;
        }
        self.signaling.send_ice(link.remote_id.clone(), candidate).await;
    }

    pub fn add_remote_track(&mut self, link: &LinkId, track: RemoteTrack) -> Option<RemoteStream> {
        if !self.is_current(link) {
            return None;
        }
        let peer = self.links.get_mut(&link.remote_id)?;
        Some(peer.add_remote_track(track).clone())
    }

    /// Moves every link onto the tracks of `local`. Links whose transport
    /// cannot swap in place get a fresh offer.
    pub async fn replace_tracks(
        &mut self,
        local: &LocalMedia,
    ) -> Vec<(ParticipantId, Result<Option<NegotiationState>, NegotiationError>)> {
        let mut ids: Vec<ParticipantId> = self.links.keys().cloned().collect();
        ids.sort();

        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(link) = self.links.get_mut(&id) else {
                continue;
            };
            let result = match link.replace_tracks(local).await {
                Ok(Some(offer)) => {
                    info!("Renegotiating with {} after track replacement", id);
                    self.signaling.send_offer(id.clone(), offer).await;
                    Ok(Some(NegotiationState::Offering))
                }
                Ok(None) => Ok(None),
                Err(e) => Err(self.fail(&id, e).await),
            };
            results.push((id, result));
        }
        results
    }

    /// Closes the link after a local or transport failure and hands the
    /// error back.
    pub async fn fail(&mut self, remote_id: &ParticipantId, err: NegotiationError) -> NegotiationError {
        error!("PeerLink for {} failed: {}", remote_id, err);
        self.close(remote_id).await;
        err
    }

    /// Removes the link before releasing its transport, so anything arriving
    /// later for `remote_id` finds no entry.
    pub async fn close(&mut self, remote_id: &ParticipantId) -> bool {
        let Some(link) = self.links.remove(remote_id) else {
            return false;
        };
        link.close().await;
        info!("PeerLink closed for {}", remote_id);
        true
    }

    pub async fn close_all(&mut self) {
        let links: Vec<PeerLink> = self.links.drain().map(|(_, link)| link).collect();
        for link in links {
            link.close().await;
        }
    }
}
