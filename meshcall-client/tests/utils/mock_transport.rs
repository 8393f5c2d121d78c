use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use meshcall_client::transport::{ReplaceOutcome, TransportState};
use meshcall_client::{
    LinkEvent, LinkId, LocalTrack, MediaKind, PeerTransport, RemoteTrack, TransportFactory,
};
use meshcall_core::{IceCandidate, ParticipantId, SessionDescription};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// What one mock transport went through.
#[derive(Debug, Clone, Default)]
pub struct TransportRecord {
    pub attached: Vec<MediaKind>,
    pub attached_track_ids: Vec<String>,
    pub local_description: Option<SessionDescription>,
    pub remote_description: Option<SessionDescription>,
    pub candidates: Vec<IceCandidate>,
    pub replacements: usize,
    pub closed: bool,
}

struct Entry {
    link: LinkId,
    record: Arc<Mutex<TransportRecord>>,
    events: mpsc::Sender<LinkEvent>,
}

/// Transport factory that negotiates over fake SDP.
///
/// Descriptions look like `v=0 mock from=<owner> tracks=<n>`. Applying one
/// whose text contains `malformed` fails, and so does a candidate added
/// before any remote description.
#[derive(Clone)]
pub struct MockTransportFactory {
    owner: ParticipantId,
    in_place_replace: bool,
    entries: Arc<Mutex<Vec<Entry>>>,
}

impl MockTransportFactory {
    pub fn new(owner: impl Into<ParticipantId>) -> Self {
        Self {
            owner: owner.into(),
            in_place_replace: true,
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Track replacement always asks for renegotiation.
    pub fn renegotiating(mut self) -> Self {
        self.in_place_replace = false;
        self
    }

    pub fn created_for(&self, remote_id: &ParticipantId) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.link.remote_id == *remote_id)
            .count()
    }

    /// Latest transport created toward `remote_id`.
    pub fn latest(&self, remote_id: &ParticipantId) -> Option<TransportRecord> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|e| e.link.remote_id == *remote_id)
            .map(|e| e.record.lock().unwrap().clone())
    }

    pub fn records(&self, remote_id: &ParticipantId) -> Vec<TransportRecord> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.link.remote_id == *remote_id)
            .map(|e| e.record.lock().unwrap().clone())
            .collect()
    }

    /// Event channel of the `nth` transport toward `remote_id`, or of the
    /// latest one when `nth` is `None`.
    fn events_of(
        &self,
        remote_id: &ParticipantId,
        nth: Option<usize>,
    ) -> Option<(LinkId, mpsc::Sender<LinkEvent>)> {
        let entries = self.entries.lock().unwrap();
        let mut matching: Vec<&Entry> = entries
            .iter()
            .filter(|e| e.link.remote_id == *remote_id)
            .collect();
        let entry = match nth {
            Some(n) => matching.get(n).copied(),
            None => matching.pop(),
        }?;
        Some((entry.link.clone(), entry.events.clone()))
    }

    /// Reports the latest transport toward `remote_id` as failed.
    pub async fn fail(&self, remote_id: &ParticipantId) {
        self.fail_nth_inner(remote_id, None).await;
    }

    /// Reports the `n`-th transport ever created toward `remote_id` as
    /// failed, even if it was closed since.
    pub async fn fail_nth(&self, remote_id: &ParticipantId, n: usize) {
        self.fail_nth_inner(remote_id, Some(n)).await;
    }

    async fn fail_nth_inner(&self, remote_id: &ParticipantId, nth: Option<usize>) {
        if let Some((link, events)) = self.events_of(remote_id, nth) {
            let _ = events
                .send(LinkEvent::StateChanged(link, TransportState::Failed))
                .await;
        }
    }

    /// Makes the `n`-th transport toward `remote_id` emit a local candidate.
    pub async fn gather_nth(&self, remote_id: &ParticipantId, n: usize, candidate: &str) {
        if let Some((link, events)) = self.events_of(remote_id, Some(n)) {
            let _ = events
                .send(LinkEvent::CandidateGenerated(link, IceCandidate::new(candidate)))
                .await;
        }
    }
}

#[async_trait]
impl TransportFactory for MockTransportFactory {
    async fn create(
        &self,
        link: LinkId,
        events: mpsc::Sender<LinkEvent>,
    ) -> Result<Box<dyn PeerTransport>> {
        let record = Arc::new(Mutex::new(TransportRecord::default()));
        self.entries.lock().unwrap().push(Entry {
            link: link.clone(),
            record: record.clone(),
            events: events.clone(),
        });
        Ok(Box::new(MockTransport {
            owner: self.owner.clone(),
            link,
            in_place_replace: self.in_place_replace,
            record,
            events,
        }))
    }
}

struct MockTransport {
    owner: ParticipantId,
    link: LinkId,
    in_place_replace: bool,
    record: Arc<Mutex<TransportRecord>>,
    events: mpsc::Sender<LinkEvent>,
}

impl MockTransport {
    fn describe(&self) -> String {
        let tracks = self.record.lock().unwrap().attached.len();
        format!("v=0 mock from={} tracks={}", self.owner, tracks)
    }

    fn gather(&self, n: usize) {
        let candidate = IceCandidate::new(format!("candidate:{}-{}", self.owner, n));
        let _ = self
            .events
            .try_send(LinkEvent::CandidateGenerated(self.link.clone(), candidate));
    }

    fn record_tracks(&self, tracks: &[LocalTrack]) {
        let mut record = self.record.lock().unwrap();
        record.attached = tracks.iter().map(LocalTrack::kind).collect();
        record.attached_track_ids = tracks.iter().map(|t| t.id().to_owned()).collect();
    }
}

fn remote_track_count(sdp: &str) -> usize {
    sdp.split_whitespace()
        .find_map(|part| part.strip_prefix("tracks="))
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

#[async_trait]
impl PeerTransport for MockTransport {
    async fn attach_tracks(&self, tracks: &[LocalTrack]) -> Result<()> {
        self.record_tracks(tracks);
        Ok(())
    }

    /// Like the webrtc transport, a kind without a sender yet cannot be
    /// swapped in place.
    async fn replace_tracks(&self, tracks: &[LocalTrack]) -> Result<ReplaceOutcome> {
        let had = self.record.lock().unwrap().attached.clone();
        let new_kind = tracks.iter().any(|t| !had.contains(&t.kind()));
        self.record_tracks(tracks);
        self.record.lock().unwrap().replacements += 1;
        if self.in_place_replace && !new_kind {
            Ok(ReplaceOutcome::Replaced)
        } else {
            Ok(ReplaceOutcome::RenegotiationNeeded)
        }
    }

    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = SessionDescription::offer(self.describe());
        self.record.lock().unwrap().local_description = Some(offer.clone());
        self.gather(1);
        Ok(offer)
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        if self.record.lock().unwrap().remote_description.is_none() {
            bail!("no remote offer to answer");
        }
        let answer = SessionDescription::answer(self.describe());
        self.record.lock().unwrap().local_description = Some(answer.clone());
        self.gather(1);
        Ok(answer)
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        if description.sdp.contains("malformed") {
            bail!("cannot parse remote description");
        }
        let tracks = remote_track_count(&description.sdp);
        self.record.lock().unwrap().remote_description = Some(description);

        let kinds = [MediaKind::Audio, MediaKind::Video];
        for kind in kinds.into_iter().take(tracks) {
            let track = RemoteTrack {
                id: format!("{}-{:?}", self.link.remote_id, kind),
                stream_id: self.link.remote_id.to_string(),
                kind,
                rtp: None,
            };
            let _ = self
                .events
                .try_send(LinkEvent::RemoteTrack(self.link.clone(), track));
        }
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let mut record = self.record.lock().unwrap();
        if record.remote_description.is_none() {
            return Err(anyhow!("candidate before remote description"));
        }
        if candidate.candidate.contains("malformed") {
            bail!("cannot parse candidate");
        }
        record.candidates.push(candidate);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.record.lock().unwrap().closed = true;
        Ok(())
    }
}
