use crate::media::MediaKind;
use std::fmt;
use std::sync::Arc;
use webrtc::track::track_remote::TrackRemote;

/// A track received from a remote participant.
#[derive(Clone)]
pub struct RemoteTrack {
    pub id: String,
    pub stream_id: String,
    pub kind: MediaKind,
    /// RTP source to read from; absent for transports that carry no RTP.
    pub rtp: Option<Arc<TrackRemote>>,
}

impl fmt::Debug for RemoteTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteTrack")
            .field("id", &self.id)
            .field("stream_id", &self.stream_id)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Everything received so far from one remote participant.
#[derive(Debug, Clone, Default)]
pub struct RemoteStream {
    tracks: Vec<RemoteTrack>,
}

impl RemoteStream {
    pub fn tracks(&self) -> &[RemoteTrack] {
        &self.tracks
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Adds `track`, replacing any earlier track of the same kind.
    pub(crate) fn insert(&mut self, track: RemoteTrack) {
        self.tracks.retain(|t| t.kind != track.kind);
        self.tracks.push(track);
        self.tracks.sort_by_key(|t| t.kind);
    }
}
