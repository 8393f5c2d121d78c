use anyhow::Result;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    pub fn codec(self) -> RTCRtpCodecCapability {
        match self {
            MediaKind::Audio => RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: 48000,
                channels: 2,
                ..Default::default()
            },
            MediaKind::Video => RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                clock_rate: 90000,
                ..Default::default()
            },
        }
    }
}

impl From<RTPCodecType> for MediaKind {
    fn from(kind: RTPCodecType) -> Self {
        match kind {
            RTPCodecType::Audio => MediaKind::Audio,
            _ => MediaKind::Video,
        }
    }
}

impl From<MediaKind> for RTPCodecType {
    fn from(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Audio => RTPCodecType::Audio,
            MediaKind::Video => RTPCodecType::Video,
        }
    }
}

/// One captured track. Clones share the enabled and stopped flags, so every
/// PeerLink that attached the track observes mute and stop immediately.
#[derive(Clone)]
pub struct LocalTrack {
    kind: MediaKind,
    rtp: Arc<TrackLocalStaticSample>,
    enabled: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
}

impl LocalTrack {
    pub fn new(kind: MediaKind, rtp: Arc<TrackLocalStaticSample>) -> Self {
        Self {
            kind,
            rtp,
            enabled: Arc::new(AtomicBool::new(true)),
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A sample track with the default codec for `kind`, fed by the caller.
    pub fn synthetic(kind: MediaKind, stream_id: &str) -> Self {
        let track_id = format!("{}-{}", stream_id, kind_label(kind));
        let rtp = TrackLocalStaticSample::new(kind.codec(), track_id, stream_id.to_owned());
        Self::new(kind, Arc::new(rtp))
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        self.rtp.id()
    }

    pub fn stream_id(&self) -> &str {
        self.rtp.stream_id()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }

    pub fn rtp_track(&self) -> Arc<dyn TrackLocal + Send + Sync> {
        self.rtp.clone()
    }

    /// Push one encoded frame. Muted or stopped tracks swallow the frame;
    /// the result tells whether it was handed to the RTP track.
    pub async fn write_sample(&self, data: Bytes, duration: Duration) -> Result<bool> {
        if self.is_stopped() || !self.is_enabled() {
            return Ok(false);
        }
        self.rtp
            .write_sample(&Sample {
                data,
                duration,
                ..Default::default()
            })
            .await?;
        Ok(true)
    }
}

impl fmt::Debug for LocalTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalTrack")
            .field("id", &self.id())
            .field("kind", &self.kind)
            .field("enabled", &self.is_enabled())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

fn kind_label(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Audio => "audio",
        MediaKind::Video => "video",
    }
}

/// Current capture handle. Shared read-only by every PeerLink; only the
/// capture controller replaces it.
#[derive(Debug, Clone, Default)]
pub struct LocalMedia {
    tracks: Vec<LocalTrack>,
    generation: u64,
    /// Set while a restart of `generation` is still acquiring devices.
    pending: bool,
}

impl LocalMedia {
    pub(crate) fn new(tracks: Vec<LocalTrack>, generation: u64) -> Self {
        Self {
            tracks,
            generation,
            pending: false,
        }
    }

    pub(crate) fn empty(generation: u64) -> Self {
        Self::new(Vec::new(), generation)
    }

    /// Stand-in for `generation` until its restart resolves.
    pub(crate) fn pending(generation: u64) -> Self {
        Self {
            pending: true,
            ..Self::empty(generation)
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn tracks(&self) -> &[LocalTrack] {
        &self.tracks
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn first(&self, kind: MediaKind) -> Option<&LocalTrack> {
        self.tracks.iter().find(|t| t.kind() == kind)
    }

    pub fn audio_enabled(&self) -> bool {
        self.first(MediaKind::Audio).is_some_and(LocalTrack::is_enabled)
    }

    pub fn video_enabled(&self) -> bool {
        self.first(MediaKind::Video).is_some_and(LocalTrack::is_enabled)
    }

    pub(crate) fn stop_all(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }

    pub fn summary(&self) -> LocalMediaSummary {
        LocalMediaSummary {
            generation: self.generation,
            track_count: self.tracks.len(),
            audio_enabled: self.audio_enabled(),
            video_enabled: self.video_enabled(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalMediaSummary {
    pub generation: u64,
    pub track_count: usize,
    pub audio_enabled: bool,
    pub video_enabled: bool,
}
