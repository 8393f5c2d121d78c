use crate::config::MediaConstraints;
use crate::error::CaptureError;
use crate::media::track::{LocalTrack, MediaKind};
use async_trait::async_trait;
use uuid::Uuid;

/// Capture backend. Resolves to the tracks matching `constraints`.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    async fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<Vec<LocalTrack>, CaptureError>;
}

/// Produces sample-fed tracks instead of reading real hardware.
///
/// Frames reach the far end only when the owner writes them through
/// [`LocalTrack::write_sample`].
#[derive(Debug, Clone)]
pub struct SyntheticDevices {
    available: bool,
}

impl SyntheticDevices {
    pub fn new() -> Self {
        Self { available: true }
    }

    /// A backend with no devices at all, for chat-only participation.
    pub fn unavailable() -> Self {
        Self { available: false }
    }
}

impl Default for SyntheticDevices {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaDevices for SyntheticDevices {
    async fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<Vec<LocalTrack>, CaptureError> {
        if !self.available {
            return Err(CaptureError::Unavailable);
        }

        let stream_id = Uuid::new_v4().to_string();
        let mut tracks = Vec::new();
        if constraints.audio {
            tracks.push(LocalTrack::synthetic(MediaKind::Audio, &stream_id));
        }
        if constraints.video.is_some() {
            tracks.push(LocalTrack::synthetic(MediaKind::Video, &stream_id));
        }
        Ok(tracks)
    }
}
