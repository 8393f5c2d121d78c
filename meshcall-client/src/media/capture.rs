use crate::config::MediaConstraints;
use crate::error::CaptureError;
use crate::media::devices::MediaDevices;
use crate::media::track::{LocalMedia, LocalTrack, MediaKind};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of an acquisition. A failed capture still yields (empty) media.
#[derive(Debug, Clone)]
pub struct Acquired {
    pub media: LocalMedia,
    pub warning: Option<CaptureError>,
}

/// A device restart that has been started but not yet resolved.
///
/// Running it does not touch the controller, so several tickets may be in
/// flight at once; only the one matching the controller's current
/// generation is applied by [`CaptureController::complete_restart`].
pub struct RestartTicket {
    generation: u64,
    devices: Arc<dyn MediaDevices>,
    constraints: MediaConstraints,
}

impl RestartTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub async fn run(self) -> RestartOutcome {
        let result = self.devices.get_user_media(&self.constraints).await;
        RestartOutcome {
            generation: self.generation,
            result,
        }
    }
}

#[derive(Debug)]
pub struct RestartOutcome {
    pub generation: u64,
    pub result: Result<Vec<LocalTrack>, CaptureError>,
}

pub struct CaptureController {
    devices: Arc<dyn MediaDevices>,
    constraints: MediaConstraints,
    media: LocalMedia,
    generation: u64,
    audio_wanted: bool,
    video_wanted: bool,
}

impl CaptureController {
    pub fn new(devices: Arc<dyn MediaDevices>, constraints: MediaConstraints) -> Self {
        Self {
            devices,
            constraints,
            media: LocalMedia::default(),
            generation: 0,
            audio_wanted: true,
            video_wanted: true,
        }
    }

    pub fn media(&self) -> &LocalMedia {
        &self.media
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub async fn acquire(&mut self, constraints: MediaConstraints) -> Acquired {
        self.constraints = constraints;
        let result = self.devices.get_user_media(&self.constraints).await;
        self.install(result)
    }

    /// Flips the first audio track. Returns the resulting enabled state,
    /// `false` when there is no audio track.
    pub fn toggle_audio(&mut self) -> bool {
        let enabled = Self::toggle(&self.media, MediaKind::Audio);
        if let Some(enabled) = enabled {
            self.audio_wanted = enabled;
        }
        enabled.unwrap_or(false)
    }

    pub fn toggle_video(&mut self) -> bool {
        let enabled = Self::toggle(&self.media, MediaKind::Video);
        if let Some(enabled) = enabled {
            self.video_wanted = enabled;
        }
        enabled.unwrap_or(false)
    }

    fn toggle(media: &LocalMedia, kind: MediaKind) -> Option<bool> {
        let track = media.first(kind)?;
        let enabled = !track.is_enabled();
        track.set_enabled(enabled);
        debug!("{:?} track {} enabled={}", kind, track.id(), enabled);
        Some(enabled)
    }

    /// Stops the current tracks, bumps the generation and hands out the
    /// acquisition to run.
    pub fn begin_restart(&mut self, constraints: Option<MediaConstraints>) -> RestartTicket {
        if let Some(constraints) = constraints {
            self.constraints = constraints;
        }
        self.media.stop_all();
        self.generation += 1;
        self.media = LocalMedia::pending(self.generation);
        info!("Capture restart started (generation {})", self.generation);

        RestartTicket {
            generation: self.generation,
            devices: self.devices.clone(),
            constraints: self.constraints.clone(),
        }
    }

    /// Applies a resolved restart. Returns `None` and stops the late tracks
    /// when a newer restart began after this one.
    pub fn complete_restart(&mut self, outcome: RestartOutcome) -> Option<Acquired> {
        if outcome.generation != self.generation {
            debug!(
                "Discarding stale capture restart (generation {} < {})",
                outcome.generation, self.generation
            );
            if let Ok(tracks) = outcome.result {
                for track in tracks {
                    track.stop();
                }
            }
            return None;
        }
        Some(self.install(outcome.result))
    }

    pub async fn restart(&mut self, constraints: Option<MediaConstraints>) -> Acquired {
        let ticket = self.begin_restart(constraints);
        let outcome = ticket.run().await;
        self.install(outcome.result)
    }

    pub fn release(&mut self) {
        self.media.stop_all();
        self.media = LocalMedia::empty(self.generation);
    }

    fn install(&mut self, result: Result<Vec<LocalTrack>, CaptureError>) -> Acquired {
        match result {
            Ok(tracks) => {
                for track in &tracks {
                    match track.kind() {
                        MediaKind::Audio => track.set_enabled(self.audio_wanted),
                        MediaKind::Video => track.set_enabled(self.video_wanted),
                    }
                }
                info!(
                    "Local media ready: {} track(s), generation {}",
                    tracks.len(),
                    self.generation
                );
                self.media = LocalMedia::new(tracks, self.generation);
                Acquired {
                    media: self.media.clone(),
                    warning: None,
                }
            }
            Err(e) => {
                warn!("Capture unavailable, continuing without local media: {}", e);
                self.media = LocalMedia::empty(self.generation);
                Acquired {
                    media: self.media.clone(),
                    warning: Some(e),
                }
            }
        }
    }
}
