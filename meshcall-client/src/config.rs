use meshcall_core::{ParticipantId, RoomId};
use std::time::Duration;

/// Decides which side of a pair sends the first offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitiationPolicy {
    /// The participant already in the room offers to the newcomer when its
    /// `user_joined` arrives. Newcomers learning peers from the roster wait.
    #[default]
    ExistingMemberOffers,
    /// Whoever has the lexically lower id offers, however the peer was learned.
    LowerIdOffers,
}

impl InitiationPolicy {
    pub(crate) fn should_initiate(
        self,
        self_id: &ParticipantId,
        remote_id: &ParticipantId,
        via_join: bool,
    ) -> bool {
        match self {
            InitiationPolicy::ExistingMemberOffers => via_join,
            InitiationPolicy::LowerIdOffers => self_id < remote_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoConstraints {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
}

impl Default for VideoConstraints {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            frame_rate: 30,
        }
    }
}

/// Capability hints handed to the capture backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: Option<VideoConstraints>,
    pub echo_cancellation: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            audio: true,
            video: Some(VideoConstraints::default()),
            echo_cancellation: true,
        }
    }
}

impl MediaConstraints {
    pub fn audio_only() -> Self {
        Self {
            video: None,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub room_id: RoomId,
    pub self_id: ParticipantId,
    pub display_name: String,
    pub is_host: bool,
    pub constraints: MediaConstraints,
    /// Wait after the relay opens before announcing `user_joined`.
    pub announce_delay: Duration,
    /// Wait after learning of a peer before sending it an offer.
    pub offer_delay: Duration,
    pub initiation: InitiationPolicy,
}

impl SessionConfig {
    pub fn new(
        room_id: impl Into<RoomId>,
        self_id: impl Into<ParticipantId>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            room_id: room_id.into(),
            self_id: self_id.into(),
            display_name: display_name.into(),
            is_host: false,
            constraints: MediaConstraints::default(),
            announce_delay: Duration::from_millis(200),
            offer_delay: Duration::from_millis(300),
            initiation: InitiationPolicy::default(),
        }
    }

    pub fn host(mut self, is_host: bool) -> Self {
        self.is_host = is_host;
        self
    }

    pub fn constraints(mut self, constraints: MediaConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn delays(mut self, announce: Duration, offer: Duration) -> Self {
        self.announce_delay = announce;
        self.offer_delay = offer;
        self
    }

    pub fn initiation(mut self, policy: InitiationPolicy) -> Self {
        self.initiation = policy;
        self
    }
}
