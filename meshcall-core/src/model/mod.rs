mod participant;
mod relay;
mod room;
mod signaling;

pub use participant::ParticipantId;
pub use relay::{RelayFrame, RelayMessage};
pub use room::RoomId;
pub use signaling::{IceCandidate, IceServerConfig, SdpKind, SessionDescription};
