pub mod chat;
pub mod config;
pub mod error;
pub mod media;
pub mod membership;
pub mod peer;
pub mod relay;
pub mod session;
pub mod transport;

pub use chat::{ChatMessage, ChatRelay, MessageOrigin};
pub use config::{InitiationPolicy, MediaConstraints, SessionConfig, VideoConstraints};
pub use error::{CaptureError, NegotiationError, RelayLinkError, SessionClosed, TransmitError};
pub use media::{CaptureController, LocalMedia, LocalTrack, MediaDevices, MediaKind, SyntheticDevices};
pub use membership::{Membership, Participant};
pub use peer::{NegotiationState, PeerLinkTable, RemoteStream, RemoteTrack};
pub use relay::{RelayChannel, RelayCommand, RelayConnector, RelayLink, SignalingOutput, WsRelayConnector};
pub use session::{RelayStatus, RoomSession, SessionDeps, SessionEvent, SessionHandle, SessionSnapshot};
pub use transport::{LinkEvent, LinkId, PeerTransport, TransportConfig, TransportFactory, WebRtcTransportFactory};
