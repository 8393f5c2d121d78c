mod peer_transport;
mod transport_config;
mod transport_event;
mod webrtc_transport;

pub use peer_transport::{PeerTransport, ReplaceOutcome, TransportFactory};
pub use transport_config::TransportConfig;
pub use transport_event::{LinkEvent, LinkId, TransportState};
pub use webrtc_transport::{WebRtcTransport, WebRtcTransportFactory};
