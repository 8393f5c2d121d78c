mod peer_link;
mod peer_link_table;
mod remote_stream;

pub use peer_link::{NegotiationState, PeerLink, PeerLinkSnapshot};
pub use peer_link_table::PeerLinkTable;
pub use remote_stream::{RemoteStream, RemoteTrack};
