mod relay_link;
mod signaling_output;
mod ws_connector;

pub use relay_link::{RelayChannel, RelayCommand, RelayConnector, RelayLink};
pub use signaling_output::SignalingOutput;
pub use ws_connector::WsRelayConnector;
