pub mod mock_transport;

pub use event_helpers::*;
pub use mock_devices::*;
pub use mock_relay::*;
pub use mock_signaling::*;
pub use mock_transport::*;
