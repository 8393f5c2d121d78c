use meshcall_client::RelayLinkError;

use crate::integration::init_tracing;
use crate::utils::{MockRelay, TestPeerBuilder};

#[tokio::test]
async fn test_relay_refused_fails_join() {
    init_tracing();

    let relay = MockRelay::new();
    relay.refuse_connections();

    let builder = TestPeerBuilder::new("a");
    let result = builder.join(&relay).await;

    match result {
        Err(RelayLinkError::Connect(_)) => {}
        Err(other) => panic!("Unexpected error: {}", other),
        Ok(_) => panic!("Join should fail when the relay refuses"),
    }
}
