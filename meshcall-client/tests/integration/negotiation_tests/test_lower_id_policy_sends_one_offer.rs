use meshcall_client::InitiationPolicy;
use meshcall_core::ParticipantId;

use crate::integration::init_tracing;
use crate::utils::{MockRelay, TestPeerBuilder};

async fn run_pair(first: &str, second: &str) -> MockRelay {
    let relay = MockRelay::new();
    let lower = |c: meshcall_client::SessionConfig| c.initiation(InitiationPolicy::LowerIdOffers);

    let mut p1 = TestPeerBuilder::new(first)
        .config(lower)
        .join(&relay)
        .await
        .expect("join failed");
    let mut p2 = TestPeerBuilder::new(second)
        .config(lower)
        .join(&relay)
        .await
        .expect("join failed");

    p1.wait_connected(second, 2).await;
    p2.wait_connected(first, 2).await;

    p1.handle.leave().await.expect("leave failed");
    p2.handle.leave().await.expect("leave failed");
    relay
}

#[tokio::test]
async fn test_lower_id_offers_when_it_joined_first() {
    init_tracing();

    let relay = run_pair("a", "b").await;
    assert_eq!(relay.sent_by(&ParticipantId::from("a"), "offer"), 1);
    assert_eq!(relay.sent_by(&ParticipantId::from("b"), "offer"), 0);
}

#[tokio::test]
async fn test_lower_id_offers_when_it_joined_second() {
    init_tracing();

    // Lexical order on opaque ids: "10" sorts before "9"
    let relay = run_pair("9", "10").await;
    assert_eq!(relay.sent_by(&ParticipantId::from("10"), "offer"), 1);
    assert_eq!(relay.sent_by(&ParticipantId::from("9"), "offer"), 0);
}
