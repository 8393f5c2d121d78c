use meshcall_client::{NegotiationState, SessionEvent};

use crate::integration::init_tracing;
use crate::utils::{MockRelay, TestPeer, TestPeerBuilder};

#[tokio::test]
async fn test_restart_renegotiates_without_in_place_swap() {
    init_tracing();

    let relay = MockRelay::new();
    let mut a = TestPeerBuilder::new("a")
        .renegotiating()
        .join(&relay)
        .await
        .expect("join failed");
    let mut b = TestPeer::join("b", &relay).await;
    a.wait_connected("b", 2).await;
    b.wait_connected("a", 2).await;

    a.handle.restart_capture(None).await.expect("A closed");

    let b_id = b.id.clone();
    a.wait_for(|e| match e {
        SessionEvent::NegotiationChanged { id, state }
            if *id == b_id && *state == NegotiationState::Offering =>
        {
            Some(())
        }
        _ => None,
    })
    .await;
    a.wait_negotiated("b").await;

    assert_eq!(relay.sent_by(&a.id, "offer"), 2);
    assert_eq!(relay.sent_by(&b.id, "answer"), 2);
    assert_eq!(a.transports.created_for(&b.id), 1, "same link renegotiated");

    a.handle.leave().await.expect("leave failed");
    b.handle.leave().await.expect("leave failed");
}
