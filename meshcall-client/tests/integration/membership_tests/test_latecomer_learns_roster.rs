use meshcall_client::SessionEvent;

use crate::integration::init_tracing;
use crate::utils::{MockRelay, TestPeer};

#[tokio::test]
async fn test_latecomer_learns_roster() {
    init_tracing();

    let relay = MockRelay::new();
    let mut a = TestPeer::join("a", &relay).await;
    let mut b = TestPeer::join("b", &relay).await;
    a.wait_connected("b", 2).await;
    b.wait_connected("a", 2).await;

    let mut c = TestPeer::join("c", &relay).await;

    // Roster entries carry no name; the fallback is derived from the id
    let first = c
        .wait_for(|e| match e {
            SessionEvent::ParticipantJoined(p) if !p.is_self => Some(p.clone()),
            _ => None,
        })
        .await;
    assert_eq!(first.display_name, format!("Participant {}", first.id));

    c.wait_connected("a", 2).await;
    assert_eq!(c.participant_ids().await, vec!["a", "b", "c"]);

    b.wait_connected("c", 2).await;
    a.wait_connected("c", 2).await;

    // Full mesh: both existing members offered, the newcomer only answered
    assert_eq!(relay.sent_by(&a.id, "offer"), 2);
    assert_eq!(relay.sent_by(&b.id, "offer"), 1);
    assert_eq!(relay.sent_by(&c.id, "offer"), 0);
    assert_eq!(relay.sent_by(&c.id, "answer"), 2);

    for peer in [&a, &b, &c] {
        peer.handle.leave().await.expect("leave failed");
    }
}
