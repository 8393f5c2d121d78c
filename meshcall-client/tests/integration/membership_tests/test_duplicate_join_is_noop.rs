use meshcall_core::{ParticipantId, RelayFrame, RelayMessage, RoomId};

use crate::integration::init_tracing;
use crate::utils::{MockRelay, TEST_ROOM, TestPeer};

#[tokio::test]
async fn test_duplicate_join_is_noop() {
    init_tracing();

    let relay = MockRelay::new();
    let room = RoomId::from(TEST_ROOM);
    let mut a = TestPeer::join("a", &relay).await;
    let mut b = TestPeer::join("b", &relay).await;
    a.wait_connected("b", 2).await;
    b.wait_connected("a", 2).await;

    // Relay replays B's announcement, once with a new display name
    for name in [None, Some("Bea".to_owned())] {
        relay.deliver(
            &room,
            &a.id,
            RelayFrame::new(
                b.id.clone(),
                RelayMessage::UserJoined {
                    user_id: b.id.clone(),
                    user_name: name,
                },
            ),
        );
    }
    TestPeer::settle().await;

    assert_eq!(a.transports.created_for(&b.id), 1);
    assert_eq!(relay.sent_by(&a.id, "offer"), 1);

    let view = a.handle.snapshot().await.expect("A closed");
    assert_eq!(view.participants.len(), 2);
    let known = view
        .participants
        .iter()
        .find(|p| p.id == ParticipantId::from("b"))
        .expect("B missing");
    assert_eq!(known.display_name, "Bea");

    a.handle.leave().await.expect("leave failed");
    b.handle.leave().await.expect("leave failed");
}
